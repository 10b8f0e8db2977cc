//! Process orchestration: fork, wire, exec, wait.
//!
//! Each non-builtin segment gets its own *segment runner*, forked from the
//! controller. A single-stage runner execs the program itself. A multi-stage
//! runner opens every pipe, forks one child per stage, drops its own pipe
//! descriptors and waits for its stages, so the controller never blocks on
//! one segment while its siblings are still being launched.

use crate::command::{ExitCode, Launcher};
use crate::env::Environment;
use crate::error::{MishError, Result};
use crate::external::resolve_program;
use crate::parser::{Pipeline, Stage};
use crate::pipes::PipeSet;
use crate::redirect;
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};
use std::convert::Infallible;
use std::ffi::CString;

/// A stage with everything `execve` needs computed before the fork.
struct PreparedStage<'a> {
    stage: &'a Stage,
    /// `None` when the program was not found; the stage's child reports it.
    program: Option<CString>,
    argv: Vec<CString>,
}

impl<'a> PreparedStage<'a> {
    fn new(stage: &'a Stage, env: &Environment) -> Result<Self> {
        let argv = stage
            .args
            .iter()
            .map(|a| CString::new(a.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MishError::exec(stage.program(), e))?;
        let program = resolve_program(env, stage.program()).ok();
        Ok(Self {
            stage,
            program,
            argv,
        })
    }

    /// Redirect and replace the process image. Only returns on failure.
    fn exec(&self, envp: &[CString]) -> Result<Infallible> {
        redirect::apply(self.stage)?;
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| MishError::exec(self.stage.program(), crate::error::COMMAND_NOT_FOUND))?;
        unistd::execve(program, &self.argv, envp).map_err(|e| MishError::exec(self.stage.program(), e.desc()))
    }
}

/// Launches segments by forking real processes.
#[derive(Debug, Default)]
pub struct ForkLauncher {
    runners: Vec<Pid>,
}

impl ForkLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment runners launched and not yet waited on.
    #[cfg(test)]
    pub(crate) fn outstanding(&self) -> usize {
        self.runners.len()
    }
}

impl Launcher for ForkLauncher {
    fn launch(&mut self, pipeline: &Pipeline, env: &Environment) -> Result<()> {
        let envp = env.envp()?;
        let stages = pipeline
            .stages
            .iter()
            .map(|s| PreparedStage::new(s, env))
            .collect::<Result<Vec<_>>>()?;

        // SAFETY: the controller is single-threaded, so no lock is held across
        // the fork. The child may still allocate (a pipeline runner opens its
        // pipes and formats error reports) but always leaves through `execve`
        // or `_exit`.
        match unsafe { unistd::fork() }.map_err(MishError::Fork)? {
            ForkResult::Parent { child } => {
                debug!("segment runner {} started for {} stage(s)", child, stages.len());
                self.runners.push(child);
                Ok(())
            }
            ForkResult::Child => {
                let status = if stages.len() == 1 {
                    exec_stage(&stages[0], &envp)
                } else {
                    supervise_pipeline(&stages, pipeline.pipe_count(), &envp)
                };
                exit_child(status)
            }
        }
    }

    fn wait_all(&mut self) -> Vec<ExitCode> {
        self.runners
            .drain(..)
            .map(|pid| {
                let code = wait_for(pid);
                debug!("segment runner {} finished with {}", pid, code);
                code
            })
            .collect()
    }
}

/// Body of a stage's child process; never returns.
fn exec_stage(stage: &PreparedStage<'_>, envp: &[CString]) -> ! {
    let err = match stage.exec(envp) {
        Ok(never) => match never {},
        Err(err) => err,
    };
    report_from_child(&err);
    exit_child(err.child_status())
}

/// Run every stage of a multi-stage pipeline and wait for all of them.
///
/// Returns the last stage's exit code.
fn supervise_pipeline(stages: &[PreparedStage<'_>], pipe_count: usize, envp: &[CString]) -> ExitCode {
    let mut pipes = match PipeSet::allocate(pipe_count) {
        Ok(pipes) => pipes,
        Err(err) => {
            report_from_child(&err);
            return err.child_status();
        }
    };

    let mut children = Vec::with_capacity(stages.len());
    for (index, stage) in stages.iter().enumerate() {
        // SAFETY: the runner is a single-threaded fork; the stage child only
        // wires descriptors before `execve` or `_exit`.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { child }) => children.push(child),
            Ok(ForkResult::Child) => {
                if let Err(err) = std::mem::take(&mut pipes).attach_stage(index) {
                    report_from_child(&err);
                    exit_child(err.child_status());
                }
                exec_stage(stage, envp);
            }
            Err(errno) => {
                report_from_child(&MishError::Fork(errno));
                break;
            }
        }
    }

    // Close our copies before waiting, otherwise the last reader never sees EOF.
    drop(pipes);

    let forked_all = children.len() == stages.len();
    let codes: Vec<ExitCode> = children.into_iter().map(wait_for).collect();
    match codes.last() {
        Some(&code) if forked_all => code,
        _ => 1,
    }
}

/// Reap one child, retrying when interrupted.
fn wait_for(pid: Pid) -> ExitCode {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return code,
            Ok(WaitStatus::Signaled(_, signal, _)) => return 128 + signal as i32,
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return 0,
            Err(errno) => {
                warn!("waitpid({}) failed: {}", pid, errno);
                return 1;
            }
        }
    }
}

/// Write straight to fd 2; the child must not touch the logger or std locks.
fn report_from_child(err: &MishError) {
    let msg = format!("mish: {}\n", err);
    let _ = unistd::write(std::io::stderr(), msg.as_bytes());
}

fn exit_child(code: ExitCode) -> ! {
    // SAFETY: `_exit` skips atexit handlers and stdio flushing, which belong to
    // the controller whose memory this child copied.
    unsafe { libc::_exit(code) }
}
