use crate::builtin;
use crate::command::{ExitCode, Launcher};
use crate::env::Environment;
use crate::error::MishError;
use crate::input::LineSource;
use crate::lexer;
use crate::orchestrator::ForkLauncher;
use crate::parser;
use log::debug;

/// The controller: reads lines, dispatches builtins and launches the rest.
///
/// The interpreter owns the [`Environment`] that builtins mutate and that
/// every launch receives a snapshot of, plus the [`Launcher`] that starts and
/// reaps processes.
///
/// Example
/// ```no_run
/// use mish::Interpreter;
/// let mut sh: Interpreter = Interpreter::default();
/// sh.execute_line("echo hello & echo world");
/// ```
pub struct Interpreter<L: Launcher = ForkLauncher> {
    env: Environment,
    launcher: L,
}

impl<L: Launcher> Interpreter<L> {
    pub fn new(env: Environment, launcher: L) -> Self {
        Self { env, launcher }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// True once `exit` has run; nothing else should be executed afterwards.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// `mish:~<cwd>> `
    pub fn prompt(&self) -> String {
        format!("mish:~{}> ", self.env.current_dir.display())
    }

    /// Execute one command line.
    ///
    /// Segments separated by `&` are handled left to right: builtins run on
    /// the spot, everything else is launched without waiting. Then every
    /// launched segment is waited for before returning. A segment that fails
    /// to parse or launch is reported and skipped; its siblings still run.
    /// `exit` returns immediately without launching or waiting for anything
    /// else.
    pub fn execute_line(&mut self, line: &str) -> Vec<ExitCode> {
        for segment in lexer::split_segments(line) {
            if let Some(res) = builtin::try_execute(segment, &mut self.env) {
                if let Err(err) = res {
                    report(&err);
                }
                if self.env.should_exit {
                    debug!("exit requested");
                    return Vec::new();
                }
                continue;
            }

            let launched = parser::parse_segment(segment)
                .and_then(|pipeline| self.launcher.launch(&pipeline, &self.env));
            if let Err(err) = launched {
                report(&err);
            }
        }
        self.launcher.wait_all()
    }

    /// Read and execute lines until the source runs dry or `exit` runs.
    pub fn run(&mut self, source: &mut dyn LineSource) -> anyhow::Result<()> {
        while !self.should_exit() {
            let prompt = self.prompt();
            match source.read_line(&prompt)? {
                Some(line) => {
                    let codes = self.execute_line(&line);
                    debug!("line finished: {:?}", codes);
                }
                None => break,
            }
        }
        Ok(())
    }
}

impl Default for Interpreter<ForkLauncher> {
    /// An interpreter over the current process environment that forks real processes.
    fn default() -> Self {
        Self::new(Environment::new(), ForkLauncher::new())
    }
}

fn report(err: &MishError) {
    eprintln!("mish: {}", err);
}
