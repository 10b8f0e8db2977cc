use crate::env::Environment;
use crate::error::{MishError, Result};
use argh::{EarlyExit, FromArgs};
use regex::Regex;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

/// `NAME=VALUE` at the start of a segment.
static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)=(.*)$").expect("valid regex"));

/// Commands that must run inside the controller rather than in a child.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    fn execute(self, env: &mut Environment) -> Result<()>;
}

fn run<T: BuiltinCommand>(args: &[&str], env: &mut Environment) -> Result<()> {
    // Everything but a lone `--help` is positional, so `cd -d` names a directory.
    let mut argv = Vec::with_capacity(args.len() + 1);
    if args != ["--help"] {
        argv.push("--");
    }
    argv.extend_from_slice(args);

    match T::from_args(&[T::name()], &argv) {
        Ok(cmd) => cmd.execute(env),
        Err(EarlyExit { output, status: Ok(()) }) => {
            println!("{}", output.trim_end());
            Ok(())
        }
        Err(EarlyExit { output, status: Err(()) }) => Err(MishError::BuiltinArgs(format!(
            "{}: {}",
            T::name(),
            output.trim_end()
        ))),
    }
}

/// Run `segment` as a builtin if it is one.
///
/// Returns `None` when the segment is an ordinary command and should go on to
/// the pipeline path. A `Some` result means the segment is handled, even when
/// it failed: nothing is spawned for it either way.
pub fn try_execute(segment: &str, env: &mut Environment) -> Option<Result<()>> {
    let segment = segment.trim();
    if let Some((name, value)) = parse_assignment(segment) {
        env.set_var(name, value);
        return Some(Ok(()));
    }

    let words: Vec<&str> = segment.split_whitespace().collect();
    let (name, args) = words.split_first()?;
    match *name {
        "cd" => Some(run::<Cd>(args, env)),
        "exit" => Some(run::<Exit>(args, env)),
        _ => None,
    }
}

/// Split `NAME=VALUE` on the first `=`. The value is the rest of the segment.
pub fn parse_assignment(segment: &str) -> Option<(&str, &str)> {
    let caps = ASSIGNMENT.captures(segment)?;
    let name = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str().trim();
    Some((name, value))
}

#[derive(FromArgs)]
/// Change the working directory of the shell and of every command started after it.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, env: &mut Environment) -> Result<()> {
        let target = PathBuf::from(&self.target);
        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir).map_err(|source| MishError::Chdir {
            path: new_dir.clone(),
            source,
        })?;
        env::set_current_dir(&canonical).map_err(|source| MishError::Chdir {
            path: canonical.clone(),
            source,
        })?;
        log::debug!("cd {}", canonical.display());
        env.current_dir = canonical;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, env: &mut Environment) -> Result<()> {
        env.should_exit = true;
        Ok(())
    }
}
