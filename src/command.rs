use crate::env::Environment;
use crate::error::Result;
use crate::parser::Pipeline;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Children killed by a signal report `128 + signal`, as POSIX shells do.
pub type ExitCode = i32;

/// Starts the processes for parsed segments and reaps them afterwards.
///
/// The interpreter calls [`Launcher::launch`] once per non-builtin segment of
/// a line without waiting in between, then [`Launcher::wait_all`] once as a
/// barrier before reading the next line.
pub trait Launcher {
    /// Start `pipeline` with a snapshot of `env`. Must not block on the
    /// started processes.
    fn launch(&mut self, pipeline: &Pipeline, env: &Environment) -> Result<()>;

    /// Block until everything launched since the last call has terminated.
    ///
    /// Returns one exit code per launched segment, in launch order.
    fn wait_all(&mut self) -> Vec<ExitCode>;
}
