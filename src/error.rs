use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between reading a line and reaping its children.
///
/// Only [`MishError::Io`] is fatal to a line source; every other variant is
/// local to the segment or stage that produced it.
#[derive(Debug, Error)]
pub enum MishError {
    /// Illegal operator placement or redirect count in a segment.
    #[error("parse error: {0}")]
    Parse(String),

    /// A redirect target could not be opened.
    #[error("cannot open {}: {source}", .path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `fork(2)` failed, usually from process table or memory exhaustion.
    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),

    /// `pipe(2)` or `dup2(2)` failed while wiring a pipeline.
    #[error("pipe setup failed: {0}")]
    Pipe(#[source] nix::Error),

    /// The program could not be found or replaced the process image.
    #[error("{program}: {reason}")]
    Exec { program: String, reason: String },

    /// A builtin was called with the wrong arguments.
    #[error("{0}")]
    BuiltinArgs(String),

    /// `cd` could not enter the requested directory.
    #[error("cd: {}: {source}", .path.display())]
    Chdir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MishError>;

impl MishError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        MishError::Parse(msg.into())
    }

    pub(crate) fn exec(program: impl Into<String>, reason: impl ToString) -> Self {
        MishError::Exec {
            program: program.into(),
            reason: reason.to_string(),
        }
    }

    /// Process exit status a child uses after reporting this error.
    pub fn child_status(&self) -> i32 {
        match self {
            MishError::Exec { reason, .. } if reason == COMMAND_NOT_FOUND => 127,
            MishError::Exec { .. } => 126,
            _ => 1,
        }
    }
}

pub(crate) const COMMAND_NOT_FOUND: &str = "command not found";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_statuses() {
        assert_eq!(MishError::exec("nope", COMMAND_NOT_FOUND).child_status(), 127);
        assert_eq!(MishError::exec("/etc/passwd", "Permission denied").child_status(), 126);
        assert_eq!(MishError::parse("x").child_status(), 1);
    }

    #[test]
    fn test_display_prefixes() {
        let err = MishError::parse("trailing pipe");
        assert_eq!(err.to_string(), "parse error: trailing pipe");

        let err = MishError::Redirect {
            path: PathBuf::from("/no/such/file"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("cannot open /no/such/file"));
    }
}
