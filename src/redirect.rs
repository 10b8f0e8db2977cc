use crate::error::{MishError, Result};
use crate::parser::Stage;
use crate::pipes;
use nix::unistd;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// rw-r--r--
const OUTPUT_MODE: u32 = 0o644;

/// Apply a stage's `<` and `>` targets to the calling process.
///
/// Runs in the forked stage after pipe wiring, so a file target takes the
/// place of the pipe on that side. The opened file is closed once it has been
/// duplicated onto the standard stream(s).
pub fn apply(stage: &Stage) -> Result<()> {
    if let Some(target) = &stage.input {
        let file = open_input(Path::new(target))?;
        dup_file(&file, libc::STDIN_FILENO, target)?;
    }
    if let Some(target) = &stage.output {
        let file = open_output(Path::new(target))?;
        dup_file(&file, libc::STDOUT_FILENO, target)?;
        dup_file(&file, libc::STDERR_FILENO, target)?;
    }
    Ok(())
}

/// Open a `<` target read-only.
pub fn open_input(path: &Path) -> Result<File> {
    File::open(path)
        .and_then(lift)
        .map_err(|source| MishError::Redirect {
            path: path.to_path_buf(),
            source,
        })
}

/// Open a `>` target, creating or truncating it.
pub fn open_output(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_MODE)
        .open(path)
        .and_then(lift)
        .map_err(|source| MishError::Redirect {
            path: path.to_path_buf(),
            source,
        })
}

/// Keep the file off the standard stream numbers so `dup2` always copies.
fn lift(file: File) -> io::Result<File> {
    Ok(File::from(pipes::above_std_streams(OwnedFd::from(file))?))
}

fn dup_file(file: &File, target: libc::c_int, path: &str) -> Result<()> {
    unistd::dup2(file.as_raw_fd(), target)
        .map(drop)
        .map_err(|e| MishError::Redirect {
            path: path.into(),
            source: e.into(),
        })
}
