//! Anonymous pipes connecting the stages of a pipeline.
//!
//! Every descriptor is an [`OwnedFd`], so closing is tied to ownership: the
//! supervising process drops its [`PipeSet`] once all stages are forked, and
//! each stage drops its copy right after duplicating the ends it needs onto
//! its standard streams. No write end survives in a process that does not
//! write, which is what lets downstream readers see end-of-stream.

use crate::error::{MishError, Result};
use nix::fcntl::{self, FcntlArg, OFlag};
use nix::unistd;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
#[cfg(test)]
use std::os::fd::{AsFd, BorrowedFd};

const STDIN: RawFd = libc::STDIN_FILENO;
const STDOUT: RawFd = libc::STDOUT_FILENO;
const STDERR: RawFd = libc::STDERR_FILENO;

/// The read and write ends of one pipe.
#[derive(Debug)]
pub struct PipeEndpoint {
    read: OwnedFd,
    write: OwnedFd,
}

impl PipeEndpoint {
    /// Open a pipe whose ends are not inherited across `exec`; only the
    /// copies duplicated onto standard streams survive into a program.
    ///
    /// Both ends are numbered above stderr even when the controller started
    /// with a standard stream closed.
    pub fn open() -> Result<Self> {
        let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(MishError::Pipe)?;
        Ok(Self {
            read: above_std_streams(read).map_err(MishError::Pipe)?,
            write: above_std_streams(write).map_err(MishError::Pipe)?,
        })
    }
}

#[cfg(test)]
impl PipeEndpoint {
    pub fn reader(&self) -> BorrowedFd<'_> {
        self.read.as_fd()
    }

    pub fn writer(&self) -> BorrowedFd<'_> {
        self.write.as_fd()
    }
}

/// All pipes of one pipeline; pipe `i` connects stage `i` to stage `i + 1`.
#[derive(Debug, Default)]
pub struct PipeSet {
    endpoints: Vec<PipeEndpoint>,
}

impl PipeSet {
    /// Open `count` pipes up front, before any stage is forked.
    ///
    /// If one of them fails, the ones already opened are closed on return.
    pub fn allocate(count: usize) -> Result<Self> {
        let endpoints = (0..count).map(|_| PipeEndpoint::open()).collect::<Result<Vec<_>>>()?;
        Ok(Self { endpoints })
    }

    /// Point the calling process's standard streams at the pipes around stage
    /// `index`, consuming the set so every original descriptor is closed.
    ///
    /// Stage `i > 0` reads from pipe `i - 1`; stage `i < last` writes both
    /// stdout and stderr into pipe `i`. Meant to run in the forked stage.
    pub fn attach_stage(self, index: usize) -> Result<()> {
        if index > 0 {
            if let Some(upstream) = self.endpoints.get(index - 1) {
                dup_onto(upstream.read.as_raw_fd(), STDIN)?;
            }
        }
        if let Some(downstream) = self.endpoints.get(index) {
            dup_onto(downstream.write.as_raw_fd(), STDOUT)?;
            dup_onto(downstream.write.as_raw_fd(), STDERR)?;
        }
        drop(self);
        Ok(())
    }
}

#[cfg(test)]
impl PipeSet {
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoint(&self, index: usize) -> Option<&PipeEndpoint> {
        self.endpoints.get(index)
    }
}

/// Renumber `fd` above the standard streams if it landed on one of them.
///
/// A descriptor already sitting on 0, 1 or 2 would make the later `dup2`
/// onto that stream a no-op, leaving it close-on-exec and closed again when
/// its owner drops.
pub(crate) fn above_std_streams(fd: OwnedFd) -> nix::Result<OwnedFd> {
    if fd.as_raw_fd() > STDERR {
        return Ok(fd);
    }
    let raw = fcntl::fcntl(fd.as_raw_fd(), FcntlArg::F_DUPFD_CLOEXEC(STDERR + 1))?;
    // SAFETY: `fcntl` just returned this descriptor and nothing else owns it.
    Ok(unsafe { OwnedFd::from_raw_fd(raw) })
}

fn dup_onto(fd: RawFd, target: RawFd) -> Result<()> {
    unistd::dup2(fd, target).map(drop).map_err(MishError::Pipe)
}
