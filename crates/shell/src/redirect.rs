// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Descriptor redirection with a save/restore stack.
//!
//! Before a descriptor is replaced its previous contents are duplicated to a
//! close-on-exec descriptor at or above [`SAVE_FD_BASE`] and pushed on the
//! save stack. [`RedirectionManager::restore`] pops back to an [`FdMark`],
//! which is how temporary redirections end and how checkpoints clean up on
//! unwind.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::unistd::{close, dup2};
use tracing::debug;

use tern_core::ast::RedirectOp;

use crate::error::ExecError;

/// Saved copies live at or above this descriptor.
pub const SAVE_FD_BASE: RawFd = 10;

/// Descriptors a subshell snapshot covers.
const SNAPSHOT_FDS: std::ops::RangeInclusive<RawFd> = 0..=9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Undone when the command finishes.
    Temporary,
    /// Kept for the rest of the shell's life (`exec >file`).
    Permanent,
}

/// A redirection whose target word has been expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRedirect {
    pub fd: RawFd,
    pub op: RedirectOp,
    /// File name, descriptor number, `-`, or here-document text.
    pub target: String,
}

impl ResolvedRedirect {
    pub fn new(fd: RawFd, op: RedirectOp, target: impl Into<String>) -> Self {
        Self {
            fd,
            op,
            target: target.into(),
        }
    }
}

#[derive(Debug)]
struct SavedFd {
    fd: RawFd,
    /// `None` when `fd` was closed before the redirection.
    saved: Option<RawFd>,
    /// Open handle of a `<>;` target, truncated at its offset on restore.
    rewrite: Option<File>,
}

/// Position on the save stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FdMark(usize);

#[derive(Debug, Default)]
pub struct RedirectionManager {
    saved: Vec<SavedFd>,
}

impl RedirectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) -> FdMark {
        FdMark(self.saved.len())
    }

    /// Apply `redirects` in order. On failure every descriptor touched so
    /// far is restored. The returned mark undoes a temporary application.
    pub fn apply(
        &mut self,
        redirects: &[ResolvedRedirect],
        discipline: Discipline,
        noclobber: bool,
    ) -> Result<FdMark, ExecError> {
        let mark = self.mark();
        flush_stdio();
        for redirect in redirects {
            if let Err(err) = self.apply_one(redirect, noclobber) {
                self.restore(mark);
                return Err(err);
            }
        }
        if discipline == Discipline::Permanent {
            self.forget(mark);
        }
        Ok(mark)
    }

    /// Make `fd` refer to `source` until the returned mark is restored.
    pub fn attach(&mut self, fd: RawFd, source: OwnedFd) -> Result<FdMark, ExecError> {
        let mark = self.mark();
        if source.as_raw_fd() == fd {
            // `fd` was closed and the new descriptor landed on it.
            fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))
                .map_err(|errno| bad_descriptor(fd, errno))?;
            self.saved.push(SavedFd {
                fd,
                saved: None,
                rewrite: None,
            });
            let _ = source.into_raw_fd();
            return Ok(mark);
        }
        self.save(fd)?;
        dup2(source.as_raw_fd(), fd).map_err(|errno| bad_descriptor(fd, errno))?;
        Ok(mark)
    }

    /// Undo everything above `mark`, newest first.
    pub fn restore(&mut self, mark: FdMark) {
        if self.saved.len() <= mark.0 {
            return;
        }
        flush_stdio();
        while self.saved.len() > mark.0 {
            let Some(entry) = self.saved.pop() else {
                break;
            };
            if let Some(mut file) = entry.rewrite {
                if let Err(err) = truncate_at_offset(&mut file) {
                    debug!(fd = entry.fd, error = %err, "cannot truncate rewrite target");
                }
            }
            match entry.saved {
                Some(copy) => {
                    let _ = dup2(copy, entry.fd);
                    let _ = close(copy);
                }
                None => {
                    let _ = close(entry.fd);
                }
            }
        }
    }

    /// Keep the current descriptors and discard saved copies above `mark`.
    pub fn forget(&mut self, mark: FdMark) {
        while self.saved.len() > mark.0 {
            if let Some(entry) = self.saved.pop() {
                if let Some(copy) = entry.saved {
                    let _ = close(copy);
                }
            }
        }
    }

    fn apply_one(&mut self, redirect: &ResolvedRedirect, noclobber: bool) -> Result<(), ExecError> {
        let fd = redirect.fd;
        let target = &redirect.target;
        debug!(fd, op = redirect.op.symbol(), target = %target, "redirect");
        match redirect.op {
            RedirectOp::DupRead | RedirectOp::DupWrite => {
                if target == "-" {
                    self.save(fd)?;
                    let _ = close(fd);
                    return Ok(());
                }
                let source: RawFd = target.parse().map_err(|_| ExecError::BadDescriptor {
                    target: target.clone(),
                })?;
                fcntl(source, FcntlArg::F_GETFD).map_err(|_| ExecError::BadDescriptor {
                    target: target.clone(),
                })?;
                self.save(fd)?;
                if source != fd {
                    dup2(source, fd).map_err(|errno| bad_descriptor(fd, errno))?;
                }
                Ok(())
            }
            op => {
                // Save first: when `fd` is closed the open may land on it.
                self.save(fd)?;
                let file = open_target(op, target, noclobber)?;
                let rewrite = match op {
                    RedirectOp::ReadWriteRewrite => Some(file.try_clone()?),
                    _ => None,
                };
                if let Some(entry) = self.saved.last_mut() {
                    entry.rewrite = rewrite;
                }
                let opened = file.into_raw_fd();
                if opened == fd {
                    fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))
                        .map_err(|errno| bad_descriptor(fd, errno))?;
                } else {
                    let result = dup2(opened, fd);
                    let _ = close(opened);
                    result.map_err(|errno| bad_descriptor(fd, errno))?;
                }
                Ok(())
            }
        }
    }

    fn save(&mut self, fd: RawFd) -> Result<(), ExecError> {
        let saved = save_copy(fd)?;
        self.saved.push(SavedFd {
            fd,
            saved,
            rewrite: None,
        });
        Ok(())
    }
}

impl Drop for RedirectionManager {
    fn drop(&mut self) {
        self.forget(FdMark(0));
    }
}

/// Copies of descriptors 0..=9, restored when a virtual subshell ends.
#[derive(Debug)]
pub struct FdSnapshot {
    copies: Vec<(RawFd, Option<RawFd>)>,
}

impl FdSnapshot {
    pub fn capture() -> Result<Self, ExecError> {
        flush_stdio();
        let mut snapshot = Self { copies: Vec::new() };
        for fd in SNAPSHOT_FDS {
            // On error the partial snapshot is dropped, closing its copies.
            let copy = save_copy(fd)?;
            snapshot.copies.push((fd, copy));
        }
        Ok(snapshot)
    }

    pub fn restore(mut self) {
        flush_stdio();
        for (fd, copy) in std::mem::take(&mut self.copies) {
            match copy {
                Some(copy) => {
                    let _ = dup2(copy, fd);
                    let _ = close(copy);
                }
                None => {
                    let _ = close(fd);
                }
            }
        }
    }
}

impl Drop for FdSnapshot {
    fn drop(&mut self) {
        for copy in std::mem::take(&mut self.copies)
            .into_iter()
            .filter_map(|(_, copy)| copy)
        {
            let _ = close(copy);
        }
    }
}

fn save_copy(fd: RawFd) -> Result<Option<RawFd>, ExecError> {
    match fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(SAVE_FD_BASE)) {
        Ok(copy) => Ok(Some(copy)),
        Err(Errno::EBADF) => Ok(None),
        Err(errno) => Err(bad_descriptor(fd, errno)),
    }
}

fn open_target(op: RedirectOp, target: &str, noclobber: bool) -> Result<File, ExecError> {
    if op == RedirectOp::HereDoc {
        return here_document(target).map_err(ExecError::Io);
    }
    let path = Path::new(target);
    let mut options = OpenOptions::new();
    match op {
        RedirectOp::Read => {
            options.read(true);
        }
        RedirectOp::Write | RedirectOp::Clobber => {
            if op == RedirectOp::Write && noclobber && path.metadata().is_ok_and(|m| m.is_file()) {
                return Err(ExecError::Clobber {
                    target: target.to_string(),
                });
            }
            options.write(true).create(true).truncate(true);
        }
        RedirectOp::Append => {
            options.append(true).create(true);
        }
        _ => {
            options.read(true).write(true).create(true);
        }
    }
    options.open(path).map_err(|source| ExecError::Redirect {
        target: target.to_string(),
        source,
    })
}

fn here_document(body: &str) -> io::Result<File> {
    let mut file = tempfile::tempfile()?;
    file.write_all(body.as_bytes())?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

fn truncate_at_offset(file: &mut File) -> io::Result<()> {
    let offset = file.stream_position()?;
    file.set_len(offset)
}

fn bad_descriptor(fd: RawFd, errno: Errno) -> ExecError {
    debug!(fd, %errno, "descriptor operation failed");
    ExecError::BadDescriptor {
        target: fd.to_string(),
    }
}

/// Push buffered standard output through before descriptors move.
pub fn flush_stdio() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

#[cfg(test)]
#[path = "redirect_tests.rs"]
mod tests;
