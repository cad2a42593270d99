//! Rebinding standard input and output for a single command.
//!
//! The descriptors are swapped in the shell process itself with `dup2`, so a
//! built-in writing to stdout and an external command forked while the swap is in
//! place both see the file. The originals are duplicated once when the session
//! starts and every restore goes back to those copies, never to whatever an
//! earlier command left behind.

use crate::error::ShellError;
use crate::parser::{RedirectKind, RedirectSpec};
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::dup2;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use tracing::{debug, warn};

/// Permission bits of files created by `>`: owner read/write only.
pub const OUTPUT_MODE: u32 = 0o600;

fn target_fd(kind: RedirectKind) -> RawFd {
    match kind {
        RedirectKind::Input => STDIN_FILENO,
        RedirectKind::Output => STDOUT_FILENO,
    }
}

/// Opens the file a redirection points at.
///
/// Input targets must already exist and be readable. Output targets are created
/// if needed and truncated. A missing target fails like an unopenable one.
pub fn open_target(spec: &RedirectSpec) -> Result<File, ShellError> {
    let fail = |source| ShellError::redirect(spec.kind, spec.target.clone(), source);
    let path = spec
        .target
        .as_deref()
        .ok_or_else(|| fail(io::Error::new(io::ErrorKind::InvalidInput, "no target")))?;

    let opened = match spec.kind {
        RedirectKind::Input => File::open(path),
        RedirectKind::Output => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(OUTPUT_MODE)
            .open(path),
    };
    opened.map_err(fail)
}

/// The session's original stdin and stdout.
pub struct SavedStdio {
    stdin: OwnedFd,
    stdout: OwnedFd,
}

impl SavedStdio {
    /// Duplicates fd 0 and fd 1. The copies are close-on-exec, so children never
    /// inherit them.
    pub fn capture() -> Result<Self, ShellError> {
        Ok(Self {
            stdin: io::stdin().as_fd().try_clone_to_owned()?,
            stdout: io::stdout().as_fd().try_clone_to_owned()?,
        })
    }

    fn original(&self, kind: RedirectKind) -> &OwnedFd {
        match kind {
            RedirectKind::Input => &self.stdin,
            RedirectKind::Output => &self.stdout,
        }
    }

    /// Opens the target and binds it over stdin or stdout.
    ///
    /// The binding lasts until the returned guard is dropped.
    pub fn redirect(&self, spec: &RedirectSpec) -> Result<RedirectGuard<'_>, ShellError> {
        let file = open_target(spec)?;
        // Anything still buffered belongs to the old stdout.
        io::stdout().flush()?;
        dup2(file.as_raw_fd(), target_fd(spec.kind)).map_err(io::Error::from)?;
        debug!(kind = ?spec.kind, target = ?spec.target, "bound redirection");
        Ok(RedirectGuard {
            saved: self,
            kind: spec.kind,
            active: true,
        })
    }

    /// Puts the original descriptor back over stdin or stdout.
    pub fn restore(&self, kind: RedirectKind) -> Result<(), ShellError> {
        if kind == RedirectKind::Output {
            io::stdout().flush()?;
        }
        dup2(self.original(kind).as_raw_fd(), target_fd(kind)).map_err(io::Error::from)?;
        debug!(?kind, "restored standard stream");
        Ok(())
    }
}

/// Active redirection.
///
/// Call [`RedirectGuard::finish`] once the command is done so a failed restore
/// reaches the caller. A guard dropped without it (on an early return) still
/// restores the stream and can only log the failure.
pub struct RedirectGuard<'a> {
    saved: &'a SavedStdio,
    kind: RedirectKind,
    active: bool,
}

impl RedirectGuard<'_> {
    /// Puts the original stream back.
    pub fn finish(mut self) -> Result<(), ShellError> {
        self.active = false;
        self.saved.restore(self.kind)
    }
}

impl Drop for RedirectGuard<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.saved.restore(self.kind) {
            warn!(error = %err, kind = ?self.kind, "failed to restore standard stream");
        }
    }
}
