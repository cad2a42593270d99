//! Child process creation and reaping.
//!
//! Concurrency in the shell comes only from processes: every external command and
//! every group of a `&` line runs in a forked child, and the session blocks in
//! `waitpid` until the children it started have finished.

use crate::command::ExitCode;
use crate::error::{ERROR_MESSAGE, ShellError};
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};
use std::io::Write;
use tracing::{debug, trace, warn};

/// Exit status of a child that could not run its command.
pub const LAUNCH_FAILURE_STATUS: ExitCode = 1;

/// Forks and runs `child` in the new process, which exits with its return value.
///
/// Rust's stdout buffer is flushed first so the child does not inherit pending
/// output and print it twice. The child exits without flushing anything, so a
/// closure that writes through `std::io::stdout()` must flush it itself.
pub fn fork_child<F>(name: &str, child: F) -> Result<Pid, ShellError>
where
    F: FnOnce() -> ExitCode,
{
    let _ = std::io::stdout().flush();
    // SAFETY: the session is single-threaded; the child only runs `child` and exits.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child: pid }) => {
            debug!(%pid, name, "forked child");
            Ok(pid)
        }
        Ok(ForkResult::Child) => exit_child(child()),
        Err(source) => Err(ShellError::Launch {
            name: name.to_string(),
            source,
        }),
    }
}

/// Terminates a forked child without running the parent's exit handlers.
pub fn exit_child(code: ExitCode) -> ! {
    // SAFETY: `_exit` has no preconditions and never returns.
    unsafe { nix::libc::_exit(code) }
}

/// Reports a failed launch from inside a child, where stderr's lock may be held
/// by a thread that no longer exists.
pub fn report_in_child() {
    let message = ERROR_MESSAGE.as_bytes();
    // SAFETY: the buffer is valid for `message.len()` bytes.
    unsafe {
        nix::libc::write(
            nix::libc::STDERR_FILENO,
            message.as_ptr().cast(),
            message.len(),
        );
    }
}

/// Blocks until `pid` exits or is killed by a signal.
pub fn wait_for(pid: Pid) -> Result<ExitCode, ShellError> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!(%pid, code, "child exited");
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!(%pid, ?signal, "child killed by signal");
                return Ok(128 + signal as i32);
            }
            Ok(status) => trace!(%pid, ?status, "child changed state"),
            Err(Errno::EINTR) => continue,
            Err(source) => {
                return Err(ShellError::Wait {
                    pid: pid.as_raw(),
                    source,
                });
            }
        }
    }
}

/// Children started from one line.
///
/// Every pid pushed here is reaped by [`Children::wait_all`]; none is left as a
/// zombie, whatever order the children finish in.
#[derive(Debug, Default)]
pub struct Children {
    pids: Vec<Pid>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pid: Pid) {
        self.pids.push(pid);
    }

    /// Waits for every tracked child and returns their exit codes in launch order.
    ///
    /// A child that cannot be waited for counts as failed; the others are still
    /// reaped.
    pub fn wait_all(self) -> Vec<ExitCode> {
        self.pids
            .into_iter()
            .map(|pid| {
                wait_for(pid).unwrap_or_else(|err| {
                    warn!(%pid, error = %err, "lost track of child");
                    LAUNCH_FAILURE_STATUS
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::execv;
    use std::ffi::CString;

    fn spawn_exec(path: &str, args: &[&str]) -> Pid {
        let path = CString::new(path).unwrap();
        let argv: Vec<CString> = args.iter().map(|a| CString::new(*a).unwrap()).collect();
        fork_child("test", || {
            let _ = execv(&path, &argv);
            LAUNCH_FAILURE_STATUS
        })
        .expect("fork failed")
    }

    #[test]
    #[cfg(unix)]
    fn test_wait_for_reports_exit_code() {
        let pid = spawn_exec("/bin/sh", &["sh", "-c", "exit 3"]);
        assert_eq!(wait_for(pid).unwrap(), 3);
    }

    #[test]
    #[cfg(unix)]
    fn test_wait_for_reports_signal() {
        let pid = spawn_exec("/bin/sh", &["sh", "-c", "kill -9 $$"]);
        assert_eq!(wait_for(pid).unwrap(), 128 + 9);
    }

    #[test]
    #[cfg(unix)]
    fn test_wait_all_reaps_every_child() {
        let mut children = Children::new();
        children.push(spawn_exec("/bin/sh", &["sh", "-c", "sleep 0.2; exit 2"]));
        children.push(spawn_exec("/bin/sh", &["sh", "-c", "exit 0"]));

        let codes = children.wait_all();
        assert_eq!(codes, vec![2, 0]);
    }

    #[test]
    #[cfg(unix)]
    fn test_failed_exec_exits_with_failure() {
        let pid = spawn_exec("/definitely/not/here", &["nothing"]);
        assert_eq!(wait_for(pid).unwrap(), LAUNCH_FAILURE_STATUS);
    }
}
