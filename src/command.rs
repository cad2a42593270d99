use crate::env::Environment;
use crate::error::ShellError;
use nix::unistd::Pid;
use std::fmt;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Commands killed by a signal report `128 + signal`, as POSIX shells do.
pub type ExitCode = i32;

/// One command and its arguments, as owned words.
///
/// The first word is the command name. A line with no words becomes the no-op
/// vector, which runs as a successful empty command instead of reaching the
/// resolver with nothing to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgVector {
    words: Vec<String>,
}

impl ArgVector {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    /// The vector that stands in for an empty line.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.words.is_empty()
    }

    /// The command name, or `""` for the no-op vector.
    pub fn name(&self) -> &str {
        self.words.first().map(String::as_str).unwrap_or("")
    }

    /// Arguments after the command name.
    pub fn args(&self) -> &[String] {
        self.words.get(1..).unwrap_or(&[])
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl From<Vec<String>> for ArgVector {
    fn from(words: Vec<String>) -> Self {
        Self::new(words)
    }
}

impl From<&[&str]> for ArgVector {
    fn from(words: &[&str]) -> Self {
        Self::new(words.iter().map(|w| w.to_string()).collect())
    }
}

impl fmt::Display for ArgVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words.join(" "))
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Runs the command to completion and returns its exit code.
    ///
    /// Built-ins run inside the shell process and write to `stdout`; external
    /// commands are forked and waited for.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, ShellError>;

    /// Starts the command without waiting for a child to finish.
    ///
    /// Builtins run to completion in the shell process, which is the default.
    /// External commands return the pid of their child; the caller owns it and
    /// must reap it.
    fn start(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Launched, ShellError> {
        self.execute(stdout, env).map(Launched::Finished)
    }
}

/// What [`ExecutableCommand::start`] left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launched {
    /// Ran in the shell process and already exited with this code.
    Finished(ExitCode),
    /// Still running in a child process.
    Started(Pid),
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g. using the
/// search path).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
