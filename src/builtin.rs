use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::dispatch::Factory;
use crate::env::Environment;
use crate::error::{self, ShellError};
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process, even when they share a line with
/// `&`. Options are not recognized; wrong argument counts surface as argh parse
/// errors and are reported as usage errors.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "path" or "cd".
    fn name() -> &'static str;

    /// Executes the command using the provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Marks the end of options, so every word the user typed reaches argh as a
/// positional argument, even one that starts with `-`.
const END_OF_OPTIONS: &str = "--";

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, ShellError> {
        match <T as BuiltinCommand>::execute(*self, stdout, env) {
            Ok(code) => Ok(code),
            Err(e) => {
                error::report(&format_args!("{}: {:#}", T::name(), e));
                Ok(1)
            }
        }
    }
}

/// Stands in for a builtin whose arguments did not parse.
struct InvalidArgs {
    name: &'static str,
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode, ShellError> {
        error::report(&ShellError::Usage(format!(
            "{}: {}",
            self.name,
            self.output.trim_end()
        )));
        Ok(1)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        let words: Vec<&str> = std::iter::once(END_OF_OPTIONS)
            .chain(args.iter().copied())
            .collect();
        Some(match T::from_args(&[name], &words) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, .. }) => Box::new(InvalidArgs {
                name: T::name(),
                output,
            }),
        })
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        env::set_current_dir(&self.target)
            .with_context(|| format!("can't chdir to {}", self.target))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Ask a process to terminate.
pub struct Kill {
    #[argh(positional)]
    /// id of the process to send SIGTERM to.
    pub pid: i32,
}

impl BuiltinCommand for Kill {
    fn name() -> &'static str {
        "kill"
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        if self.pid <= 0 {
            return Err(anyhow!("refusing to signal process group {}", self.pid));
        }
        kill(Pid::from_raw(self.pid), Signal::SIGTERM)
            .with_context(|| format!("can't signal process {}", self.pid))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the commands still held in history, oldest first, numbered from 1.
pub struct ShowHistory {}

impl BuiltinCommand for ShowHistory {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        for (index, (_, argv)) in env.history.entries().enumerate() {
            writeln!(stdout, "{}: {}", index + 1, argv)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let cwd = env::current_dir().context("can't read current directory")?;
        writeln!(stdout, "{}", cwd.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Replace the list of directories searched for commands.
pub struct Path {
    #[argh(positional, greedy)]
    /// directories to search, in order. None leaves only built-ins and explicit paths.
    pub dirs: Vec<PathBuf>,
}

impl BuiltinCommand for Path {
    fn name() -> &'static str {
        "path"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.search_path.replace(self.dirs);
        Ok(0)
    }
}
