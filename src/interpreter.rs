use crate::builtin::{BuiltinCommand, ShowHistory};
use crate::command::{ArgVector, ExitCode, Launched};
use crate::dispatch::Dispatcher;
use crate::env::Environment;
use crate::error::{self, ShellError};
use crate::history;
use crate::input::LineSource;
use crate::lexer;
use crate::parser::{self, Redirected};
use crate::process::Children;
use crate::redirect::{RedirectGuard, SavedStdio};
use std::io;
use tracing::{debug, trace};

/// A shell session: reads lines and runs them until told to stop.
///
/// The interpreter owns the [`Environment`] (search path, history, exit flag), a
/// [`Dispatcher`] that maps names to commands, and the duplicates of stdin and
/// stdout taken when the session started.
///
/// Example
/// ```no_run
/// use gush::Interpreter;
/// let mut sh = Interpreter::with_builtins().unwrap();
/// sh.execute_line("pwd & ls /").unwrap();
/// ```
pub struct Interpreter {
    env: Environment,
    dispatcher: Dispatcher,
    stdio: SavedStdio,
}

impl Interpreter {
    /// Create a new session with a custom dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Result<Self, ShellError> {
        Ok(Self {
            env: Environment::new(),
            dispatcher,
            stdio: SavedStdio::capture()?,
        })
    }

    /// Create a session with every builtin and the external fallback.
    pub fn with_builtins() -> Result<Self, ShellError> {
        Self::new(Dispatcher::default())
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Runs lines from `source` until `exit`, end of input, or a fatal error.
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<(), ShellError> {
        while !self.env.should_exit {
            let Some(line) = source.next_line()? else {
                break;
            };
            self.execute_line(&line)?;
        }
        debug!(exit_requested = self.env.should_exit, "session finished");
        Ok(())
    }

    /// Runs one line and waits for everything it started.
    ///
    /// Recoverable failures are reported and swallowed; only errors that end the
    /// session come back as `Err`.
    pub fn execute_line(&mut self, line: &str) -> Result<(), ShellError> {
        let Some(argv) = self.substitute(lexer::split_into_tokens(line)) else {
            return Ok(());
        };
        if !argv.is_noop() && argv.name() != ShowHistory::name() {
            self.env.history.record(argv.clone());
        }

        let groups = parser::split_groups(&argv);
        let outcome = match groups.as_slice() {
            [single] => self.run_foreground(single).map(|code| {
                trace!(code, "foreground command finished");
            }),
            _ => self.run_parallel(&groups),
        };

        match outcome {
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                error::report(&err);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Swaps a `!N` line for the command it names. A miss is reported and the line
    /// does nothing.
    fn substitute(&self, argv: ArgVector) -> Option<ArgVector> {
        if !history::is_shortcut(argv.name()) {
            return Some(argv);
        }
        match self.env.history.resolve(argv.name()) {
            Ok(recalled) => Some(recalled),
            Err(err) => {
                error::report(&err);
                None
            }
        }
    }

    /// Applies a group's redirection, if any.
    ///
    /// Returns the words to run and the guard keeping the redirection alive. An
    /// input file that can't be opened is reported and the group runs exactly as
    /// typed; an output file that can't be created is returned as an error.
    fn bind_redirect<'a>(
        stdio: &'a SavedStdio,
        group: &ArgVector,
    ) -> Result<(ArgVector, Option<RedirectGuard<'a>>), ShellError> {
        let Some(Redirected { command, redirect }) = parser::extract_redirect(group) else {
            return Ok((group.clone(), None));
        };
        match stdio.redirect(&redirect) {
            Ok(guard) => Ok((command, Some(guard))),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                error::report(&err);
                Ok((group.clone(), None))
            }
        }
    }

    /// Runs `f` on a group's command with the group's redirection in place.
    ///
    /// The original stream is put back before returning; failing to do so is an
    /// error even when `f` succeeded.
    fn redirected<T>(
        &mut self,
        group: &ArgVector,
        f: impl FnOnce(&Dispatcher, &ArgVector, &mut Environment) -> Result<T, ShellError>,
    ) -> Result<T, ShellError> {
        let (argv, guard) = Self::bind_redirect(&self.stdio, group)?;
        let result = f(&self.dispatcher, &argv, &mut self.env);
        if let Some(guard) = guard {
            guard.finish()?;
        }
        result
    }

    fn run_foreground(&mut self, group: &ArgVector) -> Result<ExitCode, ShellError> {
        self.redirected(group, |dispatcher, argv, env| {
            dispatcher.run(argv, &mut io::stdout(), env)
        })
    }

    /// Runs the groups of a `&` line left to right, then waits for all of them.
    ///
    /// Builtin groups run in the shell process as they are reached; external groups
    /// are forked and keep running while later groups start.
    fn run_parallel(&mut self, groups: &[ArgVector]) -> Result<(), ShellError> {
        let mut children = Children::new();
        for group in groups {
            let launched = self.redirected(group, |dispatcher, argv, env| {
                dispatcher.start(argv, &mut io::stdout(), env)
            });
            match launched {
                Ok(Launched::Started(pid)) => children.push(pid),
                Ok(Launched::Finished(code)) => trace!(code, "builtin group finished"),
                Err(err) if err.is_fatal() => {
                    children.wait_all();
                    return Err(err);
                }
                Err(err) => error::report(&err),
            }
        }

        let codes = children.wait_all();
        debug!(?codes, "all command groups finished");
        Ok(())
    }
}
