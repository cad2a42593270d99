use crate::builtin::{Cd, Exit, Kill, Path, Pwd, ShowHistory};
use crate::command::{ArgVector, CommandFactory, ExecutableCommand, ExitCode, Launched};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use std::io::Write;
use std::marker::PhantomData;
use tracing::debug;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and [`ExternalCommand`].
pub(crate) struct Factory<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

/// Picks what runs for a command name.
///
/// Factories are asked in order and the first one that recognizes the name wins.
/// The default set puts every builtin ahead of the external fallback, so a builtin
/// name is never looked up in the search path.
pub struct Dispatcher {
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Kill>::default()),
            Box::new(Factory::<ShowHistory>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Path>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

impl Dispatcher {
    /// Create a dispatcher with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { commands }
    }

    /// Builds the command for `argv`, or `None` if no factory accepts the name.
    ///
    /// The no-op vector never reaches a factory.
    pub fn find(&self, env: &Environment, argv: &ArgVector) -> Option<Box<dyn ExecutableCommand>> {
        if argv.is_noop() {
            return None;
        }
        let args: Vec<&str> = argv.args().iter().map(String::as_str).collect();
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(env, argv.name(), &args))
    }

    fn create(
        &self,
        env: &Environment,
        argv: &ArgVector,
    ) -> Result<Box<dyn ExecutableCommand>, ShellError> {
        self.find(env, argv).ok_or_else(|| ShellError::Launch {
            name: argv.name().to_string(),
            source: nix::Error::ENOENT,
        })
    }

    /// Runs `argv` to completion in the foreground.
    ///
    /// Builtins execute in the shell process; external commands are forked and
    /// waited for. The no-op vector succeeds without doing anything.
    pub fn run(
        &self,
        argv: &ArgVector,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, ShellError> {
        if argv.is_noop() {
            return Ok(0);
        }
        debug!(command = %argv, "running in foreground");
        self.create(env, argv)?.execute(stdout, env)
    }

    /// Starts `argv` as one group of a `&` line.
    ///
    /// Builtins still run to completion in the shell process, so their changes to
    /// the session stick; external commands are forked and left running. The no-op
    /// vector finishes at once with 0.
    pub fn start(
        &self,
        argv: &ArgVector,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Launched, ShellError> {
        if argv.is_noop() {
            return Ok(Launched::Finished(0));
        }
        debug!(command = %argv, "starting command group");
        self.create(env, argv)?.start(stdout, env)
    }
}
