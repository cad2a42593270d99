use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Launched};
use crate::dispatch::Factory;
use crate::env::{Environment, SearchPath};
use crate::error::ShellError;
use crate::process::{self, LAUNCH_FAILURE_STATUS};
use nix::errno::Errno;
use nix::unistd::{AccessFlags, Pid, access, execv};
use std::borrow::Cow;
use std::ffi::CString;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command that is not a builtin.
///
/// `program` is the path handed to `execv`; `argv` keeps the name as typed in
/// position 0.
pub struct ExternalCommand {
    program: PathBuf,
    argv: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: PathBuf, argv: Vec<String>) -> Self {
        Self { program, argv }
    }

    fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    fn c_strings(&self) -> Result<(CString, Vec<CString>), ShellError> {
        let launch_error = |_| ShellError::Launch {
            name: self.name().to_string(),
            source: Errno::EINVAL,
        };
        let program = CString::new(self.program.as_os_str().as_bytes()).map_err(launch_error)?;
        let argv = self
            .argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(launch_error)?;
        Ok((program, argv))
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let program = find_command_path(&env.search_path, name).into_owned();
        let argv = std::iter::once(name)
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect();
        Some(Box::new(ExternalCommand::new(program, argv)))
    }
}

impl ExternalCommand {
    fn spawn(&self) -> Result<Pid, ShellError> {
        // Allocate before forking; the child only calls execv.
        let (program, argv) = self.c_strings()?;
        process::fork_child(self.name(), || {
            let _ = execv(&program, &argv);
            process::report_in_child();
            LAUNCH_FAILURE_STATUS
        })
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode, ShellError> {
        process::wait_for(self.spawn()?)
    }

    fn start(
        self: Box<Self>,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Launched, ShellError> {
        self.spawn().map(Launched::Started)
    }
}

/// Resolve a command path the way the shell's `path` list dictates.
///
/// Behavior:
/// - A name that is itself an executable file (absolute, or relative to the
///   current directory) is returned unchanged.
/// - Otherwise each directory of `search_path` is tried in order and the first
///   `<dir>/<name>` that is an executable file wins.
/// - When nothing matches, the name is returned unchanged so that the launch
///   fails and is reported.
///
/// No results are cached; a `path` update takes effect on the next lookup.
pub fn find_command_path<'a>(search_path: &SearchPath, name: &'a str) -> Cow<'a, Path> {
    let path = Path::new(name);
    if name.is_empty() || is_executable(path) {
        return Cow::Borrowed(path);
    }

    match search_path.iter().map(|dir| dir.join(name)).find(|p| is_executable(p)) {
        Some(found) => {
            debug!(name, path = %found.display(), "resolved command");
            Cow::Owned(found)
        }
        None => {
            debug!(name, "command not found in search path");
            Cow::Borrowed(path)
        }
    }
}

fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}
