//! gush entry point.
//!
//! Usage:
//!   gush              # interactive, with a `gush> ` prompt
//!   gush script.gush  # run every line of a batch file, no prompt

use argh::{EarlyExit, FromArgs};
use gush::error::report;
use gush::input::{Batch, Prompted};
use gush::{Interpreter, LineSource, ShellError};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// A small Unix shell with parallel commands, redirection and history.
struct Options {
    #[argh(positional)]
    /// file of commands to run instead of reading from the terminal.
    batch: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.first().map(String::as_str).unwrap_or("gush");
    let rest: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();

    let options = match Options::from_args(&[command], &rest) {
        Ok(options) => options,
        Err(EarlyExit { output, status }) => {
            if status.is_err() {
                report(&ShellError::Usage(output.trim_end().to_string()));
                return ExitCode::FAILURE;
            }
            print!("{}", output);
            return ExitCode::SUCCESS;
        }
    };

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(options: Options) -> Result<(), ShellError> {
    let mut source: Box<dyn LineSource> = match options.batch {
        Some(path) => Box::new(Batch::open(&path)?),
        None => Box::new(Prompted::new()?),
    };
    Interpreter::with_builtins()?.run(source.as_mut())
}
