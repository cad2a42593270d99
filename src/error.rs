//! Error kinds raised while running a line, and the single message they share.

use crate::parser::RedirectKind;
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// The only text ever written to the error channel.
pub const ERROR_MESSAGE: &str = "An error has occurred\n";

#[derive(Debug, Error)]
pub enum ShellError {
    /// Wrong argument count or shape for a built-in.
    #[error("usage: {0}")]
    Usage(String),

    /// `!N` pointed at nothing retained.
    #[error("no history entry for {0}")]
    HistoryMiss(String),

    #[error("cannot read redirected input {}", display_target(.path))]
    RedirectInput {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create redirected output {}", display_target(.path))]
    RedirectOutput {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {name}")]
    Launch {
        name: String,
        #[source]
        source: nix::Error,
    },

    #[error("failed to wait for child {pid}")]
    Wait {
        pid: i32,
        #[source]
        source: nix::Error,
    },

    #[error("cannot open batch file {}", .path.display())]
    BatchOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input line")]
    Input(#[from] rustyline::error::ReadlineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Builds the redirection error matching the direction that failed.
    pub fn redirect(kind: RedirectKind, path: Option<PathBuf>, source: std::io::Error) -> Self {
        match kind {
            RedirectKind::Input => Self::RedirectInput { path, source },
            RedirectKind::Output => Self::RedirectOutput { path, source },
        }
    }

    /// Fatal errors end the session; everything else is reported and the loop
    /// moves on to the next line.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RedirectOutput { .. } | Self::BatchOpen { .. } | Self::Input(_) | Self::Io(_)
        )
    }
}

fn display_target(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "(missing)".to_string(),
    }
}

/// Writes the uniform error line to stderr.
///
/// The detailed cause only goes to the debug log.
pub fn report(err: &dyn Display) {
    debug!(error = %err, "reporting error");
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(ERROR_MESSAGE.as_bytes());
    let _ = stderr.flush();
}
