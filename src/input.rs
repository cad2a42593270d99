//! Where command lines come from: a terminal prompt or a batch file.

use crate::error::ShellError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Prompt shown before each interactive line.
pub const PROMPT: &str = "gush> ";

/// A stream of command lines.
pub trait LineSource {
    /// Reads the next line, or `None` once the input is exhausted.
    fn next_line(&mut self) -> Result<Option<String>, ShellError>;
}

/// Interactive input with line editing.
pub struct Prompted {
    editor: DefaultEditor,
}

impl Prompted {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Prompted {
    fn next_line(&mut self) -> Result<Option<String>, ShellError> {
        match self.editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            // Ctrl-C abandons the current line only.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => {
                debug!("end of interactive input");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Lines read without a prompt, one per call.
pub struct Batch<R> {
    reader: R,
}

impl<R: BufRead> Batch<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl Batch<BufReader<File>> {
    /// Opens a batch file; failing to do so ends the session.
    pub fn open(path: &Path) -> Result<Self, ShellError> {
        let file = File::open(path).map_err(|source| ShellError::BatchOpen {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "reading batch file");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineSource for Batch<R> {
    /// Bytes that are not UTF-8 become U+FFFD instead of failing the read.
    fn next_line(&mut self) -> Result<Option<String>, ShellError> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}
