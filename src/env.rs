use crate::history::History;
use std::path::{Path, PathBuf};

/// Directory searched for commands when a session starts.
pub const DEFAULT_SEARCH_DIR: &str = "/bin";

/// Ordered directories consulted when resolving a command name.
///
/// Updates replace the whole list; nothing is merged with what was there before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl Default for SearchPath {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from(DEFAULT_SEARCH_DIR)],
        }
    }
}

impl SearchPath {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Replaces every directory. An empty list leaves nothing to search.
    pub fn replace<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        *self = Self::new(dirs);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

/// Mutable, per-session state shared by the built-ins.
///
/// The environment contains:
/// - `search_path`: where external commands are looked up.
/// - `history`: the last commands run, for `history` and `!N`.
/// - `should_exit`: a flag that the read loop checks to know when to terminate.
///
/// Note: fields are public for simplicity, so built-ins can update them directly.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub search_path: SearchPath,
    pub history: History,
    pub should_exit: bool,
}

impl Environment {
    /// Fresh session state: default search path, empty history.
    pub fn new() -> Self {
        Self::default()
    }
}
