use crate::command::ArgVector;
use crate::error::ShellError;
use tracing::debug;

/// Number of commands kept for recall.
pub const HISTORY_CAPACITY: usize = 20;

/// Prefix that marks a history shortcut such as `!3`.
pub const SHORTCUT_PREFIX: char = '!';

/// How many characters after `!` are read as the entry number.
const SHORTCUT_DIGITS: usize = 2;

/// Fixed-size ring of recently run commands.
///
/// Commands are numbered from 1 in the order they were recorded. The command with
/// number `n` lives in slot `(n - 1) % HISTORY_CAPACITY` until a later command
/// overwrites it.
#[derive(Debug, Clone)]
pub struct History {
    slots: Vec<Option<ArgVector>>,
    recorded: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            slots: vec![None; HISTORY_CAPACITY],
            recorded: 0,
        }
    }

    /// Appends a command, evicting the oldest one once the ring is full.
    pub fn record(&mut self, argv: ArgVector) {
        let slot = self.recorded % HISTORY_CAPACITY;
        self.recorded += 1;
        debug!(number = self.recorded, command = %argv, "recorded history entry");
        self.slots[slot] = Some(argv);
    }

    /// Total number of commands recorded so far, evicted ones included.
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Number of commands currently retained.
    pub fn len(&self) -> usize {
        self.recorded.min(HISTORY_CAPACITY)
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    fn oldest_retained(&self) -> usize {
        self.recorded.saturating_sub(HISTORY_CAPACITY) + 1
    }

    /// Looks up the command recorded `number`th, if it is still retained.
    pub fn get(&self, number: usize) -> Option<&ArgVector> {
        if number == 0 || number > self.recorded || number < self.oldest_retained() {
            return None;
        }
        self.slots[(number - 1) % HISTORY_CAPACITY].as_ref()
    }

    /// Resolves a `!N` shortcut into the command it names.
    ///
    /// `N` is read from the digits among the two characters after `!`, so `!7`,
    /// `!07` and `!7x` all name entry 7 and `!123` names entry 12.
    pub fn resolve(&self, shortcut: &str) -> Result<ArgVector, ShellError> {
        let miss = || ShellError::HistoryMiss(shortcut.to_string());
        let number = parse_shortcut(shortcut).ok_or_else(miss)?;
        let argv = self.get(number).cloned().ok_or_else(miss)?;
        debug!(shortcut, command = %argv, "resolved history shortcut");
        Ok(argv)
    }

    /// Retained commands, oldest first, each with its number.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &ArgVector)> + '_ {
        (self.oldest_retained()..=self.recorded).filter_map(|n| self.get(n).map(|argv| (n, argv)))
    }
}

/// True when a word should be treated as a history shortcut.
pub fn is_shortcut(word: &str) -> bool {
    word.starts_with(SHORTCUT_PREFIX)
}

fn parse_shortcut(shortcut: &str) -> Option<usize> {
    let digits: String = shortcut
        .strip_prefix(SHORTCUT_PREFIX)?
        .chars()
        .take(SHORTCUT_DIGITS)
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
