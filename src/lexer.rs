//! Splitting raw input lines into words.
//!
//! There is no quoting and no escaping: every run of delimiter characters ends a
//! word, including ones a user might think of as quoted.

use crate::command::ArgVector;
use tracing::trace;

/// Characters that separate words: space, tab, carriage return, newline and bell.
pub const DELIMITERS: &[char] = &[' ', '\t', '\r', '\n', '\x07'];

fn is_delimiter(c: char) -> bool {
    DELIMITERS.contains(&c)
}

/// Lazy iterator over the words of a line.
///
/// Each word is copied out of the line, so the line can be dropped as soon as the
/// tokens are collected. The iterator is `Clone`; cloning it before consuming it
/// gives a fresh pass over the same line.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let start = self.rest.trim_start_matches(is_delimiter);
        if start.is_empty() {
            self.rest = start;
            return None;
        }
        let end = start.find(is_delimiter).unwrap_or(start.len());
        let (word, rest) = start.split_at(end);
        self.rest = rest;
        Some(word.to_string())
    }
}

/// Returns a lazy tokenizer over `line`.
pub fn tokenize(line: &str) -> Tokens<'_> {
    Tokens { rest: line }
}

/// Tokenizes a whole line into an argument vector.
///
/// A line with no words yields [`ArgVector::noop`].
pub fn split_into_tokens(line: &str) -> ArgVector {
    let words: Vec<String> = tokenize(line).collect();
    trace!(?words, "tokenized line");
    if words.is_empty() {
        ArgVector::noop()
    } else {
        ArgVector::new(words)
    }
}
