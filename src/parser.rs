use crate::command::ArgVector;
use std::path::PathBuf;
use tracing::debug;

/// Token that separates concurrently running command groups.
pub const GROUP_SEPARATOR: &str = "&";

/// Kind of redirection
///
/// Defines which standard stream a redirection rebinds (`<`, `>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Input redirection (`<`): Reads standard input from a specified file.
    Input,
    /// Output redirection (`>`): Writes standard output to a file, **overwriting** the file if it exists.
    Output,
}

impl RedirectKind {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "<" => Some(Self::Input),
            ">" => Some(Self::Output),
            _ => None,
        }
    }
}

/// A redirection found in a command group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectSpec {
    pub kind: RedirectKind,
    /// The word after the operator; `None` when the operator ended the line.
    pub target: Option<PathBuf>,
}

/// A command group with its redirection pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirected {
    /// The words before the operator: the command that actually runs.
    pub command: ArgVector,
    pub redirect: RedirectSpec,
}

/// Partitions a line into command groups at `&` tokens.
///
/// The separators themselves are dropped. Each `&` ends a group on its own, so
/// `& &`, a leading `&` and a trailing `&` would produce empty groups; those are
/// skipped. At least one group is always returned: a line made only of separators
/// yields the no-op vector.
pub fn split_groups(argv: &ArgVector) -> Vec<ArgVector> {
    let groups: Vec<ArgVector> = argv
        .words()
        .split(|word| word == GROUP_SEPARATOR)
        .filter(|group| !group.is_empty())
        .map(|group| ArgVector::new(group.to_vec()))
        .collect();

    debug!(count = groups.len(), "split line into command groups");
    if groups.is_empty() {
        vec![ArgVector::noop()]
    } else {
        groups
    }
}

/// Finds the first `<` or `>` in a group.
///
/// Returns `None` when the group has no redirection. Otherwise the operator, its
/// target and anything after the target are cut from the command. Only the first
/// operator counts; later ones are discarded along with the rest of the tail.
pub fn extract_redirect(argv: &ArgVector) -> Option<Redirected> {
    let words = argv.words();
    let (index, kind) = words
        .iter()
        .enumerate()
        .find_map(|(i, word)| RedirectKind::from_token(word).map(|kind| (i, kind)))?;

    let target = words.get(index + 1).map(PathBuf::from);
    let command = ArgVector::new(words[..index].to_vec());
    debug!(?kind, ?target, command = %command, "found redirection");
    Some(Redirected {
        command,
        redirect: RedirectSpec { kind, target },
    })
}
