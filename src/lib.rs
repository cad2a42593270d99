//! A small Unix shell.
//!
//! Lines are split on whitespace, cut into `&`-separated command groups that run
//! concurrently, and each group is dispatched either to a built-in implemented in
//! Rust or to an external program launched with `fork`/`execv`. A single `<` or
//! `>` redirection per group rebinds standard input or output for that command
//! only, and the last twenty commands can be recalled with `!N`.
//!
//! The main entry point is [`Interpreter`], which owns the session state (search
//! path, history, saved standard handles) and runs one line at a time from any
//! [`LineSource`].

mod builtin;
pub mod command;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod external;
pub mod history;
pub mod input;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod process;
pub mod redirect;

/// The shell session.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;

pub use error::ShellError;
pub use input::LineSource;
