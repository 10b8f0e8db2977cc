//! mish: a small interactive command interpreter.
//!
//! A line is split on `&` into segments that run concurrently. Each segment is
//! either a builtin handled in-process (`cd`, `exit`, `NAME=VALUE`) or a
//! pipeline of external programs connected with `|`, with optional `<` and
//! `>` redirection. The interpreter waits for every segment of a line before
//! reading the next one.
//!
//! The main entry point is [`Interpreter`]. Parsing lives in [`lexer`],
//! [`validator`] and [`parser`]; process management in [`orchestrator`],
//! [`pipes`] and [`redirect`].

mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod external;
pub mod input;
mod interpreter;
pub mod lexer;
pub mod orchestrator;
pub mod parser;
pub mod pipes;
pub mod redirect;
pub mod validator;

#[cfg(test)]
mod test_support;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use error::MishError;
