//! crabsh: a small interactive UNIX shell.
//!
//! Each input line flows through a fixed pipeline: the control-flow splitter
//! breaks the line into segments at `;`, `&&` and `||`; the tokenizer turns a
//! segment into an argument list while resolving quotes, backslash escapes and
//! `$NAME` / `${NAME}` references; aliases are expanded; and the result is
//! dispatched either to a builtin handler or to external process creation.
//! The exit status of every segment is recorded in the synthetic `?` variable
//! and drives the `&&` / `||` continuation decisions.
//!
//! The main entry point is [`Interpreter`], which owns all session state
//! (environment, aliases, completion caches) and runs the interactive loop.

mod alias;
mod builtin;
mod complete;
mod control;
pub mod env;
mod external;
mod interpreter;
mod lexer;

pub use interpreter::Interpreter;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;
