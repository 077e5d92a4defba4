//! core-ex: the ex command language.
//!
//! A command line goes through three stages:
//! * `CommandParser` turns the text into a `Command` with unresolved
//!   addresses (`LineRangeSpec`).
//! * `Interpreter` resolves the range against the current buffer and caret
//!   (`range` / `address`) and runs the handler for the command.
//! * The handler edits through `EditorState`, inside a `ModelTransaction`
//!   when it changes content, and reports through the status line / panel.
//!
//! Failures never escape `Interpreter::run`: they become an error status.
//! The only suspension point is a confirm-substitute, returned as
//! `RunResult::AwaitingSubstituteConfirmation` and continued with
//! `Interpreter::resume`.

pub mod address;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod expr;
pub mod io_ops;
pub mod parser;
pub mod range;
pub mod search;
pub mod shell;

pub use address::{resolve_address, resolve_insertion_point};
pub use command::{
    Command, DefaultRange, LineAddress, LineRange, LineRangeSpec, PrintFlags, ReadSource,
    SetArgument, SetOp, ShiftDirection, WriteTarget,
};
pub use dispatcher::{ConfirmDecision, Interpreter, MAX_SOURCE_DEPTH, PendingSubstitute, RunResult};
pub use error::ExError;
pub use parser::CommandParser;
pub use range::resolve_range;
pub use search::MatchSpan;
pub use shell::{ShellOutput, ShellRunner, SystemShell};
