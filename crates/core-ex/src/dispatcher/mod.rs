//! Command execution.
//!
//! `Interpreter::run` takes one parsed `Command`, routes it to the handler for
//! its variant and turns any `ExError` into an error status line. The handler
//! modules:
//! * `motion`     - jump to a line, search
//! * `edit`       - delete / yank / put / copy / move / join / shift / retab / mark
//! * `display`    - print, `:marks`, `:registers`
//! * `undo`       - undo / redo
//! * `settings`   - `:set`, `:echo`, `:let`
//! * `mapping`    - `:map` family
//! * `files`      - read / write / edit / quit / source / cd / shell / make
//! * `window`     - split, close, fold
//! * `global`     - `:g` / `:v`
//! * `substitute` - `:s`, `:&`, `:~` and the confirm protocol
//!
//! Every handler that mutates the buffer does so inside a
//! `ModelTransaction`, so an early return still closes the undo boundary.

use crate::command::Command;
use crate::error::ExError;
use crate::parser::CommandParser;
use crate::shell::{ShellRunner, SystemShell};
use core_model::EditorModel;
use core_state::EditorState;
use core_text::Position;
use tracing::debug;

mod display;
mod edit;
mod files;
mod global;
mod mapping;
mod motion;
mod settings;
mod substitute;
mod undo;
mod window;

pub use substitute::PendingSubstitute;

/// Nesting limit for `:source`.
pub const MAX_SOURCE_DEPTH: usize = 32;

/// Outcome of running one command.
#[derive(Debug)]
pub enum RunResult {
    Completed,
    /// A `c`-flagged substitute stopped at a match; hand the value back to
    /// `Interpreter::resume` (or `abandon`) to continue.
    AwaitingSubstituteConfirmation(PendingSubstitute),
}

/// Answer to one substitute confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Replace,
    Skip,
    ReplaceAll,
    Quit,
}

pub struct Interpreter {
    shell: Box<dyn ShellRunner>,
    source_depth: usize,
    global_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_shell(Box::new(SystemShell))
    }

    pub fn with_shell(shell: Box<dyn ShellRunner>) -> Self {
        Self {
            shell,
            source_depth: 0,
            global_depth: 0,
        }
    }

    /// Parse and run one command line. The line is remembered for the `:`
    /// register even when it fails to parse.
    pub fn run_line(&mut self, model: &mut EditorModel, line: &str) -> RunResult {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            model.state_mut().session.record_command_line(trimmed);
        }
        match CommandParser::parse(line) {
            Ok(Some(command)) => self.run(model, &command),
            Ok(None) => RunResult::Completed,
            Err(e) => {
                report(model.state_mut(), "parse", &e);
                RunResult::Completed
            }
        }
    }

    /// Run one parsed command. Errors end up in the status line; this never
    /// fails.
    pub fn run(&mut self, model: &mut EditorModel, command: &Command) -> RunResult {
        let state = model.state_mut();
        state.clear_status();
        state.take_panel();
        match self.execute(model, command) {
            Ok(result) => result,
            Err(e) => {
                report(model.state_mut(), command.name(), &e);
                RunResult::Completed
            }
        }
    }

    /// Continue a pending confirm-substitute with the user's decision.
    pub fn resume(
        &mut self,
        model: &mut EditorModel,
        pending: PendingSubstitute,
        decision: ConfirmDecision,
    ) -> RunResult {
        model.state_mut().clear_status();
        match substitute::resume(model, pending, decision) {
            Ok(result) => result,
            Err(e) => {
                report(model.state_mut(), "substitute", &e);
                RunResult::Completed
            }
        }
    }

    /// Drop a pending confirm-substitute without further replacements.
    pub fn abandon(&mut self, model: &mut EditorModel, pending: PendingSubstitute) {
        pending.release(model.state_mut());
    }

    /// Commands run from `:global` or `:source` cannot stop for confirmation.
    fn is_nested(&self) -> bool {
        self.global_depth > 0 || self.source_depth > 0
    }

    pub(crate) fn execute(
        &mut self,
        model: &mut EditorModel,
        command: &Command,
    ) -> Result<RunResult, ExError> {
        debug!(target: "ex.dispatch", command = command.name(), "dispatch");
        match command {
            Command::Jump { range } => motion::jump(model, range)?,
            Command::Search { pattern, backward } => motion::search(model, pattern, *backward)?,
            Command::Delete { range, register } => edit::delete(model, range, *register)?,
            Command::Yank { range, register } => edit::yank(model, range, *register)?,
            Command::Put {
                range,
                register,
                before,
            } => edit::put(model, range, *register, *before)?,
            Command::Copy { range, destination } => edit::copy(model, range, destination)?,
            Command::Move { range, destination } => edit::move_lines(model, range, destination)?,
            Command::Join { range, keep_spaces } => edit::join(model, range, *keep_spaces)?,
            Command::Shift {
                range,
                direction,
                amount,
            } => edit::shift(model, range, *direction, *amount)?,
            Command::Retab {
                range,
                all,
                tabstop,
            } => edit::retab(model, range, *all, *tabstop)?,
            Command::Mark { range, name } => edit::mark(model, range, *name)?,
            Command::Print { range, flags } => display::print(model, range, *flags)?,
            Command::Global {
                range,
                pattern,
                matching,
                command,
            } => global::run(self, model, range, pattern, *matching, command)?,
            Command::Substitute {
                range,
                pattern,
                replacement,
                flags,
            } => return substitute::start(self, model, range, pattern, replacement, *flags),
            Command::SubstituteRepeat {
                range,
                flags,
                use_last_search,
            } => return substitute::repeat(self, model, range, *flags, *use_last_search),
            Command::Set { args } => settings::set(model.state_mut(), args)?,
            Command::Map {
                modes,
                lhs,
                rhs,
                noremap,
            } => mapping::map(
                model.state_mut(),
                *modes,
                lhs.as_deref(),
                rhs.as_deref(),
                *noremap,
            )?,
            Command::Unmap { modes, lhs } => mapping::unmap(model.state_mut(), *modes, lhs)?,
            Command::MapClear { modes } => mapping::clear(model.state_mut(), *modes),
            Command::Undo => undo::undo(model),
            Command::Redo => undo::redo(model),
            Command::Write {
                range,
                force,
                append,
                target,
            } => files::write(self, model, range, *force, *append, target)?,
            Command::WriteAll => files::write_all(model)?,
            Command::WriteQuit {
                force,
                path,
                only_if_modified,
            } => files::write_quit(model, *force, path.as_deref(), *only_if_modified)?,
            Command::Quit { force, all } => files::quit(model, *force, *all)?,
            Command::Edit { force, path } => files::edit(model, *force, path.as_deref())?,
            Command::Read { range, source } => files::read(self, model, range, source)?,
            Command::Source { path } => files::source(self, model, path)?,
            Command::ChangeDirectory { path } => {
                files::change_directory(model.state_mut(), path.as_deref())?
            }
            Command::PrintWorkingDirectory => files::print_working_directory(model.state_mut())?,
            Command::Make { args } => files::make(self, model.state_mut(), args)?,
            Command::Shell { command } => files::shell(self, model.state_mut(), command)?,
            Command::Filter { range, command } => files::filter(self, model, range, command)?,
            Command::Marks { names } => display::marks(model.state_mut(), names.as_deref()),
            Command::Registers { names } => {
                display::registers(model.state_mut(), names.as_deref())
            }
            Command::Echo { exprs } => settings::echo(model.state_mut(), exprs)?,
            Command::Let { name, expr } => settings::let_variable(model.state_mut(), name, expr)?,
            Command::Fold { range } => window::fold(model, range)?,
            Command::Split { vertical, file } => window::split(model, *vertical, file.as_deref())?,
            Command::Close { force } => window::close(model, *force)?,
        }
        Ok(RunResult::Completed)
    }
}

fn report(state: &mut EditorState, command: &str, error: &ExError) {
    debug!(target: "ex.dispatch", command, error = %error, "command_failed");
    state.set_error(error.to_string());
}

/// Byte offset of the first non-blank character (line length when blank).
pub(crate) fn first_non_blank(text: &str) -> usize {
    text.find(|c: char| !c.is_whitespace())
        .unwrap_or(text.len())
}

/// Put the caret on the first non-blank of `line`.
pub(crate) fn place_caret(model: &mut EditorModel, line: usize) {
    let byte = model
        .state()
        .active_buffer()
        .line(line)
        .map_or(0, |t| first_non_blank(&t));
    model.set_cursor(Position::new(line, byte));
}

/// Whether a change touching `n` lines is worth a message (`report` option).
pub(crate) fn should_report(state: &EditorState, n: usize) -> bool {
    i64::try_from(n).unwrap_or(i64::MAX) > state.options.number("report")
}

/// "1 line" / "3 lines".
pub(crate) fn count_noun(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
