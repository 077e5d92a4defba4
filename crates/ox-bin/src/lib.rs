//! Line-mode driver for the `ox-ex` binary.
//!
//! `Session` owns the editor model and the interpreter and feeds them command
//! lines. After every command the status panel and status line are flushed:
//! panel rows and informational messages to `out`, errors to `err`. A
//! confirm-flagged substitute prompts on `out` and reads the answer from the
//! same reader the commands come from.

use anyhow::Result;
use core_ex::{Command, ConfirmDecision, Interpreter, PendingSubstitute, RunResult};
use core_model::EditorModel;
use core_state::EditorState;
use core_text::Buffer;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, info};

pub struct Session<R, W, E> {
    model: EditorModel,
    interp: Interpreter,
    input: R,
    out: W,
    err: E,
    failures: usize,
}

impl<R: BufRead, W: Write, E: Write> Session<R, W, E> {
    pub fn new(interp: Interpreter, input: R, out: W, err: E) -> Self {
        let state = EditorState::new(Buffer::empty("[No Name]"));
        Self {
            model: EditorModel::new(state),
            interp,
            input,
            out,
            err,
            failures: 0,
        }
    }

    pub fn model(&self) -> &EditorModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut EditorModel {
        &mut self.model
    }

    /// Number of commands that ended with an error status.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn exit_requested(&self) -> bool {
        self.model.state().exit_requested()
    }

    /// Load `path` the way `:e! path` does.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let command = Command::Edit {
            force: true,
            path: Some(path.to_path_buf()),
        };
        self.run_command(&command)
    }

    /// Run a command file the way `:source` does.
    pub fn source(&mut self, path: &Path) -> Result<()> {
        let command = Command::Source {
            path: path.to_path_buf(),
        };
        self.run_command(&command)
    }

    pub fn run_line(&mut self, line: &str) -> Result<()> {
        let result = self.interp.run_line(&mut self.model, line);
        self.drive(result)
    }

    pub fn run_command(&mut self, command: &Command) -> Result<()> {
        let result = self.interp.run(&mut self.model, command);
        self.drive(result)
    }

    /// Read commands one per line until end of input or a quit command.
    pub fn run_input(&mut self) -> Result<()> {
        let mut line = String::new();
        while !self.exit_requested() {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                debug!(target: "runtime", "input_eof");
                break;
            }
            self.run_line(line.trim_end_matches(['\n', '\r']))?;
        }
        Ok(())
    }

    fn drive(&mut self, mut result: RunResult) -> Result<()> {
        while let RunResult::AwaitingSubstituteConfirmation(pending) = result {
            let decision = match self.flush().and_then(|()| self.prompt(&pending)) {
                Ok(decision) => decision,
                Err(e) => {
                    self.interp.abandon(&mut self.model, pending);
                    return Err(e);
                }
            };
            result = self.interp.resume(&mut self.model, pending, decision);
        }
        self.flush()
    }

    fn prompt(&mut self, pending: &PendingSubstitute) -> Result<ConfirmDecision> {
        let span = pending.span();
        let text = self
            .model
            .state()
            .active_buffer()
            .line(span.line)
            .unwrap_or_default();
        let text = text.trim_end_matches('\n');
        let width = span.end.saturating_sub(span.start).max(1);
        let lead: String = text[..span.start.min(text.len())]
            .chars()
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        writeln!(self.out, "{text}")?;
        writeln!(self.out, "{lead}{}", "^".repeat(width))?;
        let mut answer = String::new();
        loop {
            write!(self.out, "replace with {} (y/n/a/q)? ", pending.replacement())?;
            self.out.flush()?;
            answer.clear();
            if self.input.read_line(&mut answer)? == 0 {
                return Ok(ConfirmDecision::Quit);
            }
            if let Some(decision) = parse_decision(&answer) {
                return Ok(decision);
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        let state = self.model.state_mut();
        for row in state.take_panel() {
            writeln!(self.out, "{row}")?;
        }
        if let Some(message) = state.status_text() {
            if state.status_is_error() {
                self.failures += 1;
                info!(target: "runtime", error = message, "command_failed");
                writeln!(self.err, "{message}")?;
            } else {
                writeln!(self.out, "{message}")?;
            }
        }
        state.clear_status();
        Ok(())
    }
}

/// `y`, `n`, `a` or `q`; anything else asks again.
pub fn parse_decision(answer: &str) -> Option<ConfirmDecision> {
    match answer.trim() {
        "y" | "Y" => Some(ConfirmDecision::Replace),
        "n" | "N" => Some(ConfirmDecision::Skip),
        "a" | "A" => Some(ConfirmDecision::ReplaceAll),
        "q" | "Q" => Some(ConfirmDecision::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions() {
        assert_eq!(parse_decision("y\n"), Some(ConfirmDecision::Replace));
        assert_eq!(parse_decision(" n "), Some(ConfirmDecision::Skip));
        assert_eq!(parse_decision("a"), Some(ConfirmDecision::ReplaceAll));
        assert_eq!(parse_decision("q"), Some(ConfirmDecision::Quit));
        assert_eq!(parse_decision("yes"), None);
        assert_eq!(parse_decision(""), None);
    }
}
