#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_ex::{Interpreter, RunResult, ShellOutput, ShellRunner};
use core_model::EditorModel;
use core_state::EditorState;
use core_text::Buffer;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

/// One invocation seen by `FakeShell`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCall {
    pub command: String,
    pub input: Option<String>,
}

/// Understands a handful of commands: `sort`, `rev-lines`, `echo ...`,
/// `fail`. Anything else fails to spawn.
#[derive(Default)]
pub struct FakeShell {
    pub calls: Rc<RefCell<Vec<ShellCall>>>,
}

impl ShellRunner for FakeShell {
    fn run(&mut self, _shell: &str, command: &str, input: Option<&str>) -> io::Result<ShellOutput> {
        self.calls.borrow_mut().push(ShellCall {
            command: command.to_string(),
            input: input.map(str::to_string),
        });
        let lines: Vec<&str> = input.map(|i| i.lines().collect()).unwrap_or_default();
        let ok = |output: String| ShellOutput {
            output,
            status: Some(0),
        };
        match command {
            "sort" => {
                let mut sorted = lines;
                sorted.sort_unstable();
                Ok(ok(sorted.iter().map(|l| format!("{l}\n")).collect()))
            }
            "rev-lines" => Ok(ok(lines.iter().rev().map(|l| format!("{l}\n")).collect())),
            "fail" => Ok(ShellOutput {
                output: "boom\n".into(),
                status: Some(2),
            }),
            c if c.starts_with("echo ") => Ok(ok(format!("{}\n", &c[5..]))),
            other => Err(io::Error::new(io::ErrorKind::NotFound, other.to_string())),
        }
    }
}

pub fn model(lines: &[&str]) -> EditorModel {
    EditorModel::new(EditorState::new(Buffer::from_lines("test", lines)))
}

/// Interpreter wired to a `FakeShell`, plus the shell's call log.
pub fn interpreter() -> (Interpreter, Rc<RefCell<Vec<ShellCall>>>) {
    let shell = FakeShell::default();
    let calls = Rc::clone(&shell.calls);
    (Interpreter::with_shell(Box::new(shell)), calls)
}

pub fn text(model: &EditorModel) -> Vec<String> {
    let buffer = model.state().active_buffer();
    buffer.lines(0..buffer.line_count())
}

/// Run each line, failing the test on the first error status.
pub fn run_ok(ex: &mut Interpreter, model: &mut EditorModel, lines: &[&str]) {
    for line in lines {
        let result = ex.run_line(model, line);
        assert!(
            matches!(result, RunResult::Completed),
            "{line}: unexpected confirmation prompt"
        );
        assert!(
            !model.state().status_is_error(),
            "{line}: {:?}",
            model.state().status_text()
        );
    }
}

pub fn run_err(ex: &mut Interpreter, model: &mut EditorModel, line: &str) -> String {
    ex.run_line(model, line);
    assert!(model.state().status_is_error(), "{line}: expected an error");
    model.state().status_text().unwrap_or_default().to_string()
}
