//! Commands that reach outside the buffer: files, the working directory and
//! external programs.

use super::{Interpreter, MAX_SOURCE_DEPTH, count_noun, place_caret, should_report};
use crate::address::resolve_insertion_point;
use crate::command::{
    DefaultRange, LineAddress, LineRange, LineRangeSpec, ReadSource, WriteTarget,
};
use crate::error::ExError;
use crate::io_ops::{read_lines, serialize, write_text};
use crate::parser::CommandParser;
use crate::range::resolve_range;
use crate::shell::ShellOutput;
use core_model::{EditorModel, ModelTransaction};
use core_state::{EditorState, LineEnding};
use core_text::{Buffer, Encoding, Position};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn whole_buffer(state: &EditorState) -> Option<LineRange> {
    state
        .line_count()
        .checked_sub(1)
        .map(|last| LineRange::new(0, last))
}

/// `~/x` relative to the home directory.
pub(crate) fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn exit_label(out: &ShellOutput) -> String {
    out.status
        .map_or_else(|| "signal".to_string(), |code| code.to_string())
}

/// Replace `!` with the previous command and `%` with the file name.
fn expand_command(state: &EditorState, raw: &str) -> Result<String, ExError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('!' | '%')) => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '!' => out.push_str(
                state
                    .session
                    .last_shell_command
                    .as_deref()
                    .ok_or(ExError::NoPreviousCommand)?,
            ),
            '%' => {
                let name = state.file_name.as_ref().ok_or(ExError::NoFileName)?;
                out.push_str(&name.display().to_string());
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

fn run_shell(
    interp: &mut Interpreter,
    state: &EditorState,
    command: &str,
    input: Option<&str>,
) -> Result<ShellOutput, ExError> {
    let shell = state.options.text("shell");
    interp
        .shell
        .run(&shell, command, input)
        .map_err(|e| ExError::io(command, e))
}

fn show_output(state: &mut EditorState, out: &ShellOutput) {
    for line in out.lines() {
        state.push_panel_line(line);
    }
}

pub(super) fn write(
    interp: &mut Interpreter,
    model: &mut EditorModel,
    range: &LineRangeSpec,
    force: bool,
    append: bool,
    target: &WriteTarget,
) -> Result<(), ExError> {
    let r = if model.state().line_count() == 0 {
        None
    } else {
        Some(resolve_range(model, range, DefaultRange::EntireBuffer)?)
    };
    match target {
        WriteTarget::File(path) => write_file(model.state_mut(), r, force, append, path.as_deref()),
        WriteTarget::Shell(command) => {
            let command = expand_command(model.state(), command)?;
            let text = serialize(model.state(), r);
            let out = run_shell(interp, model.state(), &command, Some(&text))?;
            let state = model.state_mut();
            state.session.record_shell_command(&command);
            show_output(state, &out);
            if out.success() {
                Ok(())
            } else {
                Err(ExError::ShellReturned(exit_label(&out)))
            }
        }
    }
}

fn write_file(
    state: &mut EditorState,
    range: Option<LineRange>,
    force: bool,
    append: bool,
    path: Option<&Path>,
) -> Result<(), ExError> {
    let current = state.file_name.clone();
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| current.clone())
        .ok_or(ExError::NoFileName)?;
    let is_current = current.as_deref() == Some(path.as_path());
    if !is_current && !force && !append && path.exists() {
        return Err(ExError::FileExists(path.display().to_string()));
    }
    // Replacement characters from a forced decode would overwrite the
    // original bytes.
    if is_current && !force && state.encoding == Encoding::Utf8Lossy {
        return Err(ExError::LossyConversion(path.display().to_string()));
    }
    let whole = range.is_none_or(|r| r.start == 0 && r.end + 1 == state.line_count());
    let text = serialize(state, range);
    let bytes = write_text(&path, &text, state.encoding, append)
        .map_err(|e| ExError::io(path.display(), e))?;
    if current.is_none() && !append {
        state.file_name = Some(path.clone());
    }
    if whole && !append && (is_current || current.is_none()) {
        state.mark_clean();
    }
    let lines = range.map_or(0, |r| r.count());
    let verb = if append { "appended" } else { "written" };
    state.set_info(format!("\"{}\" {lines}L, {bytes}B {verb}", path.display()));
    Ok(())
}

pub(super) fn write_all(model: &mut EditorModel) -> Result<(), ExError> {
    let state = model.state_mut();
    if !state.dirty {
        return Ok(());
    }
    let range = whole_buffer(state);
    write_file(state, range, false, false, None)
}

/// `:wq` / `:x`.
pub(super) fn write_quit(
    model: &mut EditorModel,
    force: bool,
    path: Option<&Path>,
    only_if_modified: bool,
) -> Result<(), ExError> {
    let state = model.state_mut();
    if !only_if_modified || state.dirty {
        let range = whole_buffer(state);
        write_file(state, range, force, false, path)?;
    }
    quit(model, true, false)
}

pub(super) fn quit(model: &mut EditorModel, force: bool, all: bool) -> Result<(), ExError> {
    if !all && model.views().len() > 1 {
        model.close_active_view();
        return Ok(());
    }
    if model.state().dirty && !force {
        return Err(ExError::NoWriteSinceLastChange);
    }
    info!(target: "ex.dispatch", force, "exit_requested");
    model.state_mut().request_exit();
    Ok(())
}

/// `:e[!] [file]`; without a file the current one is reloaded.
pub(super) fn edit(model: &mut EditorModel, force: bool, path: Option<&Path>) -> Result<(), ExError> {
    let state = model.state_mut();
    if state.dirty && !force {
        return Err(ExError::NoWriteSinceLastChange);
    }
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| state.file_name.clone())
        .ok_or(ExError::NoFileName)?;
    let name = path.display().to_string();
    match read_lines(&path) {
        Ok(file) => {
            let (lines, bytes) = (file.lines.len(), file.bytes);
            state.encoding = file.encoding;
            state.original_line_ending = file.line_ending;
            state.had_trailing_newline = file.had_trailing_newline;
            state.replace_buffer(file.into_buffer(&name), Some(path));
            state.set_info(format!("\"{name}\" {lines}L, {bytes}B"));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            state.encoding = Encoding::Utf8;
            state.original_line_ending = LineEnding::Lf;
            state.had_trailing_newline = true;
            state.replace_buffer(Buffer::empty(&name), Some(path));
            state.set_info(format!("\"{name}\" [New]"));
        }
        Err(e) => return Err(ExError::io(&name, e)),
    }
    model.clamp_cursors();
    model.set_cursor(Position::origin());
    Ok(())
}

/// `:r file` / `:r !cmd`: insert below the addressed line.
pub(super) fn read(
    interp: &mut Interpreter,
    model: &mut EditorModel,
    range: &LineRangeSpec,
    source: &ReadSource,
) -> Result<(), ExError> {
    let lines = match source {
        ReadSource::File(path) => {
            let path = path
                .clone()
                .or_else(|| model.state().file_name.clone())
                .ok_or(ExError::NoFileName)?;
            read_lines(&path)
                .map_err(|_| ExError::CantOpenFile(path.display().to_string()))?
                .lines
        }
        ReadSource::Shell(command) => {
            let command = expand_command(model.state(), command)?;
            let out = run_shell(interp, model.state(), &command, None)?;
            model.state_mut().session.record_shell_command(&command);
            out.lines()
        }
    };
    let state = model.state();
    let at = if state.line_count() == 0 {
        0
    } else {
        let address = range.last_address().unwrap_or(LineAddress::Current);
        resolve_insertion_point(state, &address, model.cursor().line)?
    };
    if lines.is_empty() {
        return Ok(());
    }
    {
        let mut txn = ModelTransaction::begin(model, "read");
        txn.state_mut().splice_lines(at, 0, &lines);
    }
    place_caret(model, at);
    Ok(())
}

/// `:so file`: run each line as a command, stopping at the first failure.
pub(super) fn source(interp: &mut Interpreter, model: &mut EditorModel, path: &Path) -> Result<(), ExError> {
    if interp.source_depth >= MAX_SOURCE_DEPTH {
        return Err(ExError::Recursive(":source"));
    }
    let path = expand_home(path);
    let file = read_lines(&path).map_err(|_| ExError::CantOpenFile(path.display().to_string()))?;
    debug!(target: "ex.dispatch", path = %path.display(), lines = file.lines.len(), depth = interp.source_depth, "source");
    interp.source_depth += 1;
    let outcome = run_script(interp, model, &file.lines);
    interp.source_depth -= 1;
    outcome
}

fn run_script(interp: &mut Interpreter, model: &mut EditorModel, lines: &[String]) -> Result<(), ExError> {
    for line in lines {
        let line = line.trim_start().trim_start_matches(':');
        // `"` starts a comment line.
        if line.starts_with('"') {
            continue;
        }
        if let Some(command) = CommandParser::parse(line)? {
            interp.execute(model, &command)?;
        }
        if model.state().exit_requested() {
            break;
        }
    }
    Ok(())
}

pub(super) fn change_directory(state: &mut EditorState, path: Option<&str>) -> Result<(), ExError> {
    let target = match path {
        None => dirs::home_dir()
            .ok_or_else(|| ExError::InvalidArgument("no home directory".into()))?,
        Some("-") => state
            .session
            .previous_dir
            .clone()
            .ok_or(ExError::NoPreviousDirectory)?,
        Some(p) => expand_home(Path::new(p)),
    };
    let here = std::env::current_dir().map_err(|e| ExError::io(".", e))?;
    std::env::set_current_dir(&target).map_err(|e| ExError::io(target.display(), e))?;
    debug!(target: "ex.dispatch", from = %here.display(), to = %target.display(), "cd");
    state.session.previous_dir = Some(here);
    Ok(())
}

pub(super) fn print_working_directory(state: &mut EditorState) -> Result<(), ExError> {
    let here = std::env::current_dir().map_err(|e| ExError::io(".", e))?;
    state.set_info(here.display().to_string());
    Ok(())
}

/// `:make [args]` runs `makeprg` and shows what it printed.
pub(super) fn make(interp: &mut Interpreter, state: &mut EditorState, args: &str) -> Result<(), ExError> {
    let program = state.options.text("makeprg");
    let command = match args.trim() {
        "" => program,
        args => format!("{program} {args}"),
    };
    let out = run_shell(interp, state, &command, None)?;
    show_output(state, &out);
    if out.success() {
        Ok(())
    } else {
        Err(ExError::ShellReturned(exit_label(&out)))
    }
}

/// `:!cmd`
pub(super) fn shell(interp: &mut Interpreter, state: &mut EditorState, command: &str) -> Result<(), ExError> {
    let command = expand_command(state, command)?;
    let out = run_shell(interp, state, &command, None)?;
    state.session.record_shell_command(&command);
    show_output(state, &out);
    if !out.success() {
        state.set_info(format!("shell returned {}", exit_label(&out)));
    }
    Ok(())
}

/// `:{range}!cmd`: replace the lines with the command's output.
pub(super) fn filter(
    interp: &mut Interpreter,
    model: &mut EditorModel,
    range: &LineRangeSpec,
    command: &str,
) -> Result<(), ExError> {
    let r = resolve_range(model, range, DefaultRange::NoDefault)?;
    let command = expand_command(model.state(), command)?;
    let input: String = model
        .state()
        .active_buffer()
        .lines(r.start..r.end + 1)
        .into_iter()
        .map(|l| l + "\n")
        .collect();
    let out = run_shell(interp, model.state(), &command, Some(&input))?;
    model.state_mut().session.record_shell_command(&command);
    if !out.success() {
        return Err(ExError::ShellReturned(exit_label(&out)));
    }
    let lines = out.lines();
    {
        let mut txn = ModelTransaction::begin(model, "filter");
        txn.state_mut().splice_lines(r.start, r.count(), &lines);
    }
    match model.state().line_count() {
        0 => model.set_cursor(Position::origin()),
        count => place_caret(model, r.start.min(count - 1)),
    }
    if should_report(model.state(), r.count()) {
        model
            .state_mut()
            .set_info(format!("{} filtered", count_noun(r.count(), "line")));
    }
    Ok(())
}
