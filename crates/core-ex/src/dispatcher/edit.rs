//! Line-wise edits: delete, yank, put, copy, move, join, shift, retab, mark.
//!
//! Caret targets are computed from post-edit line numbers.

use super::{count_noun, place_caret, should_report};
use crate::address::{resolve_address, resolve_insertion_point};
use crate::command::{DefaultRange, LineAddress, LineRange, LineRangeSpec, ShiftDirection};
use crate::error::ExError;
use crate::range::resolve_range;
use core_model::{EditorModel, ModelTransaction};
use core_state::{EditorState, MarkTable, RegisterValue, Registers};
use core_text::{Position, display_width, indent_width, make_indent};
use tracing::trace;

fn range_lines(state: &EditorState, range: LineRange) -> Vec<String> {
    state.active_buffer().lines(range.start..range.end + 1)
}

fn check_register(register: Option<char>) -> Result<(), ExError> {
    match register {
        Some(r) if !Registers::is_valid_target(r) => Err(ExError::InvalidRegister(r)),
        _ => Ok(()),
    }
}

pub(super) fn delete(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    register: Option<char>,
) -> Result<(), ExError> {
    check_register(register)?;
    let r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    let lines = range_lines(model.state(), r);
    model
        .state_mut()
        .registers
        .record_delete(register, RegisterValue::linewise(&lines))?;
    {
        let mut txn = ModelTransaction::begin(model, "delete");
        txn.state_mut().splice_lines::<&str>(r.start, r.count(), &[]);
    }
    let count = model.state().line_count();
    if count == 0 {
        model.set_cursor(Position::origin());
    } else {
        place_caret(model, r.start.min(count - 1));
    }
    trace!(target: "ex.dispatch", start = r.start, lines = r.count(), "delete");
    if should_report(model.state(), r.count()) {
        model
            .state_mut()
            .set_info(format!("{} fewer lines", r.count()));
    }
    Ok(())
}

pub(super) fn yank(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    register: Option<char>,
) -> Result<(), ExError> {
    check_register(register)?;
    let r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    let lines = range_lines(model.state(), r);
    let state = model.state_mut();
    state
        .registers
        .record_yank(register, RegisterValue::linewise(&lines))?;
    if should_report(state, r.count()) {
        state.set_info(format!("{} yanked", count_noun(r.count(), "line")));
    }
    Ok(())
}

pub(super) fn put(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    register: Option<char>,
    before: bool,
) -> Result<(), ExError> {
    let name = register.unwrap_or('"');
    let value = model
        .state()
        .read_register(name)
        .ok_or(ExError::RegisterEmpty(name))?;
    let lines = value.lines();
    let caret = model.cursor().line;
    let state = model.state();
    let at = if state.line_count() == 0 {
        0
    } else {
        let address = range.last_address().unwrap_or(LineAddress::Current);
        match (&address, before) {
            (LineAddress::Number(0), _) => 0,
            (_, true) => resolve_address(state, &address, caret)?,
            (_, false) => resolve_insertion_point(state, &address, caret)?,
        }
    };
    let inserted = {
        let mut txn = ModelTransaction::begin(model, "put");
        txn.state_mut().splice_lines(at, 0, &lines).inserted
    };
    place_caret(model, at + inserted.max(1) - 1);
    if should_report(model.state(), inserted) {
        model
            .state_mut()
            .set_info(format!("{inserted} more lines"));
    }
    Ok(())
}

pub(super) fn copy(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    destination: &LineAddress,
) -> Result<(), ExError> {
    let r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    let caret = model.cursor().line;
    let at = resolve_insertion_point(model.state(), destination, caret)?;
    let lines = range_lines(model.state(), r);
    if lines.is_empty() {
        return Err(ExError::InvalidRange);
    }
    {
        let mut txn = ModelTransaction::begin(model, "copy");
        txn.state_mut().splice_lines(at, 0, &lines);
    }
    place_caret(model, at + lines.len() - 1);
    trace!(target: "ex.dispatch", start = r.start, end = r.end, at, "copy");
    if should_report(model.state(), lines.len()) {
        model
            .state_mut()
            .set_info(format!("{} more lines", lines.len()));
    }
    Ok(())
}

pub(super) fn move_lines(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    destination: &LineAddress,
) -> Result<(), ExError> {
    let r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    let caret = model.cursor().line;
    let at = resolve_insertion_point(model.state(), destination, caret)?;
    if at > r.start && at <= r.end {
        return Err(ExError::MoveIntoItself);
    }
    let n = r.count();
    if at == r.start || at == r.end + 1 {
        place_caret(model, r.end);
        return Ok(());
    }
    let lines = range_lines(model.state(), r);
    let last = {
        let mut txn = ModelTransaction::begin(model, "move");
        let state = txn.state_mut();
        if at > r.end {
            state.splice_lines(at, 0, &lines);
            state.splice_lines::<&str>(r.start, n, &[]);
            at - 1
        } else {
            state.splice_lines::<&str>(r.start, n, &[]);
            state.splice_lines(at, 0, &lines);
            at + n - 1
        }
    };
    place_caret(model, last);
    trace!(target: "ex.dispatch", start = r.start, end = r.end, at, "move");
    if should_report(model.state(), n) {
        model
            .state_mut()
            .set_info(format!("{} moved", count_noun(n, "line")));
    }
    Ok(())
}

/// Join `lines` into one. Returns the text and the byte where the last
/// join happened.
fn join_text(lines: &[String], keep_spaces: bool) -> (String, usize) {
    let mut out = lines.first().cloned().unwrap_or_default();
    let mut joint = 0;
    for next in &lines[1.min(lines.len())..] {
        joint = out.len();
        if keep_spaces {
            out.push_str(next);
            continue;
        }
        let next = next.trim_start();
        if next.is_empty() {
            continue;
        }
        if !out.is_empty() && !out.ends_with([' ', '\t']) && !next.starts_with(')') {
            out.push(' ');
        }
        out.push_str(next);
    }
    (out, joint)
}

pub(super) fn join(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    keep_spaces: bool,
) -> Result<(), ExError> {
    let mut r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    let count = model.state().line_count();
    if r.count() == 1 {
        // `:5j` joins line 5 with the one below it.
        if r.end + 1 >= count {
            return Ok(());
        }
        r.end += 1;
    }
    let lines = range_lines(model.state(), r);
    let (joined, joint) = join_text(&lines, keep_spaces);
    {
        let mut txn = ModelTransaction::begin(model, "join");
        txn.state_mut()
            .splice_lines(r.start, r.count(), &[joined.as_str()]);
    }
    model.set_cursor(Position::new(r.start, joint));
    trace!(target: "ex.dispatch", start = r.start, lines = r.count(), "join");
    Ok(())
}

pub(super) fn shift(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    direction: ShiftDirection,
    amount: usize,
) -> Result<(), ExError> {
    let r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    let options = &model.state().options;
    let (sw, ts, et) = (
        options.shiftwidth(),
        options.tabstop(),
        options.toggle("expandtab"),
    );
    let delta = sw.saturating_mul(amount);
    let shifted: Vec<String> = range_lines(model.state(), r)
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                return line;
            }
            let (bytes, width) = indent_width(&line, ts);
            let width = match direction {
                ShiftDirection::Right => width.saturating_add(delta),
                ShiftDirection::Left => width.saturating_sub(delta),
            };
            format!("{}{}", make_indent(width, ts, et), &line[bytes..])
        })
        .collect();
    {
        let mut txn = ModelTransaction::begin(model, "shift");
        txn.state_mut().splice_lines(r.start, r.count(), &shifted);
    }
    place_caret(model, r.end);
    if should_report(model.state(), r.count()) {
        let op = match direction {
            ShiftDirection::Right => '>',
            ShiftDirection::Left => '<',
        };
        model.state_mut().set_info(format!(
            "{} {}ed {}",
            count_noun(r.count(), "line"),
            op,
            count_noun(amount, "time")
        ));
    }
    Ok(())
}

/// Whitespace of width `start..end` rebuilt for tabstop `ts`.
fn fill(start: usize, end: usize, ts: usize, expandtab: bool) -> String {
    if expandtab {
        return " ".repeat(end - start);
    }
    let mut out = String::new();
    let mut col = start;
    loop {
        let next = (col / ts + 1) * ts;
        if next > end {
            break;
        }
        out.push('\t');
        col = next;
    }
    out.push_str(&" ".repeat(end - col));
    out
}

/// Re-tab one line: whitespace runs are measured with `old_ts` and rebuilt
/// with `new_ts`. Runs without a tab are left alone unless `all`.
fn retab_line(line: &str, old_ts: usize, new_ts: usize, expandtab: bool, all: bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    let mut rest = line;
    while !rest.is_empty() {
        let ws_len = rest
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(rest.len());
        if ws_len > 0 {
            let run = &rest[..ws_len];
            let end = col + display_width_from(col, run, old_ts);
            if run.contains('\t') || (all && ws_len > 1) {
                out.push_str(&fill(col, end, new_ts, expandtab));
            } else {
                out.push_str(run);
            }
            col = end;
            rest = &rest[ws_len..];
            continue;
        }
        let text_len = rest.find([' ', '\t']).unwrap_or(rest.len());
        let text = &rest[..text_len];
        col += display_width(text, old_ts);
        out.push_str(text);
        rest = &rest[text_len..];
    }
    out
}

/// Width of a whitespace run starting at column `col`.
fn display_width_from(col: usize, run: &str, ts: usize) -> usize {
    let ts = ts.max(1);
    let mut c = col;
    for ch in run.chars() {
        c += if ch == '\t' { ts - c % ts } else { 1 };
    }
    c - col
}

pub(super) fn retab(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    all: bool,
    tabstop: Option<usize>,
) -> Result<(), ExError> {
    let r = resolve_range(model, range, DefaultRange::EntireBuffer)?;
    let options = &model.state().options;
    let old_ts = options.tabstop();
    let new_ts = tabstop.filter(|t| *t > 0).unwrap_or(old_ts);
    let expandtab = options.toggle("expandtab");
    let original = range_lines(model.state(), r);
    let retabbed: Vec<String> = original
        .iter()
        .map(|l| retab_line(l, old_ts, new_ts, expandtab, all))
        .collect();
    if retabbed != original {
        let mut txn = ModelTransaction::begin(model, "retab");
        txn.state_mut().splice_lines(r.start, r.count(), &retabbed);
    }
    if new_ts != old_ts {
        model
            .state_mut()
            .options
            .set_from_str("tabstop", &new_ts.to_string())?;
    }
    Ok(())
}

pub(super) fn mark(model: &mut EditorModel, range: &LineRangeSpec, name: char) -> Result<(), ExError> {
    if !MarkTable::is_user_settable(name) {
        return Err(ExError::InvalidMark(name));
    }
    let caret = model.cursor().line;
    let line = match range.last_address() {
        Some(address) => resolve_address(model.state(), &address, caret)?,
        None if model.state().line_count() == 0 => return Err(ExError::InvalidAddress),
        None => caret,
    };
    model
        .state_mut()
        .set_mark(name, Position::new(line, 0))?;
    Ok(())
}
