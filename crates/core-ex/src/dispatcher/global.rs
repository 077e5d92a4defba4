//! `:g/pat/cmd` and `:v/pat/cmd`.
//!
//! Lines are selected against the buffer as it is before anything runs and
//! turned into tracked locations right away; the sub-command may add or
//! remove lines, so raw numbers would go stale. Each surviving location is
//! then visited in order with the caret on it. The apply phase is one undo
//! transaction; the sub-commands' own transactions nest into it.

use super::Interpreter;
use crate::command::{Command, DefaultRange, LineRangeSpec};
use crate::error::ExError;
use crate::range::resolve_range;
use crate::search::compile;
use core_model::{EditorModel, ModelTransaction};
use core_state::{SearchDirection, SubstituteFlags};
use core_text::{LocationId, Position};
use tracing::{debug, trace};

pub(super) fn run(
    interp: &mut Interpreter,
    model: &mut EditorModel,
    range: &LineRangeSpec,
    pattern: &str,
    matching: bool,
    command: &Command,
) -> Result<(), ExError> {
    if interp.global_depth > 0 {
        return Err(ExError::Recursive(":global"));
    }
    let pattern = if pattern.is_empty() {
        model
            .state()
            .session
            .last_search_pattern()
            .ok_or(ExError::NoPreviousPattern)?
            .to_string()
    } else {
        pattern.to_string()
    };
    let r = resolve_range(model, range, DefaultRange::EntireBuffer)?;
    let state = model.state();
    let regex = compile(&pattern, &state.options, SubstituteFlags::empty())?;
    let buffer = state.active_buffer();
    let selected: Vec<usize> = (r.start..=r.end)
        .filter(|&l| buffer.line(l).is_some_and(|t| regex.is_match(&t) == matching))
        .collect();
    model
        .state_mut()
        .session
        .record_search(&pattern, SearchDirection::Forward);
    if selected.is_empty() {
        if matching {
            return Err(ExError::PatternNotFound(pattern));
        }
        model
            .state_mut()
            .set_info(format!("Pattern found in every line: {pattern}"));
        return Ok(());
    }
    debug!(
        target: "ex.global",
        pattern = %pattern,
        matching,
        selected = selected.len(),
        command = command.name(),
        "global_start"
    );
    interp.global_depth += 1;
    let outcome = apply(interp, model, &selected, command);
    interp.global_depth -= 1;
    outcome
}

fn apply(
    interp: &mut Interpreter,
    model: &mut EditorModel,
    selected: &[usize],
    command: &Command,
) -> Result<(), ExError> {
    let mut txn = ModelTransaction::begin(model, "global");
    let ids: Vec<LocationId> = selected
        .iter()
        .map(|&l| txn.track(Position::new(l, 0)))
        .collect();
    for id in ids {
        let Some(pos) = txn.resolve(id) else {
            trace!(target: "ex.global", ?id, "line_gone");
            continue;
        };
        txn.set_cursor(Position::new(pos.line, 0));
        interp.execute(&mut txn, command)?;
        if txn.state().exit_requested() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::RunResult;
    use core_state::EditorState;
    use core_text::Buffer;
    use pretty_assertions::assert_eq;

    fn model(lines: &[&str]) -> EditorModel {
        EditorModel::new(EditorState::new(Buffer::from_lines("t", lines)))
    }

    fn text(m: &EditorModel) -> Vec<String> {
        let b = m.state().active_buffer();
        b.lines(0..b.line_count())
    }

    #[test]
    fn deletes_exactly_the_selected_lines() {
        let mut m = model(&["a", "x1", "b", "x2", "c"]);
        let mut ex = Interpreter::new();
        ex.run_line(&mut m, "g/x/d");
        assert_eq!(text(&m), ["a", "b", "c"]);
        assert_eq!(m.state().tracked_locations(), 0);
    }

    #[test]
    fn inverse_selects_non_matching_lines() {
        let mut m = model(&["keep 1", "drop", "keep 2"]);
        let mut ex = Interpreter::new();
        ex.run_line(&mut m, "v/keep/d");
        assert_eq!(text(&m), ["keep 1", "keep 2"]);
    }

    #[test]
    fn whole_global_is_one_undo_step() {
        let mut m = model(&["x", "y", "x", "y"]);
        let mut ex = Interpreter::new();
        ex.run_line(&mut m, "g/x/s/x/z/");
        assert_eq!(text(&m), ["z", "y", "z", "y"]);
        ex.run_line(&mut m, "u");
        assert_eq!(text(&m), ["x", "y", "x", "y"]);
    }

    #[test]
    fn copies_shift_later_lines_without_revisiting() {
        let mut m = model(&["m", "n", "m"]);
        let mut ex = Interpreter::new();
        ex.run_line(&mut m, "g/m/t.");
        assert_eq!(text(&m), ["m", "m", "n", "m", "m"]);
    }

    #[test]
    fn no_match_and_recursion_errors() {
        let mut m = model(&["a"]);
        let mut ex = Interpreter::new();
        ex.run_line(&mut m, "g/zzz/d");
        assert_eq!(m.state().status_text(), Some("Pattern not found: zzz"));
        ex.run_line(&mut m, "g/a/g/a/d");
        assert_eq!(
            m.state().status_text(),
            Some("Cannot do :global recursively")
        );
        assert_eq!(text(&m), ["a"]);
    }

    #[test]
    fn confirm_inside_global_is_unsupported() {
        let mut m = model(&["a"]);
        let mut ex = Interpreter::new();
        let result = ex.run_line(&mut m, "g/a/s/a/b/c");
        assert!(matches!(result, RunResult::Completed));
        assert_eq!(m.state().status_text(), Some("option not supported: c"));
    }
}
