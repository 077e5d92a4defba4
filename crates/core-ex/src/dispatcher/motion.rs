//! Caret movement: `:N` and `:/pattern`.

use super::place_caret;
use crate::command::{DefaultRange, LineAddress, LineRangeSpec};
use crate::error::ExError;
use crate::range::resolve_range;
use crate::search::{compile, search_line};
use core_model::EditorModel;
use core_state::{SearchDirection, SubstituteFlags};
use core_text::Position;
use tracing::trace;

/// Remember where the caret was before a jump (`''`).
fn remember_context(model: &mut EditorModel) -> Result<(), ExError> {
    let here = Position::new(model.cursor().line, 0);
    Ok(model.state_mut().set_mark('\'', here)?)
}

pub(super) fn jump(model: &mut EditorModel, range: &LineRangeSpec) -> Result<(), ExError> {
    let count = model.state().line_count();
    if count == 0 {
        model.set_cursor(Position::origin());
        return Ok(());
    }
    let line = match range {
        // Plain numbers past either end stop at the first / last line.
        LineRangeSpec::Single(LineAddress::Number(n)) => n.saturating_sub(1).min(count - 1),
        other => resolve_range(model, other, DefaultRange::CurrentLine)?.end,
    };
    remember_context(model)?;
    place_caret(model, line);
    trace!(target: "ex.dispatch", line, "jump");
    Ok(())
}

pub(super) fn search(model: &mut EditorModel, pattern: &str, backward: bool) -> Result<(), ExError> {
    let state = model.state();
    let pattern = if pattern.is_empty() {
        state
            .session
            .last_search_pattern()
            .ok_or(ExError::NoPreviousPattern)?
            .to_string()
    } else {
        pattern.to_string()
    };
    let regex = compile(&pattern, &state.options, SubstituteFlags::empty())?;
    let direction = if backward {
        SearchDirection::Backward
    } else {
        SearchDirection::Forward
    };
    let wrap = state.options.toggle("wrapscan");
    let found = search_line(
        state.active_buffer(),
        &regex,
        model.cursor().line,
        direction,
        wrap,
    );
    model
        .state_mut()
        .session
        .record_search(&pattern, direction);
    let line = found.ok_or_else(|| ExError::PatternNotFound(pattern.clone()))?;
    remember_context(model)?;
    place_caret(model, line);
    trace!(target: "ex.dispatch", %pattern, line, "search");
    Ok(())
}
