//! Undo / redo dispatch into the snapshot engine owned by `EditorState`.

use core_model::EditorModel;
use tracing::trace;

pub(super) fn undo(model: &mut EditorModel) {
    let (state, view) = model.split_state_and_active_view();
    let before = state.line_count();
    if state.undo(&mut view.cursor) {
        trace!(target: "ex.dispatch", op = "undo", lines_before = before, lines_after = state.line_count(), "undo");
    } else {
        state.set_info("Already at oldest change");
    }
    model.clamp_cursors();
}

pub(super) fn redo(model: &mut EditorModel) {
    let (state, view) = model.split_state_and_active_view();
    let before = state.line_count();
    if state.redo(&mut view.cursor) {
        trace!(target: "ex.dispatch", op = "redo", lines_before = before, lines_after = state.line_count(), "redo");
    } else {
        state.set_info("Already at newest change");
    }
    model.clamp_cursors();
}
