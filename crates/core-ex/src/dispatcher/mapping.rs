//! `:map`, `:unmap` and `:mapclear` with their `!` and mode-prefixed forms.

use crate::error::ExError;
use core_keymap::{MapEntry, MapModes};
use core_state::EditorState;

fn row(entry: &MapEntry) -> String {
    let marker = if entry.noremap { '*' } else { ' ' };
    format!(
        "{:<3}{:<12} {marker}{}",
        entry.modes.label(),
        entry.lhs,
        entry.rhs
    )
}

/// `:map` lists, `:map lhs` lists matching, `:map lhs rhs` defines.
pub(super) fn map(
    state: &mut EditorState,
    modes: MapModes,
    lhs: Option<&str>,
    rhs: Option<&str>,
    noremap: bool,
) -> Result<(), ExError> {
    if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
        state.keymaps.map(modes, lhs, rhs, noremap)?;
        return Ok(());
    }
    let entries = state.keymaps.entries(modes, lhs);
    if entries.is_empty() {
        state.set_info("No mapping found");
    }
    for entry in &entries {
        state.push_panel_line(row(entry));
    }
    Ok(())
}

pub(super) fn unmap(state: &mut EditorState, modes: MapModes, lhs: &str) -> Result<(), ExError> {
    state.keymaps.unmap(modes, lhs)?;
    Ok(())
}

pub(super) fn clear(state: &mut EditorState, modes: MapModes) {
    state.keymaps.clear(modes);
}
