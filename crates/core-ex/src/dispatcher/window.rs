//! Split views, close, folds.

use super::files;
use crate::command::{DefaultRange, LineRangeSpec};
use crate::error::ExError;
use crate::range::resolve_range;
use core_model::{EditorModel, SplitAxis};

pub(super) fn fold(model: &mut EditorModel, range: &LineRangeSpec) -> Result<(), ExError> {
    let r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    model.add_fold(r.start, r.end);
    Ok(())
}

pub(super) fn split(model: &mut EditorModel, vertical: bool, file: Option<&str>) -> Result<(), ExError> {
    if let Some(file) = file {
        return Err(ExError::Unsupported(file.to_string()));
    }
    let axis = if vertical {
        SplitAxis::Vertical
    } else {
        SplitAxis::Horizontal
    };
    model.split_view(axis);
    Ok(())
}

/// Close the active view; the last view closes like `:quit`.
pub(super) fn close(model: &mut EditorModel, force: bool) -> Result<(), ExError> {
    if model.views().len() == 1 {
        return files::quit(model, force, false);
    }
    model.close_active_view();
    Ok(())
}
