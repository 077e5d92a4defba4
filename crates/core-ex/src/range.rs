//! Range resolution: `LineRangeSpec` + caret + default rule -> `LineRange`.
//!
//! A `;` separator moves the caret to the left address before the right one
//! is resolved; that caret move is kept even if the rest of the command fails.

use crate::address::resolve_address;
use crate::command::{DefaultRange, LineRange, LineRangeSpec};
use crate::error::ExError;
use core_model::EditorModel;
use core_text::Position;
use tracing::trace;

pub fn resolve_range(
    model: &mut EditorModel,
    spec: &LineRangeSpec,
    default: DefaultRange,
) -> Result<LineRange, ExError> {
    let caret = model.cursor().line;
    let count = model.state().line_count();
    let range = match spec {
        LineRangeSpec::None => match default {
            DefaultRange::NoDefault => return Err(ExError::InvalidRange),
            // A zero-line buffer has no current line.
            DefaultRange::CurrentLine if count == 0 => return Err(ExError::InvalidRange),
            DefaultRange::CurrentLine => LineRange::single(caret),
            DefaultRange::EntireBuffer if count == 0 => return Err(ExError::InvalidRange),
            DefaultRange::EntireBuffer => LineRange::new(0, count - 1),
        },
        LineRangeSpec::Entire if count == 0 => return Err(ExError::InvalidRange),
        LineRangeSpec::Entire => LineRange::new(0, count - 1),
        LineRangeSpec::Single(a) => LineRange::single(resolve_address(model.state(), a, caret)?),
        LineRangeSpec::Pair {
            left,
            right,
            move_caret_first,
        } => {
            let l = resolve_address(model.state(), left, caret)?;
            let context = if *move_caret_first {
                model.set_cursor(Position::new(l, 0));
                l
            } else {
                caret
            };
            let r = resolve_address(model.state(), right, context)?;
            if l > r {
                return Err(ExError::InvalidRange);
            }
            LineRange::new(l, r)
        }
        LineRangeSpec::WithCount { range, count: n } => {
            let inner = resolve_range(model, range, default)?;
            span_from(inner.end, *n, count)?
        }
        LineRangeSpec::Join { range, count: n } => match (range.as_ref(), n) {
            (LineRangeSpec::None, n) => {
                let span = match n.map(|c| c.max(1)) {
                    None | Some(1) => 2,
                    Some(c) => c,
                };
                span_from(caret, span, count)?
            }
            (inner, Some(n)) => resolve_range(
                model,
                &LineRangeSpec::WithCount {
                    range: Box::new(inner.clone()),
                    count: *n,
                },
                default,
            )?,
            (inner, None) => resolve_range(model, inner, default)?,
        },
    };
    trace!(target: "ex.range", ?spec, start = range.start, end = range.end, "resolved");
    Ok(range)
}

/// `n` lines starting at `start` (at least one), cut off at the buffer end.
fn span_from(start: usize, n: i64, line_count: usize) -> Result<LineRange, ExError> {
    if line_count == 0 || start >= line_count {
        return Err(ExError::InvalidRange);
    }
    let n = usize::try_from(n.max(1)).unwrap_or(1);
    let end = start.saturating_add(n - 1).min(line_count - 1);
    Ok(LineRange::new(start, end))
}
