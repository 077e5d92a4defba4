//! Line address resolution against the current buffer.

use crate::command::LineAddress;
use crate::error::ExError;
use core_state::EditorState;
use tracing::trace;

/// Resolve `address` to a 0-based line. `context` is the line `.` refers to.
pub fn resolve_address(
    state: &EditorState,
    address: &LineAddress,
    context: usize,
) -> Result<usize, ExError> {
    let count = state.line_count();
    if count == 0 {
        return Err(ExError::InvalidAddress);
    }
    let line = match address {
        LineAddress::Current if context < count => context,
        LineAddress::Current => return Err(ExError::InvalidAddress),
        LineAddress::Last => count - 1,
        LineAddress::Number(n) if (1..=count).contains(n) => n - 1,
        LineAddress::Number(_) => return Err(ExError::InvalidAddress),
        LineAddress::Mark(name) => state.mark(*name).ok_or(ExError::InvalidAddress)?.line,
        LineAddress::NextMatch(p) => return Err(ExError::Unsupported(format!("/{p}/"))),
        LineAddress::PrevMatch(p) => return Err(ExError::Unsupported(format!("?{p}?"))),
        LineAddress::Offset(base, k) => {
            let base = resolve_address(state, base, context)?;
            let target = i64::try_from(base + 1)
                .ok()
                .and_then(|b| b.checked_add(*k))
                .filter(|t| *t >= 1)
                .ok_or(ExError::InvalidAddress)?;
            let n = usize::try_from(target).map_err(|_| ExError::InvalidAddress)?;
            resolve_address(state, &LineAddress::Number(n), context)?
        }
    };
    trace!(target: "ex.range", ?address, line, "address");
    Ok(line)
}

/// Index at which lines go when inserted "after" `address`. Line 0 is the
/// only address that may precede the first line.
pub fn resolve_insertion_point(
    state: &EditorState,
    address: &LineAddress,
    context: usize,
) -> Result<usize, ExError> {
    match address {
        LineAddress::Number(0) => Ok(0),
        other => Ok(resolve_address(state, other, context)? + 1),
    }
}
