//! RAII undo boundary over an `EditorModel`.
//!
//! `ModelTransaction` opens a (possibly linked) undo transaction on creation
//! and commits it on drop, including during unwinding. Locations tracked
//! through the guard are released on drop as well, so multi-step operations
//! cannot leak tracker slots on an early return.

use crate::EditorModel;
use core_text::{LocationId, Position};
use std::ops::{Deref, DerefMut};
use tracing::trace;

pub struct ModelTransaction<'m> {
    model: &'m mut EditorModel,
    label: &'static str,
    held: Vec<LocationId>,
}

impl<'m> ModelTransaction<'m> {
    pub fn begin(model: &'m mut EditorModel, label: &'static str) -> Self {
        let cursor = model.cursor();
        model.state.begin_transaction(cursor);
        trace!(target: "state.undo", label, depth = model.state.transaction_depth(), "txn_begin");
        Self {
            model,
            label,
            held: Vec::new(),
        }
    }

    /// Open a transaction that merges into the previous undo step.
    pub fn begin_linked(model: &'m mut EditorModel, label: &'static str) -> Self {
        let cursor = model.cursor();
        model.state.begin_linked_transaction(cursor);
        trace!(target: "state.undo", label, depth = model.state.transaction_depth(), "txn_begin_linked");
        Self {
            model,
            label,
            held: Vec::new(),
        }
    }

    /// Track a position for the lifetime of the guard.
    pub fn track(&mut self, pos: Position) -> LocationId {
        let id = self.model.state.track_location(pos);
        self.held.push(id);
        id
    }

    pub fn resolve(&self, id: LocationId) -> Option<Position> {
        self.model.state.resolve_location(id)
    }
}

impl Deref for ModelTransaction<'_> {
    type Target = EditorModel;

    fn deref(&self) -> &EditorModel {
        self.model
    }
}

impl DerefMut for ModelTransaction<'_> {
    fn deref_mut(&mut self) -> &mut EditorModel {
        self.model
    }
}

impl Drop for ModelTransaction<'_> {
    fn drop(&mut self) {
        let state = &mut self.model.state;
        for id in self.held.drain(..) {
            state.release_location(id);
        }
        let outermost = state.commit_transaction();
        trace!(target: "state.undo", label = self.label, outermost, "txn_commit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::EditorState;
    use core_text::Buffer;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn model(lines: &[&str]) -> EditorModel {
        EditorModel::new(EditorState::new(Buffer::from_lines("t", lines)))
    }

    #[test]
    fn drop_commits_and_releases() {
        let mut m = model(&["a", "b"]);
        {
            let mut txn = ModelTransaction::begin(&mut m, "test");
            let id = txn.track(Position::new(1, 0));
            txn.state_mut().set_line(0, "A");
            txn.state_mut().set_line(1, "B");
            assert_eq!(txn.resolve(id), Some(Position::new(1, 0)));
            assert_eq!(txn.state().transaction_depth(), 1);
        }
        assert_eq!(m.state().transaction_depth(), 0);
        assert_eq!(m.state().tracked_locations(), 0);
        assert_eq!(m.state().undo_depth(), 1);
    }

    #[test]
    fn nested_guards_form_one_step() {
        let mut m = model(&["a"]);
        {
            let mut outer = ModelTransaction::begin(&mut m, "outer");
            outer.state_mut().set_line(0, "b");
            {
                let mut inner = ModelTransaction::begin(&mut outer, "inner");
                inner.state_mut().set_line(0, "c");
            }
            outer.state_mut().set_line(0, "d");
        }
        assert_eq!(m.state().undo_depth(), 1);
    }

    #[test]
    fn unwinding_still_closes_transaction() {
        let mut m = model(&["a"]);
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut txn = ModelTransaction::begin(&mut m, "panics");
            txn.track(Position::origin());
            txn.state_mut().set_line(0, "x");
            panic!("sub-command failed");
        }));
        assert!(result.is_err());
        assert_eq!(m.state().transaction_depth(), 0);
        assert_eq!(m.state().tracked_locations(), 0);
    }
}
