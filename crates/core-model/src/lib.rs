//! High-level editor model: `EditorState` plus the views onto it.
//!
//! A `View` owns presentation state: caret, viewport origin and closed folds.
//! Buffer content, undo, registers and marks stay in `EditorState`; views only
//! reference a buffer by index.
//!
//! Core invariants (must hold after every public call):
//! * `views` is never empty.
//! * `active < views.len()`.
//! * `views[i].buffer_index` names an existing buffer inside `EditorState`.
//! * Fold endpoints are tracked locations owned by exactly one view; they are
//!   released when the view closes or the fold is dropped.

use core_state::EditorState;
use core_text::{LocationId, Position};
use tracing::debug;

mod transaction;
pub use transaction::ModelTransaction;

/// Stable identifier for a `View`. Ids are never reused within a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    Horizontal,
    Vertical,
}

/// A closed fold; both ends follow edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fold {
    pub start: LocationId,
    pub end: LocationId,
}

#[derive(Debug, Clone)]
pub struct View {
    pub id: ViewId,
    pub buffer_index: usize,
    pub cursor: Position,
    pub viewport_first_line: usize,
    /// How this view was created from its parent (`None` for the first view).
    pub split: Option<SplitAxis>,
    pub folds: Vec<Fold>,
}

impl View {
    pub fn new(
        id: ViewId,
        buffer_index: usize,
        cursor: Position,
        viewport_first_line: usize,
    ) -> Self {
        Self {
            id,
            buffer_index,
            cursor,
            viewport_first_line,
            split: None,
            folds: Vec::new(),
        }
    }
}

/// Owns the collection of views and which one has focus.
#[derive(Debug)]
pub struct ViewManager {
    views: Vec<View>,
    active: usize,
    next_id: usize,
}

impl ViewManager {
    pub fn new_single(initial: View) -> Self {
        let next_id = initial.id.0 + 1;
        Self {
            views: vec![initial],
            active: 0,
            next_id,
        }
    }
    pub fn active_view(&self) -> &View {
        &self.views[self.active]
    }
    pub fn active_view_mut(&mut self) -> &mut View {
        &mut self.views[self.active]
    }
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Duplicate the active view (same buffer, caret and viewport) and focus
    /// the copy. Folds are not copied.
    pub fn split(&mut self, axis: SplitAxis) -> ViewId {
        let src = self.active_view();
        let mut view = View::new(
            ViewId(self.next_id),
            src.buffer_index,
            src.cursor,
            src.viewport_first_line,
        );
        view.split = Some(axis);
        self.next_id += 1;
        let id = view.id;
        self.views.insert(self.active + 1, view);
        self.active += 1;
        id
    }

    /// Remove the active view unless it is the last one.
    pub fn close_active(&mut self) -> Option<View> {
        if self.views.len() == 1 {
            return None;
        }
        let removed = self.views.remove(self.active);
        if self.active >= self.views.len() {
            self.active = self.views.len() - 1;
        }
        Some(removed)
    }

    pub fn focus(&mut self, id: ViewId) -> bool {
        match self.views.iter().position(|v| v.id == id) {
            Some(idx) => {
                self.active = idx;
                true
            }
            None => false,
        }
    }
}

pub struct EditorModel {
    state: EditorState,
    view_mgr: ViewManager,
}

impl EditorModel {
    pub fn new(state: EditorState) -> Self {
        let v = View::new(ViewId(0), state.active, Position::origin(), 0);
        Self {
            state,
            view_mgr: ViewManager::new_single(v),
        }
    }

    /// Construct with a prepared view (caret / viewport).
    pub fn with_view(mut view: View, state: EditorState) -> Self {
        view.buffer_index = state.active;
        Self {
            state,
            view_mgr: ViewManager::new_single(view),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }
    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }
    pub fn active_view(&self) -> &View {
        self.view_mgr.active_view()
    }
    pub fn active_view_mut(&mut self) -> &mut View {
        self.view_mgr.active_view_mut()
    }
    pub fn views(&self) -> &[View] {
        self.view_mgr.views()
    }

    /// Disjoint mutable borrows of the state and the active view.
    pub fn split_state_and_active_view(&mut self) -> (&mut EditorState, &mut View) {
        (&mut self.state, self.view_mgr.active_view_mut())
    }

    pub fn cursor(&self) -> Position {
        self.active_view().cursor
    }

    /// Place the caret, clamped to the active buffer.
    pub fn set_cursor(&mut self, pos: Position) {
        let (state, view) = self.split_state_and_active_view();
        let buf = state.active_buffer();
        let mut pos = pos;
        pos.clamp_to(buf.line_count(), |l| buf.line_byte_len(l));
        view.cursor = pos;
    }

    /// Clamp every view's caret after content changed underneath it.
    pub fn clamp_cursors(&mut self) {
        let buf = self.state.active_buffer();
        for view in &mut self.view_mgr.views {
            view.cursor
                .clamp_to(buf.line_count(), |l| buf.line_byte_len(l));
        }
    }

    pub fn split_view(&mut self, axis: SplitAxis) -> ViewId {
        let id = self.view_mgr.split(axis);
        debug!(target: "model.view", view = id.0, ?axis, views = self.views().len(), "split");
        id
    }

    /// Close the active view. Returns false when it is the only view.
    pub fn close_active_view(&mut self) -> bool {
        let Some(view) = self.view_mgr.close_active() else {
            return false;
        };
        for fold in &view.folds {
            self.state.release_location(fold.start);
            self.state.release_location(fold.end);
        }
        debug!(target: "model.view", view = view.id.0, views = self.views().len(), "close");
        true
    }

    pub fn focus_view(&mut self, id: ViewId) -> bool {
        self.view_mgr.focus(id)
    }

    /// Record a closed fold over `start..=end` (0-based lines) on the active view.
    pub fn add_fold(&mut self, start: usize, end: usize) {
        let (state, view) = self.split_state_and_active_view();
        let fold = Fold {
            start: state.track_location(Position::new(start, 0)),
            end: state.track_location(Position::new(end, 0)),
        };
        view.folds.push(fold);
    }

    /// Current line span of each fold of the active view; folds whose
    /// endpoints were deleted are dropped and their handles released.
    pub fn fold_ranges(&mut self) -> Vec<(usize, usize)> {
        let (state, view) = self.split_state_and_active_view();
        let mut out = Vec::new();
        view.folds.retain(|f| {
            match (state.resolve_location(f.start), state.resolve_location(f.end)) {
                (Some(a), Some(b)) => {
                    out.push((a.line, b.line));
                    true
                }
                _ => {
                    state.release_location(f.start);
                    state.release_location(f.end);
                    false
                }
            }
        });
        out
    }
}
