//! Snapshot undo engine with nested / linked transaction groups.
//!
//! Each undo step is a full `Buffer` snapshot (cheap: the rope is shared).
//! Groups bound what counts as one step:
//! * `begin_group` / `end_group` nest; only the outermost pair is visible as
//!   a step, and the snapshot is captured lazily at the first edit so a group
//!   without edits leaves no empty step behind.
//! * A *linked* group merges its edits into the previous step instead of
//!   pushing a new one (used to continue an interrupted operation).
//! * Edits outside any group are discrete steps.

use core_text::{Buffer, Position};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Maximum number of snapshots retained in undo history.
pub const UNDO_HISTORY_MAX: usize = 200;

/// A full-state snapshot for undo/redo.
#[derive(Clone)]
pub struct EditSnapshot {
    pub buffer: Buffer,
    pub position: Position,
    /// Content hash of the buffer at snapshot capture.
    pub hash: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Idle,
    Open {
        depth: usize,
        cursor: Position,
        captured: bool,
        linked: bool,
    },
}

pub struct UndoEngine {
    undo_stack: Vec<EditSnapshot>,
    redo_stack: Vec<EditSnapshot>,
    group: Group,
    /// Count of snapshots skipped due to identical successive state.
    undo_snapshots_skipped: AtomicU64,
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoEngine {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            group: Group::Idle,
            undo_snapshots_skipped: AtomicU64::new(0),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn snapshots_skipped(&self) -> u64 {
        self.undo_snapshots_skipped.load(Ordering::Relaxed)
    }
    pub fn group_depth(&self) -> usize {
        match self.group {
            Group::Idle => 0,
            Group::Open { depth, .. } => depth,
        }
    }

    pub fn push_snapshot(&mut self, cursor: Position, buffer: &Buffer) {
        let current_hash = buffer_hash(buffer);
        if let Some(last) = self.undo_stack.last()
            && last.hash == current_hash
        {
            self.undo_snapshots_skipped.fetch_add(1, Ordering::Relaxed);
            self.redo_stack.clear();
            trace!(target: "state.undo", undo_depth = self.undo_stack.len(), hash = current_hash, "snapshot_dedupe_skip");
            return;
        }
        self.undo_stack.push(EditSnapshot {
            buffer: buffer.clone(),
            position: cursor,
            hash: current_hash,
        });
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), lines = buffer.line_count(), hash = current_hash, "push_snapshot");
        if self.undo_stack.len() > UNDO_HISTORY_MAX {
            let _ = self.undo_stack.remove(0);
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
        self.redo_stack.clear();
    }

    /// Open (or nest into) a transaction group.
    pub fn begin_group(&mut self, cursor: Position, linked: bool) {
        self.group = match self.group {
            Group::Idle => Group::Open {
                depth: 1,
                cursor,
                captured: false,
                linked,
            },
            Group::Open {
                depth,
                cursor,
                captured,
                linked,
            } => Group::Open {
                depth: depth + 1,
                cursor,
                captured,
                linked,
            },
        };
        trace!(target: "state.undo", depth = self.group_depth(), linked, "group_begin");
    }

    /// Close one nesting level. Returns true when the outermost group closed.
    pub fn end_group(&mut self) -> bool {
        let (next, outermost) = match self.group {
            Group::Idle => (Group::Idle, false),
            Group::Open { depth: 1, .. } => (Group::Idle, true),
            Group::Open {
                depth,
                cursor,
                captured,
                linked,
            } => (
                Group::Open {
                    depth: depth - 1,
                    cursor,
                    captured,
                    linked,
                },
                false,
            ),
        };
        self.group = next;
        trace!(target: "state.undo", depth = self.group_depth(), outermost, "group_end");
        outermost
    }

    /// Must be called before every buffer mutation with the pre-edit snapshot.
    pub fn before_edit(&mut self, buffer: &Buffer, fallback_cursor: Position) {
        match self.group {
            Group::Idle => self.push_snapshot(fallback_cursor, buffer),
            Group::Open { captured: true, .. } => {}
            Group::Open {
                depth,
                cursor,
                captured: false,
                linked,
            } => {
                if linked && !self.undo_stack.is_empty() {
                    self.redo_stack.clear();
                    trace!(target: "state.undo", undo_depth = self.undo_stack.len(), "linked_group_merge");
                } else {
                    self.push_snapshot(cursor, buffer);
                }
                self.group = Group::Open {
                    depth,
                    cursor,
                    captured: true,
                    linked,
                };
            }
        }
    }

    pub fn undo(&mut self, cursor: &mut Position, buffer: &mut Buffer) -> bool {
        let Some(last) = self.undo_stack.pop() else {
            return false;
        };
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        self.redo_stack.push(EditSnapshot {
            buffer: buffer.clone(),
            position: *cursor,
            hash: buffer_hash(buffer),
        });
        *buffer = last.buffer;
        *cursor = last.position;
        true
    }

    pub fn redo(&mut self, cursor: &mut Position, buffer: &mut Buffer) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        trace!(target: "state.undo", redo_depth = self.redo_stack.len(), undo_depth = self.undo_stack.len(), "redo_pop");
        self.undo_stack.push(EditSnapshot {
            buffer: buffer.clone(),
            position: *cursor,
            hash: buffer_hash(buffer),
        });
        *buffer = next.buffer;
        *cursor = next.position;
        true
    }
}

fn buffer_hash(buf: &Buffer) -> u64 {
    let mut h = DefaultHasher::new();
    h.write(buf.text().as_bytes());
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(engine: &mut UndoEngine, buffer: &mut Buffer, line: usize, text: &str) {
        engine.before_edit(buffer, Position::new(line, 0));
        buffer.set_line(line, text);
    }

    #[test]
    fn discrete_edits_are_separate_steps() {
        let mut e = UndoEngine::new();
        let mut b = Buffer::from_lines("t", ["a", "b"]);
        edit(&mut e, &mut b, 0, "A");
        edit(&mut e, &mut b, 1, "B");
        assert_eq!(e.undo_depth(), 2);
        let mut cur = Position::origin();
        assert!(e.undo(&mut cur, &mut b));
        assert_eq!(b.lines(0..2), vec!["A", "b"]);
        assert_eq!(e.redo_depth(), 1);
    }

    #[test]
    fn nested_group_is_one_step() {
        let mut e = UndoEngine::new();
        let mut b = Buffer::from_lines("t", ["a", "b", "c"]);
        e.begin_group(Position::new(2, 0), false);
        e.begin_group(Position::origin(), false);
        edit(&mut e, &mut b, 0, "A");
        assert!(!e.end_group());
        edit(&mut e, &mut b, 1, "B");
        assert!(e.end_group());
        assert_eq!(e.undo_depth(), 1);
        let mut cur = Position::origin();
        e.undo(&mut cur, &mut b);
        assert_eq!(b.lines(0..3), vec!["a", "b", "c"]);
        assert_eq!(cur, Position::new(2, 0));
    }

    #[test]
    fn empty_group_leaves_no_step() {
        let mut e = UndoEngine::new();
        e.begin_group(Position::origin(), false);
        assert!(e.end_group());
        assert_eq!(e.undo_depth(), 0);
    }

    #[test]
    fn linked_group_merges_into_previous_step() {
        let mut e = UndoEngine::new();
        let mut b = Buffer::from_lines("t", ["a", "b"]);
        e.begin_group(Position::origin(), false);
        edit(&mut e, &mut b, 0, "A");
        e.end_group();
        e.begin_group(Position::origin(), true);
        edit(&mut e, &mut b, 1, "B");
        e.end_group();
        assert_eq!(e.undo_depth(), 1);
        let mut cur = Position::origin();
        e.undo(&mut cur, &mut b);
        assert_eq!(b.lines(0..2), vec!["a", "b"]);
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut e = UndoEngine::new();
        let mut b = Buffer::from_lines("t", ["a"]);
        edit(&mut e, &mut b, 0, "x");
        let mut cur = Position::origin();
        e.undo(&mut cur, &mut b);
        assert_eq!(e.redo_depth(), 1);
        edit(&mut e, &mut b, 0, "y");
        assert_eq!(e.redo_depth(), 0);
    }

    #[test]
    fn undo_stack_capped() {
        let mut e = UndoEngine::new();
        let mut b = Buffer::from_lines("t", ["0"]);
        for i in 0..(UNDO_HISTORY_MAX + 5) {
            edit(&mut e, &mut b, 0, &format!("v{i}"));
        }
        assert_eq!(e.undo_depth(), UNDO_HISTORY_MAX);
    }
}
