//! Stable location handles that survive buffer edits.
//!
//! A `LocationTracker` hands out `LocationId`s for positions in the current
//! snapshot. Every splice reports a `LineDelta`; applying it re-anchors each
//! tracked position:
//!
//! * lines before `start` are untouched;
//! * lines at or after `start + removed` shift by `inserted - removed`;
//! * a line inside the replaced block survives (same line index) when the
//!   replacement still covers its offset, otherwise it is invalidated.
//!
//! Invalidated ids keep their slot until released so `resolve` can tell the
//! caller "this line is gone" instead of handing back a stale number. Holders
//! must `release` ids when done; `live` reports how many slots remain.

use crate::Position;
use std::collections::BTreeMap;
use tracing::trace;

/// Description of a single line splice: `removed` lines starting at `start`
/// were replaced by `inserted` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDelta {
    pub start: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl LineDelta {
    /// Delta for a wholesale content swap (undo/redo, reload).
    pub fn whole(old_count: usize, new_count: usize) -> Self {
        Self {
            start: 0,
            removed: old_count,
            inserted: new_count,
        }
    }

    /// Map a line index from the pre-edit snapshot into the post-edit one.
    pub fn map_line(&self, line: usize) -> Option<usize> {
        if line < self.start {
            return Some(line);
        }
        let end = self.start + self.removed;
        if line >= end {
            return Some(line + self.inserted - self.removed);
        }
        if line - self.start < self.inserted {
            Some(line)
        } else {
            None
        }
    }

    pub fn is_noop(&self) -> bool {
        self.removed == 0 && self.inserted == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationId(u64);

#[derive(Debug, Default)]
pub struct LocationTracker {
    next: u64,
    slots: BTreeMap<LocationId, Option<Position>>,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, pos: Position) -> LocationId {
        let id = LocationId(self.next);
        self.next += 1;
        self.slots.insert(id, Some(pos));
        trace!(target: "state.track", id = id.0, line = pos.line, byte = pos.byte, "track");
        id
    }

    /// Current position of a tracked location; `None` once its line was deleted
    /// (or the id was released).
    pub fn resolve(&self, id: LocationId) -> Option<Position> {
        self.slots.get(&id).copied().flatten()
    }

    /// Forget a location. Returns false for unknown (already released) ids.
    pub fn release(&mut self, id: LocationId) -> bool {
        let known = self.slots.remove(&id).is_some();
        trace!(target: "state.track", id = id.0, known, "release");
        known
    }

    /// Re-anchor every live location after an edit. `line_len` reports byte
    /// lengths in the post-edit snapshot and is used to clamp columns.
    pub fn apply<F>(&mut self, delta: &LineDelta, mut line_len: F)
    where
        F: FnMut(usize) -> usize,
    {
        if delta.is_noop() {
            return;
        }
        for slot in self.slots.values_mut() {
            if let Some(pos) = slot {
                match delta.map_line(pos.line) {
                    Some(line) => {
                        pos.line = line;
                        pos.byte = pos.byte.min(line_len(line));
                    }
                    None => *slot = None,
                }
            }
        }
    }

    /// Number of ids not yet released (valid or invalidated).
    pub fn live(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(start: usize, removed: usize, inserted: usize) -> LineDelta {
        LineDelta {
            start,
            removed,
            inserted,
        }
    }

    #[test]
    fn insert_above_shifts_down() {
        let mut t = LocationTracker::new();
        let id = t.track(Position::new(4, 2));
        t.apply(&delta(1, 0, 3), |_| 80);
        assert_eq!(t.resolve(id), Some(Position::new(7, 2)));
    }

    #[test]
    fn delete_spanning_invalidates() {
        let mut t = LocationTracker::new();
        let gone = t.track(Position::new(2, 0));
        let below = t.track(Position::new(5, 0));
        let above = t.track(Position::new(0, 0));
        t.apply(&delta(1, 3, 0), |_| 80);
        assert_eq!(t.resolve(gone), None);
        assert_eq!(t.resolve(below), Some(Position::new(2, 0)));
        assert_eq!(t.resolve(above), Some(Position::new(0, 0)));
    }

    #[test]
    fn rewrite_in_place_keeps_line_and_clamps_column() {
        let mut t = LocationTracker::new();
        let id = t.track(Position::new(3, 10));
        t.apply(&delta(3, 1, 1), |_| 4);
        assert_eq!(t.resolve(id), Some(Position::new(3, 4)));
    }

    #[test]
    fn shrinking_block_drops_tail_lines() {
        let mut t = LocationTracker::new();
        let head = t.track(Position::new(1, 0));
        let tail = t.track(Position::new(2, 0));
        // join: lines 1..3 become one line
        t.apply(&delta(1, 2, 1), |_| 10);
        assert_eq!(t.resolve(head), Some(Position::new(1, 0)));
        assert_eq!(t.resolve(tail), None);
    }

    #[test]
    fn release_frees_slot() {
        let mut t = LocationTracker::new();
        let id = t.track(Position::origin());
        assert_eq!(t.live(), 1);
        assert!(t.release(id));
        assert!(!t.release(id));
        assert_eq!(t.live(), 0);
        assert_eq!(t.resolve(id), None);
    }

    #[test]
    fn map_line_whole_swap() {
        let d = LineDelta::whole(5, 2);
        assert_eq!(d.map_line(1), Some(1));
        assert_eq!(d.map_line(3), None);
    }
}
