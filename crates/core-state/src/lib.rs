//! Editor state: active buffer, file metadata, undo engine, registers, marks,
//! options, key mappings, session memory and status reporting.
//!
//! Every content mutation goes through `EditorState::splice_lines` (or
//! `set_line`, a one-line splice). That single path:
//! * hands the pre-edit snapshot to the undo engine (which decides whether it
//!   starts a new step or belongs to an open transaction);
//! * re-anchors tracked locations and marks with the returned `LineDelta`;
//! * updates the `[` / `]` change marks and the dirty flag.
//!
//! Undo/redo swap whole snapshots, so they re-anchor with `LineDelta::whole`.
//!
//! Dirty tracking compares the active buffer version with the version saved
//! by `mark_clean`; undoing back to the written snapshot makes the buffer
//! clean again.
//!
//! Status reporting has two channels: a single-line message (info or error) and a multi-line panel for list-style output (`:reg`, `:marks`,
//! `:map`, `:print`).

use core_keymap::KeyMapTable;
use core_text::{Buffer, Encoding, LineDelta, LocationId, LocationTracker, Position};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub mod marks;
pub mod options;
pub mod registers;
pub mod session;
pub mod undo;

pub use marks::{MarkEntry, MarkError, MarkTable};
pub use options::{OptionDescriptor, OptionError, OptionKind, OptionValue, Options};
pub use registers::{RegisterError, RegisterKind, RegisterValue, Registers};
pub use session::{
    LastSearch, SearchDirection, SessionState, SubstituteFlags, SubstituteMemory, Value,
};
use undo::UndoEngine;
pub use undo::UNDO_HISTORY_MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

/// Line ending style detected from source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Result of normalizing line endings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// LF-only content.
    pub normalized: String,
    pub original: LineEnding,
    pub had_trailing_newline: bool,
    /// More than one ending style was present.
    pub mixed: bool,
}

/// Rewrite CRLF and lone CR to LF, reporting the dominant style.
/// Ties prefer CRLF, then LF, then CR.
pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    let mut normalized = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.find(|c: char| c == '\r' || c == '\n') {
        normalized.push_str(&rest[..at]);
        normalized.push('\n');
        let tail = &rest[at..];
        let step = if tail.starts_with("\r\n") {
            crlf += 1;
            2
        } else if tail.starts_with('\r') {
            cr += 1;
            1
        } else {
            lf += 1;
            1
        };
        rest = &tail[step..];
    }
    normalized.push_str(rest);

    let ranked = [
        (LineEnding::Crlf, crlf),
        (LineEnding::Lf, lf),
        (LineEnding::Cr, cr),
    ];
    let original = ranked
        .iter()
        .fold((LineEnding::Lf, 0), |best, &(style, n)| {
            if n > best.1 { (style, n) } else { best }
        })
        .0;
    NormalizedText {
        had_trailing_newline: input.ends_with(['\n', '\r']),
        mixed: ranked.iter().filter(|(_, n)| *n > 0).count() > 1,
        normalized,
        original,
    }
}

/// Top-level editor state container.
pub struct EditorState {
    pub buffers: Vec<Buffer>,
    pub active: usize,
    pub file_name: Option<PathBuf>,
    pub dirty: bool,
    undo: UndoEngine,
    tracker: LocationTracker,
    pub registers: Registers,
    pub marks: MarkTable,
    pub options: Options,
    pub keymaps: KeyMapTable,
    pub session: SessionState,
    status: Option<StatusMessage>,
    status_panel: Vec<String>,
    pub original_line_ending: LineEnding,
    pub had_trailing_newline: bool,
    pub encoding: Encoding,
    clean_version: Option<u64>,
    exit_requested: bool,
}

impl EditorState {
    /// Create a new state with a single active buffer, considered clean.
    pub fn new(buffer: Buffer) -> Self {
        let clean_version = Some(buffer.version());
        Self {
            buffers: vec![buffer],
            active: 0,
            file_name: None,
            dirty: false,
            undo: UndoEngine::new(),
            tracker: LocationTracker::new(),
            registers: Registers::new(),
            marks: MarkTable::new(),
            options: Options::new(),
            keymaps: KeyMapTable::new(),
            session: SessionState::new(),
            status: None,
            status_panel: Vec::new(),
            original_line_ending: LineEnding::Lf,
            had_trailing_newline: true,
            encoding: Encoding::Utf8,
            clean_version,
            exit_requested: false,
        }
    }

    pub fn active_buffer(&self) -> &Buffer {
        &self.buffers[self.active]
    }

    /// Cheap structural copy of the current content.
    pub fn snapshot(&self) -> Buffer {
        self.active_buffer().clone()
    }

    pub fn line_count(&self) -> usize {
        self.active_buffer().line_count()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Replace `removed` lines at `start` with `lines`.
    pub fn splice_lines<S: AsRef<str>>(
        &mut self,
        start: usize,
        removed: usize,
        lines: &[S],
    ) -> LineDelta {
        let active = self.active;
        self.undo
            .before_edit(&self.buffers[active], Position::new(start, 0));
        let delta = self.buffers[active].splice_lines(start, removed, lines);
        self.after_edit(&delta);
        if self.line_count() > 0 {
            let last = (delta.start + delta.inserted.max(1) - 1).min(self.line_count() - 1);
            let first = delta.start.min(last);
            self.marks.set_special('[', Position::new(first, 0));
            self.marks.set_special(']', Position::new(last, 0));
        }
        delta
    }

    pub fn set_line(&mut self, idx: usize, text: &str) -> LineDelta {
        self.splice_lines(idx, 1, &[text])
    }

    fn after_edit(&mut self, delta: &LineDelta) {
        let buffer = &self.buffers[self.active];
        self.tracker.apply(delta, |l| buffer.line_byte_len(l));
        self.marks
            .apply(delta, self.file_name.as_deref(), |l| buffer.line_byte_len(l));
        self.dirty = Some(buffer.version()) != self.clean_version;
    }

    /// Open (or nest into) an undo transaction.
    pub fn begin_transaction(&mut self, cursor: Position) {
        self.undo.begin_group(cursor, false);
    }

    /// Open a transaction whose edits merge into the previous undo step.
    pub fn begin_linked_transaction(&mut self, cursor: Position) {
        self.undo.begin_group(cursor, true);
    }

    /// Close one level; true when the outermost transaction committed.
    pub fn commit_transaction(&mut self) -> bool {
        self.undo.end_group()
    }

    pub fn transaction_depth(&self) -> usize {
        self.undo.group_depth()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }

    pub fn undo(&mut self, cursor: &mut Position) -> bool {
        let before = self.line_count();
        let active = self.active;
        if !self.undo.undo(cursor, &mut self.buffers[active]) {
            return false;
        }
        let delta = LineDelta::whole(before, self.line_count());
        self.after_edit(&delta);
        true
    }

    pub fn redo(&mut self, cursor: &mut Position) -> bool {
        let before = self.line_count();
        let active = self.active;
        if !self.undo.redo(cursor, &mut self.buffers[active]) {
            return false;
        }
        let delta = LineDelta::whole(before, self.line_count());
        self.after_edit(&delta);
        true
    }

    pub fn track_location(&mut self, pos: Position) -> LocationId {
        self.tracker.track(pos)
    }

    pub fn resolve_location(&self, id: LocationId) -> Option<Position> {
        self.tracker.resolve(id)
    }

    pub fn release_location(&mut self, id: LocationId) -> bool {
        self.tracker.release(id)
    }

    /// Tracked ids not yet released.
    pub fn tracked_locations(&self) -> usize {
        self.tracker.live()
    }

    /// Load new content in place of the active buffer (`:e`). Tracked
    /// locations into the old content are invalidated, local marks dropped and
    /// undo history reset.
    pub fn replace_buffer(&mut self, buffer: Buffer, file_name: Option<PathBuf>) {
        let old = self.line_count();
        self.tracker.apply(&LineDelta::whole(old, 0), |_| 0);
        self.marks.clear_local();
        self.undo = UndoEngine::new();
        self.buffers[self.active] = buffer;
        self.file_name = file_name;
        debug!(target: "state", lines = self.line_count(), file = ?self.file_name, "replace_buffer");
        self.mark_clean();
    }

    /// Record the current content as the written state.
    pub fn mark_clean(&mut self) {
        self.clean_version = Some(self.active_buffer().version());
        self.dirty = false;
    }

    pub fn set_mark(&mut self, name: char, pos: Position) -> Result<(), MarkError> {
        self.marks.set(name, pos, self.file_name.as_deref())
    }

    /// Mark position, if set and still inside the buffer.
    pub fn mark(&self, name: char) -> Option<Position> {
        self.marks
            .get(name, self.file_name.as_deref())
            .filter(|p| p.line < self.line_count())
    }

    /// Register lookup including the read-only `/` and `:` registers.
    pub fn read_register(&self, name: char) -> Option<RegisterValue> {
        let from_session = |s: Option<&str>| s.map(RegisterValue::characterwise);
        match name {
            '/' => from_session(self.session.last_search_pattern()),
            ':' => from_session(self.session.last_command_line.as_deref()),
            _ => self.registers.get(name).cloned(),
        }
    }

    pub fn set_info<S: Into<String>>(&mut self, msg: S) {
        self.set_status(msg.into(), StatusKind::Info);
    }

    pub fn set_error<S: Into<String>>(&mut self, msg: S) {
        self.set_status(msg.into(), StatusKind::Error);
    }

    /// Later messages replace earlier ones; only the last is shown.
    fn set_status(&mut self, text: String, kind: StatusKind) {
        trace!(target: "state.status", ?kind, text = %text, "status");
        self.status = Some(StatusMessage { text, kind });
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|m| m.text.as_str())
    }

    pub fn status_is_error(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|m| m.kind == StatusKind::Error)
    }

    pub fn push_panel_line<S: Into<String>>(&mut self, line: S) {
        self.status_panel.push(line.into());
    }

    pub fn panel(&self) -> &[String] {
        &self.status_panel
    }

    pub fn take_panel(&mut self) -> Vec<String> {
        std::mem::take(&mut self.status_panel)
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state(lines: &[&str]) -> EditorState {
        EditorState::new(Buffer::from_lines("t", lines))
    }

    #[test]
    fn splice_moves_tracked_locations_and_marks() {
        let mut st = state(&["a", "b", "c"]);
        let id = st.track_location(Position::new(2, 0));
        st.set_mark('m', Position::new(2, 0)).unwrap();
        st.splice_lines(0, 0, &["new"]);
        assert_eq!(st.resolve_location(id), Some(Position::new(3, 0)));
        assert_eq!(st.mark('m'), Some(Position::new(3, 0)));
        assert_eq!(st.mark('['), Some(Position::new(0, 0)));
        assert!(st.dirty);
        st.release_location(id);
        assert_eq!(st.tracked_locations(), 0);
    }

    #[test]
    fn transaction_is_single_undo_step() {
        let mut st = state(&["a", "b"]);
        st.begin_transaction(Position::origin());
        st.set_line(0, "A");
        st.set_line(1, "B");
        assert!(st.commit_transaction());
        assert_eq!(st.undo_depth(), 1);
        let mut cur = Position::origin();
        assert!(st.undo(&mut cur));
        assert_eq!(st.active_buffer().lines(0..2), vec!["a", "b"]);
        assert!(!st.dirty);
    }

    #[test]
    fn undo_to_written_state_is_clean() {
        let mut st = state(&["x"]);
        st.set_line(0, "y");
        st.mark_clean();
        st.set_line(0, "z");
        assert!(st.dirty);
        let mut cur = Position::origin();
        st.undo(&mut cur);
        assert!(!st.dirty);
        st.undo(&mut cur);
        assert!(st.dirty);
    }

    #[test]
    fn replace_buffer_invalidates_locations() {
        let mut st = state(&["a"]);
        let id = st.track_location(Position::origin());
        st.set_mark('a', Position::origin()).unwrap();
        st.set_line(0, "b");
        st.replace_buffer(Buffer::from_lines("n", ["z"]), Some("n.txt".into()));
        assert_eq!(st.resolve_location(id), None);
        assert_eq!(st.mark('a'), None);
        assert_eq!(st.undo_depth(), 0);
        assert!(!st.dirty);
    }

    #[test]
    fn error_status_and_panel() {
        let mut st = state(&[]);
        st.set_error("E: bad");
        assert!(st.status_is_error());
        st.set_info("ok");
        assert!(!st.status_is_error());
        st.push_panel_line("one");
        assert_eq!(st.take_panel(), vec!["one".to_string()]);
        assert!(st.panel().is_empty());
    }

    #[test]
    fn search_register_reads_session() {
        let mut st = state(&[]);
        assert!(st.read_register('/').is_none());
        st.session.record_search("foo", SearchDirection::Forward);
        assert_eq!(st.read_register('/').unwrap().text, "foo");
    }

    #[test]
    fn normalize_majority_crlf() {
        let n = normalize_line_endings("a\r\nb\r\nc\n");
        assert_eq!(n.normalized, "a\nb\nc\n");
        assert_eq!(n.original, LineEnding::Crlf);
        assert!(n.mixed);
        assert!(n.had_trailing_newline);
    }

    #[test]
    fn normalize_lone_cr_and_no_trailing() {
        let n = normalize_line_endings("a\rb");
        assert_eq!(n.normalized, "a\nb");
        assert_eq!(n.original, LineEnding::Cr);
        assert!(!n.mixed);
        assert!(!n.had_trailing_newline);
    }

    #[test]
    fn normalize_plain_text_defaults_to_lf() {
        let n = normalize_line_endings("plain");
        assert_eq!(n.original, LineEnding::Lf);
        assert_eq!(n.normalized, "plain");
    }
}
