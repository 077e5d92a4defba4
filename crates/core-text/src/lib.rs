//! Rope-based line buffer snapshots.
//!
//! A `Buffer` is a versioned snapshot of text content. Every line is stored
//! terminated by `\n`, so an empty rope is a zero-line buffer and line math
//! never special-cases a missing final newline. Whether the file on disk had a
//! final newline (and which line ending it used) is file metadata owned by
//! `core-state`, not by the buffer.
//!
//! Snapshot model:
//! * Cloning a `Buffer` is cheap (the rope tree is structurally shared) and the
//!   clone is unaffected by later edits to the original.
//! * All content mutation flows through `splice_lines`, which stamps a fresh,
//!   process-unique version and returns the `LineDelta` describing the edit.
//!   Callers feed that delta into a `LocationTracker` (see `tracking`) so that
//!   positions computed against the previous snapshot can be re-anchored rather
//!   than reused raw.
//!
//! Only `\n` is treated as a line break (ropey's CR / Unicode line break
//! features are disabled); CR and CRLF input is normalized before it reaches a
//! buffer.

use ropey::Rope;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

pub mod encoding;
pub mod tracking;
pub mod width;

pub use encoding::{Decoded, Encoding, decode, encode};
pub use tracking::{LineDelta, LocationId, LocationTracker};
pub use width::{display_width, indent_width, make_indent};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// A text buffer snapshot backed by a `ropey::Rope`.
#[derive(Clone, Debug)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
    version: u64,
}

/// A position inside a buffer expressed as (line index, byte offset within that line).
/// Both components are 0-based; the byte offset never counts the line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub byte: usize,
}

impl Position {
    pub fn new(line: usize, byte: usize) -> Self {
        Self { line, byte }
    }
    pub fn origin() -> Self {
        Self { line: 0, byte: 0 }
    }
    pub fn clamp_to<F>(&mut self, line_count: usize, mut line_len_fn: F)
    where
        F: FnMut(usize) -> usize,
    {
        if line_count == 0 {
            self.line = 0;
            self.byte = 0;
            return;
        }
        if self.line >= line_count {
            self.line = line_count - 1;
        }
        let max_len = line_len_fn(self.line);
        if self.byte > max_len {
            self.byte = max_len;
        }
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice. A missing final `\n`
    /// is supplied so the last line is terminated like every other.
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        let mut rope = Rope::from_str(content);
        let len = rope.len_chars();
        if len > 0 && rope.char(len - 1) != '\n' {
            rope.insert_char(len, '\n');
        }
        Self {
            rope,
            name: name.into(),
            version: next_version(),
        }
    }

    /// Construct a buffer from individual lines (none of which may contain `\n`).
    pub fn from_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
            text.push('\n');
        }
        Self::from_str(name, &text)
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::from_str(name, "")
    }

    /// Version stamp of this snapshot. Strictly increases with every splice and
    /// is unique across all buffers in the process.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total number of lines in the buffer (0 for an empty buffer).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Return the requested line as an owned `String` without its terminator.
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx >= self.line_count() {
            return None;
        }
        let mut s = self.rope.line(idx).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        Some(s)
    }

    /// Byte length of a line (excluding the newline) for clamping purposes.
    pub fn line_byte_len(&self, idx: usize) -> usize {
        if idx >= self.line_count() {
            return 0;
        }
        self.rope.line(idx).len_bytes().saturating_sub(1)
    }

    /// Owned copies of the lines in `range` (clamped to the buffer).
    pub fn lines(&self, range: Range<usize>) -> Vec<String> {
        let end = range.end.min(self.line_count());
        (range.start..end).filter_map(|i| self.line(i)).collect()
    }

    /// Full text content including every line terminator.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace `removed` lines starting at `start` with `lines`, producing a new
    /// snapshot version. `start` and `removed` are clamped to the buffer. Any
    /// `\n` embedded in an element splits it into several lines; the returned
    /// delta reports the real number of inserted lines.
    pub fn splice_lines<S: AsRef<str>>(
        &mut self,
        start: usize,
        removed: usize,
        lines: &[S],
    ) -> LineDelta {
        let count = self.line_count();
        let start = start.min(count);
        let removed = removed.min(count - start);
        let from = self.rope.line_to_char(start);
        let to = self.rope.line_to_char(start + removed);
        if from < to {
            self.rope.remove(from..to);
        }
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
            text.push('\n');
        }
        let inserted = text.bytes().filter(|b| *b == b'\n').count();
        if !text.is_empty() {
            self.rope.insert(from, &text);
        }
        self.version = next_version();
        trace!(target: "text.buffer", start, removed, inserted, version = self.version, "splice_lines");
        LineDelta {
            start,
            removed,
            inserted,
        }
    }

    /// Replace a single line in place.
    pub fn set_line(&mut self, idx: usize, text: &str) -> LineDelta {
        self.splice_lines(idx, 1, &[text])
    }
}
