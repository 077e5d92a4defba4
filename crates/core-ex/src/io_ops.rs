//! File IO helpers used by `:e`, `:r`, `:w`, `:so`.
//!
//! Reading decodes with the BOM / UTF-8 / Latin-1 / lossy fallback chain and
//! normalizes line endings; writing re-expands the original ending style and
//! honors the trailing-newline flag for whole-buffer writes.

use crate::command::LineRange;
use core_state::{EditorState, LineEnding, normalize_line_endings};
use core_text::{Buffer, Encoding, decode, encode};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, error, warn};

/// Decoded file contents plus the metadata needed to write it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFile {
    pub lines: Vec<String>,
    pub encoding: Encoding,
    pub line_ending: LineEnding,
    pub had_trailing_newline: bool,
    pub mixed_line_endings: bool,
    pub bytes: usize,
}

impl ReadFile {
    pub fn into_buffer(self, name: &str) -> Buffer {
        Buffer::from_lines(name, self.lines)
    }
}

/// Read and decode `path`. Failures are logged; the caller reports them.
pub fn read_lines(path: &Path) -> io::Result<ReadFile> {
    let bytes = std::fs::read(path).inspect_err(|e| {
        error!(target: "ex.io", path = %path.display(), error = %e, "file_read_error");
    })?;
    let decoded = decode(&bytes);
    let norm = normalize_line_endings(&decoded.text);
    if norm.mixed {
        warn!(target: "ex.io", path = %path.display(), "mixed_line_endings");
    }
    let lines = match norm.normalized.strip_suffix('\n') {
        _ if norm.normalized.is_empty() => Vec::new(),
        Some(body) => body.split('\n').map(str::to_string).collect(),
        None => norm.normalized.split('\n').map(str::to_string).collect(),
    };
    debug!(
        target: "ex.io",
        path = %path.display(),
        lines = lines.len(),
        encoding = decoded.encoding.label(),
        "file_read"
    );
    Ok(ReadFile {
        lines,
        encoding: decoded.encoding,
        line_ending: norm.original,
        had_trailing_newline: norm.had_trailing_newline,
        mixed_line_endings: norm.mixed,
        bytes: bytes.len(),
    })
}

/// Text for `range` (or the empty buffer when `None`) with the original line
/// ending re-applied. The final terminator is dropped only for a write of the
/// whole buffer that had none on disk.
pub fn serialize(state: &EditorState, range: Option<LineRange>) -> String {
    let Some(range) = range else {
        return String::new();
    };
    let buffer = state.active_buffer();
    let ending = state.original_line_ending.as_str();
    let whole = range.start == 0 && range.end + 1 == buffer.line_count();
    let mut content = String::new();
    for i in range.start..=range.end {
        if let Some(line) = buffer.line(i) {
            content.push_str(&line);
            if i < range.end || !whole || state.had_trailing_newline {
                content.push_str(ending);
            }
        }
    }
    content
}

/// Write encoded `text` to `path`, appending when asked. Returns bytes written.
pub fn write_text(path: &Path, text: &str, encoding: Encoding, append: bool) -> io::Result<usize> {
    let bytes = encode(text, encoding);
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    file.write_all(&bytes)?;
    debug!(target: "ex.io", path = %path.display(), bytes = bytes.len(), append, "file_written");
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn read_normalizes_and_sets_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write!(f, "line1\r\nline2\nline3\r\n").unwrap();
        }
        let read = read_lines(&path).unwrap();
        assert_eq!(read.lines, vec!["line1", "line2", "line3"]);
        assert_eq!(read.line_ending, LineEnding::Crlf);
        assert!(read.mixed_line_endings);
        assert!(read.had_trailing_newline);
    }

    #[test]
    fn empty_and_blank_files() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        std::fs::write(&empty, "").unwrap();
        assert!(read_lines(&empty).unwrap().lines.is_empty());
        let blank = dir.path().join("blank");
        std::fs::write(&blank, "\n").unwrap();
        assert_eq!(read_lines(&blank).unwrap().lines, vec![""]);
    }

    #[test]
    fn serialize_preserves_original_style() {
        let mut state = EditorState::new(Buffer::from_lines("t", ["a", "b"]));
        state.original_line_ending = LineEnding::Crlf;
        state.had_trailing_newline = false;
        assert_eq!(serialize(&state, Some(LineRange::new(0, 1))), "a\r\nb");
        assert_eq!(serialize(&state, Some(LineRange::single(0))), "a\r\n");
        assert_eq!(serialize(&state, None), "");
    }

    #[test]
    fn append_mode_extends_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_text(&path, "one\n", Encoding::Utf8, false).unwrap();
        write_text(&path, "two\n", Encoding::Utf8, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        write_text(&path, "new\n", Encoding::Utf8, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_lines(&dir.path().join("nope")).is_err());
    }
}
