//! Display width helpers used for indentation math (`:retab`, `:>`, `:<`).
//!
//! Widths are measured per grapheme cluster via `unicode-width`; a tab advances
//! to the next multiple of `tabstop`.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width (terminal cells) of `text` starting at column 0.
pub fn display_width(text: &str, tabstop: usize) -> usize {
    advance(0, text, tabstop)
}

fn advance(start_col: usize, text: &str, tabstop: usize) -> usize {
    let ts = tabstop.max(1);
    let mut col = start_col;
    for g in text.graphemes(true) {
        if g == "\t" {
            col += ts - (col % ts);
        } else {
            col += UnicodeWidthStr::width(g);
        }
    }
    col
}

/// Split the leading whitespace of `line`: returns (byte length, display width).
pub fn indent_width(line: &str, tabstop: usize) -> (usize, usize) {
    let bytes = line
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    (bytes, display_width(&line[..bytes], tabstop))
}

/// Build an indent string covering `width` columns, using tabs unless `expandtab`.
pub fn make_indent(width: usize, tabstop: usize, expandtab: bool) -> String {
    let ts = tabstop.max(1);
    if expandtab {
        return " ".repeat(width);
    }
    let mut out = "\t".repeat(width / ts);
    out.push_str(&" ".repeat(width % ts));
    out
}
