//! Pattern translation, compilation and line search.
//!
//! Patterns use the editor's "magic" syntax: `\(`, `\|`, `\+`, `\=`, `\{n,m}`
//! and `\<` / `\>` are operators, while bare `( ) | + ? { }` are literal.
//! `translate_pattern` rewrites that into `regex` syntax. With `nomagic`,
//! `.` `*` `[` and `~` are literal unless escaped.
//!
//! Replacement strings are pre-parsed into `ReplacementPart`s so expansion
//! per match is a straight walk over captures.

use crate::error::ExError;
use core_state::{Options, SearchDirection, SubstituteFlags};
use core_text::{Buffer, Position};
use regex::{Captures, Regex, RegexBuilder};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPattern {
    pub regex: String,
    /// `Some(true)` for `\c`, `Some(false)` for `\C`.
    pub ignore_case: Option<bool>,
}

/// Rewrite a magic pattern into `regex` crate syntax.
pub fn translate_pattern(pattern: &str, magic: bool) -> Result<TranslatedPattern, ExError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut magic = magic;
    let mut ignore_case = None;
    // Start of the pattern, a group or a branch: `^` anchors, `*` is literal.
    let mut at_start = true;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        let starts = std::mem::replace(&mut at_start, false);
        if c != '\\' {
            match c {
                '.' if magic => out.push('.'),
                '*' if magic && !starts => out.push('*'),
                '[' if magic => i = bracket(&chars, i, &mut out),
                '^' if starts => {
                    out.push('^');
                    at_start = true;
                }
                '$' if ends_branch(&chars, i) => out.push('$'),
                other => push_literal(&mut out, other),
            }
            continue;
        }
        let Some(&next) = chars.get(i) else {
            out.push_str(r"\\");
            break;
        };
        i += 1;
        match next {
            '(' => {
                out.push('(');
                at_start = true;
            }
            '%' if chars.get(i) == Some(&'(') => {
                i += 1;
                out.push_str("(?:");
                at_start = true;
            }
            ')' => out.push(')'),
            '|' => {
                out.push('|');
                at_start = true;
            }
            '+' => out.push('+'),
            '?' | '=' => out.push('?'),
            '{' => i = brace(&chars, i, &mut out)?,
            '<' | '>' => out.push_str(r"\b"),
            'c' => ignore_case = Some(true),
            'C' => ignore_case = Some(false),
            'm' => magic = true,
            'M' => magic = false,
            'v' | 'V' | '1'..='9' => return Err(ExError::Unsupported(format!("\\{next}"))),
            'n' => out.push_str(r"\n"),
            't' => out.push_str(r"\t"),
            'r' => out.push_str(r"\r"),
            'e' => out.push_str(r"\x1b"),
            's' | 'S' | 'd' | 'D' | 'w' | 'W' => {
                out.push('\\');
                out.push(next);
            }
            'a' => out.push_str("[A-Za-z]"),
            'A' => out.push_str("[^A-Za-z]"),
            'l' => out.push_str("[a-z]"),
            'L' => out.push_str("[^a-z]"),
            'u' => out.push_str("[A-Z]"),
            'U' => out.push_str("[^A-Z]"),
            'x' => out.push_str("[0-9A-Fa-f]"),
            'X' => out.push_str("[^0-9A-Fa-f]"),
            'o' => out.push_str("[0-7]"),
            'O' => out.push_str("[^0-7]"),
            'h' => out.push_str("[A-Za-z_]"),
            'H' => out.push_str("[^A-Za-z_]"),
            '.' if !magic => out.push('.'),
            '*' if !magic && !starts => out.push('*'),
            '[' if !magic => i = bracket(&chars, i, &mut out),
            other => push_literal(&mut out, other),
        }
    }
    trace!(target: "ex.substitute", pattern, regex = %out, "translated");
    Ok(TranslatedPattern {
        regex: out,
        ignore_case,
    })
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// `$` only anchors at the end of the pattern or before `\)` / `\|`.
fn ends_branch(chars: &[char], i: usize) -> bool {
    match chars.get(i..i + 2) {
        _ if i >= chars.len() => true,
        Some(['\\', ')' | '|']) => true,
        _ => false,
    }
}

/// Copy a bracket expression starting after `[`. Returns the index after the
/// closing `]`; an unterminated `[` is literal.
fn bracket(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut j = start;
    if chars.get(j) == Some(&'^') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    let close = loop {
        match chars.get(j) {
            None => {
                out.push_str(r"\[");
                return start;
            }
            Some('\\') => j += 2,
            Some('[') if chars.get(j + 1) == Some(&':') => {
                let tail: String = chars[j..].iter().collect();
                j += tail.find(":]").map(|k| tail[..k].chars().count() + 2).unwrap_or(1);
            }
            Some(']') => break j,
            Some(_) => j += 1,
        }
    };
    out.push('[');
    let mut k = start;
    if chars.get(k) == Some(&'^') {
        out.push('^');
        k += 1;
    }
    if chars.get(k) == Some(&']') {
        out.push_str(r"\]");
        k += 1;
    }
    while k < close {
        let c = chars[k];
        match c {
            '\\' if k + 1 < close => {
                match chars[k + 1] {
                    'e' => out.push_str(r"\x1b"),
                    'n' | 't' | 'r' | '\\' | ']' | '^' | '-' => {
                        out.push('\\');
                        out.push(chars[k + 1]);
                    }
                    other => {
                        out.push_str(r"\\");
                        push_literal(out, other);
                    }
                }
                k += 2;
                continue;
            }
            '[' if chars.get(k + 1) == Some(&':') => out.push('['),
            '[' | '&' | '~' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
        k += 1;
    }
    out.push(']');
    close + 1
}

/// Translate `\{n,m}` (the `\{` is already consumed). Returns the index
/// after the closing brace.
fn brace(chars: &[char], start: usize, out: &mut String) -> Result<usize, ExError> {
    let mut j = start;
    let mut body = String::new();
    let end = loop {
        match chars.get(j) {
            None => return Err(ExError::InvalidPattern("missing }".into())),
            Some('\\') if chars.get(j + 1) == Some(&'}') => break j + 2,
            Some('}') => break j + 1,
            Some(c) => body.push(*c),
        }
        j += 1;
    };
    let (lazy, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body.as_str()),
    };
    if !body.chars().all(|c| c.is_ascii_digit() || c == ',') || body.matches(',').count() > 1 {
        return Err(ExError::InvalidPattern(format!("\\{{{body}}}")));
    }
    match body.split_once(',') {
        _ if body.is_empty() => out.push('*'),
        None => out.push_str(&format!("{{{body}}}")),
        Some((lo, hi)) => {
            let lo = if lo.is_empty() { "0" } else { lo };
            out.push_str(&format!("{{{lo},{hi}}}"));
        }
    }
    if lazy {
        out.push('?');
    }
    Ok(end)
}

/// Compile `pattern` honoring `magic`, `ignorecase` / `smartcase` and the
/// `i` / `I` substitute flags. `\c` / `\C` inside the pattern win.
pub fn compile(pattern: &str, options: &Options, flags: SubstituteFlags) -> Result<Regex, ExError> {
    let translated = translate_pattern(pattern, options.toggle("magic"))?;
    let from_flags = if flags.contains(SubstituteFlags::IGNORE_CASE) {
        Some(true)
    } else if flags.contains(SubstituteFlags::MATCH_CASE) {
        Some(false)
    } else {
        None
    };
    let ignore_case = translated.ignore_case.or(from_flags).unwrap_or_else(|| {
        options.toggle("ignorecase")
            && !(options.toggle("smartcase") && pattern.chars().any(char::is_uppercase))
    });
    RegexBuilder::new(&translated.regex)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| ExError::InvalidPattern(e.to_string()))
}

/// Byte span of one match on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// First match at or after `from`, not beyond `last_line`.
pub fn find_from(buffer: &Buffer, regex: &Regex, from: Position, last_line: usize) -> Option<MatchSpan> {
    let last = last_line.min(buffer.line_count().checked_sub(1)?);
    for line in from.line..=last {
        let text = buffer.line(line)?;
        let at = if line == from.line { from.byte } else { 0 };
        if at > text.len() || !text.is_char_boundary(at) {
            continue;
        }
        if let Some(m) = regex.find_at(&text, at) {
            return Some(MatchSpan {
                line,
                start: m.start(),
                end: m.end(),
            });
        }
    }
    None
}

/// Next line (after or before `from`) containing a match, optionally
/// wrapping around the buffer end.
pub fn search_line(
    buffer: &Buffer,
    regex: &Regex,
    from: usize,
    direction: SearchDirection,
    wrap: bool,
) -> Option<usize> {
    let count = buffer.line_count();
    if count == 0 {
        return None;
    }
    let from = from.min(count - 1);
    let steps = if wrap { count } else { count - 1 };
    for k in 1..=steps {
        let line = match direction {
            SearchDirection::Forward if from + k < count => from + k,
            SearchDirection::Backward if k <= from => from - k,
            _ if !wrap => break,
            SearchDirection::Forward => from + k - count,
            SearchDirection::Backward => from + count - k,
        };
        if buffer.line(line).is_some_and(|t| regex.is_match(&t)) {
            return Some(line);
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementPart {
    Literal(String),
    WholeMatch,
    Group(usize),
}

/// Parsed replacement string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    parts: Vec<ReplacementPart>,
}

impl Replacement {
    /// Parse `raw` (after `~` expansion). `&` (or `\&` with nomagic) and
    /// `\0` insert the whole match, `\1`..`\9` a group, `\r` / `\n` split
    /// the line.
    pub fn parse(raw: &str, magic: bool) -> Self {
        fn flush(literal: &mut String, parts: &mut Vec<ReplacementPart>) {
            if !literal.is_empty() {
                parts.push(ReplacementPart::Literal(std::mem::take(literal)));
            }
        }
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '&' if magic => {
                    flush(&mut literal, &mut parts);
                    parts.push(ReplacementPart::WholeMatch);
                }
                '\\' => match chars.next() {
                    Some('&') if !magic => {
                        flush(&mut literal, &mut parts);
                        parts.push(ReplacementPart::WholeMatch);
                    }
                    Some(d @ '0'..='9') => {
                        flush(&mut literal, &mut parts);
                        parts.push(match d.to_digit(10) {
                            Some(0) | None => ReplacementPart::WholeMatch,
                            Some(n) => ReplacementPart::Group(n as usize),
                        });
                    }
                    Some('r' | 'n') => literal.push('\n'),
                    Some('t') => literal.push('\t'),
                    Some(other) => literal.push(other),
                    None => literal.push('\\'),
                },
                c => literal.push(c),
            }
        }
        flush(&mut literal, &mut parts);
        Self { parts }
    }

    pub fn parts(&self) -> &[ReplacementPart] {
        &self.parts
    }

    /// Expanded text for one match; may contain `\n`.
    pub fn expand(&self, caps: &Captures<'_>) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                ReplacementPart::Literal(s) => out.push_str(s),
                ReplacementPart::WholeMatch => out.push_str(&caps[0]),
                ReplacementPart::Group(n) => {
                    if let Some(m) = caps.get(*n) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
        out
    }
}

/// Substitute the previous replacement string for `~` (`\~` with nomagic).
pub fn expand_tilde(raw: &str, previous: Option<&str>, magic: bool) -> String {
    let previous = previous.unwrap_or("");
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '~' if magic => out.push_str(previous),
            '\\' => match chars.next() {
                Some('~') if !magic => out.push_str(previous),
                Some(n) => {
                    out.push('\\');
                    out.push(n);
                }
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}
