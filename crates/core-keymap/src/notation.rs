//! Key notation: `<CR>`, `<Esc>`, `<C-x>`, `<M-a>`, `<F5>` and plain chars.
//!
//! Unrecognized `<...>` sequences are taken literally, character by character.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ModMask: u8 { const CTRL = 1; const ALT = 2; const SHIFT = 4; }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedKey {
    Enter,
    Esc,
    Backspace,
    Tab,
    Space,
    Lt,
    Bar,
    Bslash,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Nop,
    F(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyToken {
    Char(char),
    Named(NamedKey),
    Chord { base: Box<KeyToken>, mods: ModMask },
}

const NAMES: &[(&str, NamedKey)] = &[
    ("cr", NamedKey::Enter),
    ("return", NamedKey::Enter),
    ("enter", NamedKey::Enter),
    ("esc", NamedKey::Esc),
    ("bs", NamedKey::Backspace),
    ("backspace", NamedKey::Backspace),
    ("tab", NamedKey::Tab),
    ("space", NamedKey::Space),
    ("lt", NamedKey::Lt),
    ("bar", NamedKey::Bar),
    ("bslash", NamedKey::Bslash),
    ("up", NamedKey::Up),
    ("down", NamedKey::Down),
    ("left", NamedKey::Left),
    ("right", NamedKey::Right),
    ("home", NamedKey::Home),
    ("end", NamedKey::End),
    ("pageup", NamedKey::PageUp),
    ("pagedown", NamedKey::PageDown),
    ("insert", NamedKey::Insert),
    ("ins", NamedKey::Insert),
    ("del", NamedKey::Delete),
    ("delete", NamedKey::Delete),
    ("nop", NamedKey::Nop),
];

fn named(name: &str) -> Option<NamedKey> {
    let lower = name.to_ascii_lowercase();
    if let Some(n) = lower.strip_prefix('f')
        && let Ok(num) = n.parse::<u8>()
        && (1..=12).contains(&num)
    {
        return Some(NamedKey::F(num));
    }
    NAMES.iter().find(|(n, _)| *n == lower).map(|(_, k)| *k)
}

/// Parse the inside of `<...>`.
fn parse_bracketed(inner: &str) -> Option<KeyToken> {
    let mut mods = ModMask::empty();
    let mut rest = inner;
    while rest.len() > 2 && rest.as_bytes()[1] == b'-' {
        let m = match rest.as_bytes()[0].to_ascii_uppercase() {
            b'C' => ModMask::CTRL,
            b'M' | b'A' => ModMask::ALT,
            b'S' => ModMask::SHIFT,
            _ => return None,
        };
        mods |= m;
        rest = &rest[2..];
    }
    let mut chars = rest.chars();
    let base = match (chars.next(), chars.next()) {
        (Some(c), None) if !mods.is_empty() => KeyToken::Char(c),
        _ => KeyToken::Named(named(rest)?),
    };
    if mods.is_empty() {
        return Some(base);
    }
    Some(KeyToken::Chord {
        base: Box::new(base),
        mods,
    })
}

/// Tokenize a key sequence written in mapping notation.
pub fn parse_keys(notation: &str) -> Vec<KeyToken> {
    let mut out = Vec::new();
    let mut rest = notation;
    while let Some(c) = rest.chars().next() {
        if c == '<'
            && let Some(close) = rest.find('>')
            && let Some(tok) = parse_bracketed(&rest[1..close])
        {
            out.push(tok);
            rest = &rest[close + 1..];
            continue;
        }
        out.push(KeyToken::Char(c));
        rest = &rest[c.len_utf8()..];
    }
    out
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NamedKey::Enter => "CR",
            NamedKey::Esc => "Esc",
            NamedKey::Backspace => "BS",
            NamedKey::Tab => "Tab",
            NamedKey::Space => "Space",
            NamedKey::Lt => "lt",
            NamedKey::Bar => "Bar",
            NamedKey::Bslash => "Bslash",
            NamedKey::Up => "Up",
            NamedKey::Down => "Down",
            NamedKey::Left => "Left",
            NamedKey::Right => "Right",
            NamedKey::Home => "Home",
            NamedKey::End => "End",
            NamedKey::PageUp => "PageUp",
            NamedKey::PageDown => "PageDown",
            NamedKey::Insert => "Insert",
            NamedKey::Delete => "Del",
            NamedKey::Nop => "Nop",
            NamedKey::F(n) => return write!(f, "F{n}"),
        };
        f.write_str(s)
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Char(c) => write!(f, "{c}"),
            KeyToken::Named(n) => write!(f, "<{n}>"),
            KeyToken::Chord { base, mods } => {
                f.write_str("<")?;
                for (flag, prefix) in [
                    (ModMask::CTRL, "C-"),
                    (ModMask::ALT, "M-"),
                    (ModMask::SHIFT, "S-"),
                ] {
                    if mods.contains(flag) {
                        f.write_str(prefix)?;
                    }
                }
                match base.as_ref() {
                    KeyToken::Named(n) => write!(f, "{n}>"),
                    other => write!(f, "{other}>"),
                }
            }
        }
    }
}

/// Canonical notation for a token sequence (used as the table key and in listings).
pub fn render_keys(keys: &[KeyToken]) -> String {
    keys.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_named() {
        assert_eq!(
            parse_keys("a<CR>"),
            vec![KeyToken::Char('a'), KeyToken::Named(NamedKey::Enter)]
        );
    }

    #[test]
    fn chords_and_function_keys() {
        let keys = parse_keys("<C-x><f5>");
        assert_eq!(
            keys[0],
            KeyToken::Chord {
                base: Box::new(KeyToken::Char('x')),
                mods: ModMask::CTRL
            }
        );
        assert_eq!(keys[1], KeyToken::Named(NamedKey::F(5)));
        assert_eq!(render_keys(&keys), "<C-x><F5>");
    }

    #[test]
    fn unknown_brackets_are_literal() {
        let keys = parse_keys("<foo>");
        assert_eq!(keys.len(), 5);
        assert_eq!(render_keys(&keys), "<foo>");
    }

    #[test]
    fn notation_is_case_insensitive() {
        assert_eq!(render_keys(&parse_keys("<cr><ESC>")), "<CR><Esc>");
    }
}
