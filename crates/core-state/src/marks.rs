//! Mark table: local `a`-`z`, global `A`-`Z` (remember their file) and the
//! special marks maintained by commands (`'`, `[`, `]`, `<`, `>`).
//!
//! Marks are positions in the active buffer and follow edits through the same
//! `LineDelta` rule as tracked locations; a mark whose line is deleted is
//! dropped.

use core_text::{LineDelta, Position};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkError {
    #[error("Invalid mark name: {0}")]
    InvalidName(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkEntry {
    pub name: char,
    pub position: Position,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct GlobalMark {
    position: Position,
    file: Option<PathBuf>,
}

#[derive(Debug, Default, Clone)]
pub struct MarkTable {
    local: BTreeMap<char, Position>,
    global: BTreeMap<char, GlobalMark>,
}

const SPECIAL: &[char] = &['\'', '[', ']', '<', '>', '"', '.', '^'];

fn canonical(name: char) -> char {
    if name == '`' { '\'' } else { name }
}

impl MarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names a user may set explicitly (`:mark`, `:k`).
    pub fn is_user_settable(name: char) -> bool {
        name.is_ascii_alphabetic() || name == '\'' || name == '`'
    }

    pub fn set(
        &mut self,
        name: char,
        position: Position,
        file: Option<&Path>,
    ) -> Result<(), MarkError> {
        let name = canonical(name);
        if name.is_ascii_uppercase() {
            self.global.insert(
                name,
                GlobalMark {
                    position,
                    file: file.map(Path::to_path_buf),
                },
            );
        } else if name.is_ascii_lowercase() || SPECIAL.contains(&name) {
            self.local.insert(name, position);
        } else {
            return Err(MarkError::InvalidName(name));
        }
        tracing::trace!(target: "state.marks", mark = %name, line = position.line, "mark_set");
        Ok(())
    }

    /// Record an automatic mark such as `[` or `]`.
    pub(crate) fn set_special(&mut self, name: char, position: Position) {
        debug_assert!(SPECIAL.contains(&name), "{name} is not an automatic mark");
        self.local.insert(name, position);
    }

    /// Position of a mark as seen from `current_file`. Global marks recorded
    /// for another file do not resolve.
    pub fn get(&self, name: char, current_file: Option<&Path>) -> Option<Position> {
        let name = canonical(name);
        if name.is_ascii_uppercase() {
            self.global
                .get(&name)
                .filter(|m| m.file.as_deref() == current_file)
                .map(|m| m.position)
        } else {
            self.local.get(&name).copied()
        }
    }

    pub fn remove(&mut self, name: char) -> bool {
        let name = canonical(name);
        self.local.remove(&name).is_some() || self.global.remove(&name).is_some()
    }

    /// Forget buffer-local marks (new file loaded). Global marks stay.
    pub fn clear_local(&mut self) {
        self.local.clear();
    }

    /// Re-anchor marks after an edit to the buffer of `current_file`.
    pub fn apply<F>(&mut self, delta: &LineDelta, current_file: Option<&Path>, mut line_len: F)
    where
        F: FnMut(usize) -> usize,
    {
        if delta.is_noop() {
            return;
        }
        let mut remap = |pos: &mut Position| -> bool {
            match delta.map_line(pos.line) {
                Some(line) => {
                    pos.line = line;
                    pos.byte = pos.byte.min(line_len(line));
                    true
                }
                None => false,
            }
        };
        self.local.retain(|_, pos| remap(pos));
        self.global.retain(|_, mark| {
            mark.file.as_deref() != current_file || remap(&mut mark.position)
        });
    }

    /// All marks for listing: specials first, then a-z, then A-Z.
    pub fn entries(&self) -> Vec<MarkEntry> {
        let rank = |c: char| {
            if c.is_ascii_lowercase() {
                1
            } else if c.is_ascii_uppercase() {
                2
            } else {
                0
            }
        };
        let mut out: Vec<MarkEntry> = self
            .local
            .iter()
            .map(|(&name, &position)| MarkEntry {
                name,
                position,
                file: None,
            })
            .chain(self.global.iter().map(|(&name, m)| MarkEntry {
                name,
                position: m.position,
                file: m.file.clone(),
            }))
            .collect();
        out.sort_by_key(|e| (rank(e.name), e.name));
        out
    }
}
