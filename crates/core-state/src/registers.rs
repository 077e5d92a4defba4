//! Register table.
//!
//! Slots: unnamed `"`, yank `0`, delete ring `1`-`9` (newest first), small
//! delete `-`, named `a`-`z` (uppercase appends), black hole `_`. Each value
//! remembers whether it was captured characterwise or linewise so `:put` and
//! the register listing can reproduce it faithfully.

use std::collections::VecDeque;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Characterwise,
    Linewise,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterValue {
    pub text: String,
    pub kind: RegisterKind,
}

impl RegisterValue {
    pub fn linewise<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
            text.push('\n');
        }
        Self {
            text,
            kind: RegisterKind::Linewise,
        }
    }

    pub fn characterwise(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: RegisterKind::Characterwise,
        }
    }

    /// Content split into lines the way a linewise put inserts it.
    pub fn lines(&self) -> Vec<String> {
        let body = match self.kind {
            RegisterKind::Linewise => self.text.strip_suffix('\n').unwrap_or(&self.text),
            RegisterKind::Characterwise => self.text.as_str(),
        };
        body.split('\n').map(str::to_string).collect()
    }

    fn append(&mut self, other: RegisterValue) {
        match (self.kind, other.kind) {
            (RegisterKind::Characterwise, RegisterKind::Linewise) => {
                self.text.push('\n');
                self.text.push_str(&other.text);
                self.kind = RegisterKind::Linewise;
            }
            (RegisterKind::Linewise, RegisterKind::Characterwise) => {
                self.text.push_str(&other.text);
                self.text.push('\n');
            }
            _ => self.text.push_str(&other.text),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("Invalid register name: {0}")]
    InvalidName(char),
}

#[derive(Debug, Default, Clone)]
pub struct Registers {
    unnamed: Option<RegisterValue>,
    yank: Option<RegisterValue>,
    numbered: VecDeque<RegisterValue>,
    small_delete: Option<RegisterValue>,
    named: [Option<RegisterValue>; 26],
}

fn named_index(c: char) -> Option<usize> {
    c.is_ascii_alphabetic()
        .then(|| (c.to_ascii_lowercase() as u8 - b'a') as usize)
}

impl Registers {
    /// Delete ring capacity (`"1` .. `"9`).
    pub const RING: usize = 9;

    pub fn new() -> Self {
        Self::default()
    }

    /// Names accepted as a write target by yank/delete.
    pub fn is_valid_target(name: char) -> bool {
        matches!(name, '"' | '-' | '_' | '0'..='9' | 'a'..='z' | 'A'..='Z')
    }

    /// Record a yank (non-destructive copy).
    pub fn record_yank(
        &mut self,
        target: Option<char>,
        value: RegisterValue,
    ) -> Result<(), RegisterError> {
        trace!(target: "state.registers", register = ?target, bytes = value.text.len(), "record_yank");
        match target.unwrap_or('"') {
            '"' | '0' => {
                self.yank = Some(value.clone());
                self.unnamed = Some(value);
            }
            name => self.store_explicit(name, value)?,
        }
        Ok(())
    }

    /// Record a delete. Unnamed deletes go to the ring when they span lines,
    /// otherwise to the small-delete register.
    pub fn record_delete(
        &mut self,
        target: Option<char>,
        value: RegisterValue,
    ) -> Result<(), RegisterError> {
        trace!(target: "state.registers", register = ?target, bytes = value.text.len(), "record_delete");
        match target.unwrap_or('"') {
            '"' => {
                if value.kind == RegisterKind::Linewise || value.text.contains('\n') {
                    self.shift_ring(value.clone());
                } else {
                    self.small_delete = Some(value.clone());
                }
                self.unnamed = Some(value);
            }
            name => self.store_explicit(name, value)?,
        }
        Ok(())
    }

    fn store_explicit(&mut self, name: char, value: RegisterValue) -> Result<(), RegisterError> {
        match name {
            '_' => {}
            '-' => {
                self.small_delete = Some(value.clone());
                self.unnamed = Some(value);
            }
            '0' => {
                self.yank = Some(value.clone());
                self.unnamed = Some(value);
            }
            '1'..='9' => {
                let idx = (name as u8 - b'1') as usize;
                while self.numbered.len() <= idx {
                    self.numbered
                        .push_back(RegisterValue::characterwise(String::new()));
                }
                self.numbered[idx] = value.clone();
                self.unnamed = Some(value);
            }
            c if c.is_ascii_alphabetic() => {
                let Some(idx) = named_index(c) else {
                    return Err(RegisterError::InvalidName(c));
                };
                if c.is_ascii_uppercase()
                    && let Some(existing) = self.named[idx].as_mut()
                {
                    existing.append(value);
                } else {
                    self.named[idx] = Some(value);
                }
                self.unnamed = self.named[idx].clone();
            }
            other => return Err(RegisterError::InvalidName(other)),
        }
        Ok(())
    }

    fn shift_ring(&mut self, value: RegisterValue) {
        self.numbered.push_front(value);
        if self.numbered.len() > Self::RING {
            self.numbered.pop_back();
            trace!(target: "state.registers", "ring_rotated");
        }
    }

    /// Look up a register by name (uppercase named registers read the lowercase slot).
    pub fn get(&self, name: char) -> Option<&RegisterValue> {
        let value = match name {
            '"' => self.unnamed.as_ref(),
            '0' => self.yank.as_ref(),
            '1'..='9' => self.numbered.get((name as u8 - b'1') as usize),
            '-' => self.small_delete.as_ref(),
            c => named_index(c).and_then(|i| self.named[i].as_ref()),
        };
        value.filter(|v| !v.text.is_empty())
    }

    /// Non-empty registers in display order.
    pub fn entries(&self) -> Vec<(char, &RegisterValue)> {
        let names = ['"']
            .into_iter()
            .chain('0'..='9')
            .chain('a'..='z')
            .chain(['-']);
        names.filter_map(|n| self.get(n).map(|v| (n, v))).collect()
    }
}
