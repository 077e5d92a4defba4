//! Settings table.
//!
//! A fixed set of typed options (toggle / number / string) addressed by full
//! name or abbreviation. Values start at their defaults; `entries(true)` lists
//! only options whose value differs from the default (`:set` with no args).

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Toggle,
    Number,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDefault {
    Toggle(bool),
    Number(i64),
    Text(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Toggle(bool),
    Number(i64),
    Text(String),
}

impl From<OptionDefault> for OptionValue {
    fn from(d: OptionDefault) -> Self {
        match d {
            OptionDefault::Toggle(b) => OptionValue::Toggle(b),
            OptionDefault::Number(n) => OptionValue::Number(n),
            OptionDefault::Text(s) => OptionValue::Text(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub abbrev: Option<&'static str>,
    pub kind: OptionKind,
    pub default: OptionDefault,
}

#[cfg(windows)]
const DEFAULT_SHELL: &str = "cmd.exe";
#[cfg(not(windows))]
const DEFAULT_SHELL: &str = "/bin/sh";

const fn toggle(name: &'static str, abbrev: Option<&'static str>, v: bool) -> OptionDescriptor {
    OptionDescriptor {
        name,
        abbrev,
        kind: OptionKind::Toggle,
        default: OptionDefault::Toggle(v),
    }
}

const fn number(name: &'static str, abbrev: Option<&'static str>, v: i64) -> OptionDescriptor {
    OptionDescriptor {
        name,
        abbrev,
        kind: OptionKind::Number,
        default: OptionDefault::Number(v),
    }
}

const fn text(
    name: &'static str,
    abbrev: Option<&'static str>,
    v: &'static str,
) -> OptionDescriptor {
    OptionDescriptor {
        name,
        abbrev,
        kind: OptionKind::String,
        default: OptionDefault::Text(v),
    }
}

pub static OPTION_TABLE: &[OptionDescriptor] = &[
    toggle("autoindent", Some("ai"), false),
    toggle("expandtab", Some("et"), false),
    toggle("gdefault", Some("gd"), false),
    toggle("ignorecase", Some("ic"), false),
    toggle("magic", None, true),
    text("makeprg", Some("mp"), "make"),
    toggle("number", Some("nu"), false),
    number("report", None, 2),
    text("shell", Some("sh"), DEFAULT_SHELL),
    number("shiftwidth", Some("sw"), 8),
    toggle("smartcase", Some("scs"), false),
    number("tabstop", Some("ts"), 8),
    toggle("wrapscan", Some("ws"), true),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("Unknown option: {0}")]
    Unknown(String),
    #[error("Invalid argument: {name}={value}")]
    InvalidValue { name: String, value: String },
    #[error("Not a toggle option: {0}")]
    NotToggle(String),
}

#[derive(Debug, Clone)]
pub struct Options {
    values: BTreeMap<&'static str, OptionValue>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    pub fn new() -> Self {
        let values = OPTION_TABLE
            .iter()
            .map(|d| (d.name, OptionValue::from(d.default)))
            .collect();
        Self { values }
    }

    /// Find a descriptor by full name or abbreviation.
    pub fn lookup(name: &str) -> Option<&'static OptionDescriptor> {
        OPTION_TABLE
            .iter()
            .find(|d| d.name == name || d.abbrev == Some(name))
    }

    fn descriptor(name: &str) -> Result<&'static OptionDescriptor, OptionError> {
        Self::lookup(name).ok_or_else(|| OptionError::Unknown(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&OptionValue, OptionError> {
        let d = Self::descriptor(name)?;
        self.values
            .get(d.name)
            .ok_or_else(|| OptionError::Unknown(name.to_string()))
    }

    /// Store a typed value; the value kind must match the option kind.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), OptionError> {
        let d = Self::descriptor(name)?;
        let ok = match (&value, d.kind) {
            (OptionValue::Toggle(_), OptionKind::Toggle) => true,
            (OptionValue::Number(n), OptionKind::Number) => d.name != "tabstop" || *n >= 1,
            (OptionValue::Number(n), OptionKind::String) => {
                return self.set(name, OptionValue::Text(n.to_string()));
            }
            (OptionValue::Text(_), OptionKind::String) => true,
            _ => false,
        };
        if !ok {
            return Err(OptionError::InvalidValue {
                name: d.name.to_string(),
                value: render_value(&value),
            });
        }
        debug!(target: "state.options", option = d.name, value = %render_value(&value), "set");
        self.values.insert(d.name, value);
        Ok(())
    }

    /// Assign from the textual form used by `name=value`.
    pub fn set_from_str(&mut self, name: &str, raw: &str) -> Result<(), OptionError> {
        let d = Self::descriptor(name)?;
        let invalid = || OptionError::InvalidValue {
            name: d.name.to_string(),
            value: raw.to_string(),
        };
        let value = match d.kind {
            OptionKind::Toggle => return Err(invalid()),
            OptionKind::Number => OptionValue::Number(raw.trim().parse().map_err(|_| invalid())?),
            OptionKind::String => OptionValue::Text(raw.to_string()),
        };
        self.set(name, value)
    }

    pub fn set_toggle(&mut self, name: &str, on: bool) -> Result<(), OptionError> {
        let d = Self::descriptor(name)?;
        if d.kind != OptionKind::Toggle {
            return Err(OptionError::NotToggle(d.name.to_string()));
        }
        self.set(name, OptionValue::Toggle(on))
    }

    pub fn invert(&mut self, name: &str) -> Result<bool, OptionError> {
        let current = match self.get(name)? {
            OptionValue::Toggle(b) => *b,
            _ => return Err(OptionError::NotToggle(name.to_string())),
        };
        self.set_toggle(name, !current)?;
        Ok(!current)
    }

    /// `(descriptor, value)` in table order; `changed_only` filters out defaults.
    pub fn entries(&self, changed_only: bool) -> Vec<(&'static OptionDescriptor, &OptionValue)> {
        OPTION_TABLE
            .iter()
            .filter_map(|d| self.values.get(d.name).map(|v| (d, v)))
            .filter(|(d, v)| !changed_only || **v != OptionValue::from(d.default))
            .collect()
    }

    pub fn toggle(&self, name: &str) -> bool {
        matches!(self.get(name), Ok(OptionValue::Toggle(true)))
    }

    pub fn number(&self, name: &str) -> i64 {
        match self.get(name) {
            Ok(OptionValue::Number(n)) => *n,
            _ => 0,
        }
    }

    pub fn text(&self, name: &str) -> String {
        match self.get(name) {
            Ok(OptionValue::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn tabstop(&self) -> usize {
        self.number("tabstop").max(1) as usize
    }

    pub fn shiftwidth(&self) -> usize {
        match self.number("shiftwidth") {
            n if n <= 0 => self.tabstop(),
            n => n as usize,
        }
    }

    /// `name`, `noname` or `name=value`, the form `:set` lists.
    pub fn render(desc: &OptionDescriptor, value: &OptionValue) -> String {
        match value {
            OptionValue::Toggle(true) => desc.name.to_string(),
            OptionValue::Toggle(false) => format!("no{}", desc.name),
            other => format!("{}={}", desc.name, render_value(other)),
        }
    }
}

fn render_value(v: &OptionValue) -> String {
    v.to_string()
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Toggle(b) => write!(f, "{b}"),
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}
