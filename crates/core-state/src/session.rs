//! Session-wide command memory: last search, last substitute, last shell
//! command, previous directory and `:let` variables.
//!
//! Owned by `EditorState` and only updated by the commands that define each
//! piece (successful search / substitute / shell command, `:cd`, `:let`).

use bitflags::bitflags;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::trace;

bitflags! {
    /// Substitute flags. Letters follow the command-line syntax.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SubstituteFlags: u16 {
        /// `&`: keep flags of the previous substitute.
        const USE_PREVIOUS_FLAGS = 1 << 0;
        /// `c`
        const CONFIRM = 1 << 1;
        /// `e`: no error when nothing matched.
        const SUPPRESS_ERRORS = 1 << 2;
        /// `g`
        const GLOBAL = 1 << 3;
        /// `i`
        const IGNORE_CASE = 1 << 4;
        /// `I`
        const MATCH_CASE = 1 << 5;
        /// `n`: count matches only.
        const COUNT_ONLY = 1 << 6;
        /// `p`
        const PRINT = 1 << 7;
        /// `#`
        const PRINT_NUMBER = 1 << 8;
        /// `l`
        const PRINT_LIST = 1 << 9;
        /// `r`: `:&&` / `:~` use the last search pattern.
        const USE_LAST_SEARCH = 1 << 10;
    }
}

impl SubstituteFlags {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '&' => Self::USE_PREVIOUS_FLAGS,
            'c' => Self::CONFIRM,
            'e' => Self::SUPPRESS_ERRORS,
            'g' => Self::GLOBAL,
            'i' => Self::IGNORE_CASE,
            'I' => Self::MATCH_CASE,
            'n' => Self::COUNT_ONLY,
            'p' => Self::PRINT,
            '#' => Self::PRINT_NUMBER,
            'l' => Self::PRINT_LIST,
            'r' => Self::USE_LAST_SEARCH,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSearch {
    pub pattern: String,
    pub direction: SearchDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstituteMemory {
    pub pattern: String,
    pub replacement: String,
    pub flags: SubstituteFlags,
}

/// Dynamically typed expression value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SessionState {
    pub last_search: Option<LastSearch>,
    pub last_substitute: Option<SubstituteMemory>,
    pub last_shell_command: Option<String>,
    pub last_command_line: Option<String>,
    pub previous_dir: Option<PathBuf>,
    variables: BTreeMap<String, Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_search(&mut self, pattern: &str, direction: SearchDirection) {
        trace!(target: "state.session", pattern, ?direction, "record_search");
        self.last_search = Some(LastSearch {
            pattern: pattern.to_string(),
            direction,
        });
    }

    pub fn last_search_pattern(&self) -> Option<&str> {
        self.last_search.as_ref().map(|s| s.pattern.as_str())
    }

    pub fn record_substitute(&mut self, pattern: &str, replacement: &str, flags: SubstituteFlags) {
        trace!(target: "state.session", pattern, replacement, flags = flags.bits(), "record_substitute");
        self.last_substitute = Some(SubstituteMemory {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            flags,
        });
    }

    pub fn record_shell_command(&mut self, command: &str) {
        self.last_shell_command = Some(command.to_string());
    }

    pub fn record_command_line(&mut self, line: &str) {
        self.last_command_line = Some(line.to_string());
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        trace!(target: "state.session", name, %value, "let");
        self.variables.insert(name.to_string(), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_letters() {
        let f: SubstituteFlags = "gci"
            .chars()
            .filter_map(SubstituteFlags::from_char)
            .collect();
        assert_eq!(
            f,
            SubstituteFlags::GLOBAL | SubstituteFlags::CONFIRM | SubstituteFlags::IGNORE_CASE
        );
        assert!(SubstituteFlags::from_char('z').is_none());
    }

    #[test]
    fn substitute_memory_overwrites() {
        let mut s = SessionState::new();
        s.record_substitute("a", "b", SubstituteFlags::GLOBAL);
        s.record_substitute("x", "y", SubstituteFlags::empty());
        let m = s.last_substitute.as_ref().unwrap();
        assert_eq!((m.pattern.as_str(), m.replacement.as_str()), ("x", "y"));
        assert!(m.flags.is_empty());
    }

    #[test]
    fn variables_roundtrip_display() {
        let mut s = SessionState::new();
        s.set_variable("n", Value::Integer(3));
        assert_eq!(s.variable("n").unwrap().to_string(), "3");
        assert!(s.variable("m").is_none());
    }
}
