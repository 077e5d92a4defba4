//! Parsed command model: addresses, range specifications and the closed set
//! of commands the interpreter executes.
//!
//! Addresses and ranges are *unresolved* here. They are turned into concrete
//! 0-based line numbers against the current buffer by `address` / `range`
//! at execution time, so a `Command` value can be stored and replayed (`:g`).

use crate::expr::Expr;
use bitflags::bitflags;
use core_keymap::MapModes;
use core_state::SubstituteFlags;
use std::path::PathBuf;

/// One line address, as written by the user (numbers are 1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAddress {
    /// `.`
    Current,
    /// `$`
    Last,
    /// Absolute 1-based line number. `0` is only meaningful as an insertion
    /// point ("before the first line").
    Number(usize),
    /// `'x`
    Mark(char),
    /// `/pattern/`
    NextMatch(String),
    /// `?pattern?`
    PrevMatch(String),
    /// `base+k` / `base-k`
    Offset(Box<LineAddress>, i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRangeSpec {
    /// No range was written; the command's `DefaultRange` applies.
    None,
    /// `%`
    Entire,
    Single(LineAddress),
    /// `a,b` or `a;b` (`move_caret_first` for `;`).
    Pair {
        left: LineAddress,
        right: LineAddress,
        move_caret_first: bool,
    },
    /// Trailing count: `count` lines starting at the last line of `range`.
    WithCount { range: Box<LineRangeSpec>, count: i64 },
    /// Range of a `:join`, which defaults differently from everything else.
    Join {
        range: Box<LineRangeSpec>,
        count: Option<i64>,
    },
}

impl LineRangeSpec {
    pub fn is_none(&self) -> bool {
        matches!(self, LineRangeSpec::None)
    }

    /// The address a single-line command (put, read, mark) acts on: the
    /// last address of the range.
    pub fn last_address(&self) -> Option<LineAddress> {
        match self {
            LineRangeSpec::None => None,
            LineRangeSpec::Entire => Some(LineAddress::Last),
            LineRangeSpec::Single(a) => Some(a.clone()),
            LineRangeSpec::Pair { right, .. } => Some(right.clone()),
            LineRangeSpec::WithCount { range, .. } | LineRangeSpec::Join { range, .. } => {
                range.last_address()
            }
        }
    }
}

/// What a command operates on when no range was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRange {
    NoDefault,
    CurrentLine,
    EntireBuffer,
}

/// Resolved, inclusive, 0-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    pub fn count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }
}

bitflags! {
    /// Output decorations for `:print` and friends.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PrintFlags: u8 {
        const NUMBER = 1;
        const LIST = 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSource {
    /// `None` reads the current file.
    File(Option<PathBuf>),
    Shell(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteTarget {
    File(Option<PathBuf>),
    Shell(String),
}

/// One `:set` argument. `token` keeps the text as typed for messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetArgument {
    pub op: SetOp,
    pub token: String,
}

impl SetArgument {
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOp {
    /// Bare `:set`: options that differ from their default.
    ShowChanged,
    /// `:set all`
    ShowAll,
    /// `:set termcap`
    ShowTermcap,
    /// `:set name` (turn a toggle on, show anything else)
    UseSetting(String),
    /// `:set noname`
    ResetSetting(String),
    /// `:set invname` / `:set name!`
    InvertSetting(String),
    /// `:set name&`
    Default(String),
    /// `:set name?`
    Query(String),
    Assign { name: String, value: String },
    Add { name: String, value: String },
    Multiply { name: String, value: String },
    Subtract { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A bare range: move the caret.
    Jump { range: LineRangeSpec },
    Search { pattern: String, backward: bool },
    Delete { range: LineRangeSpec, register: Option<char> },
    Yank { range: LineRangeSpec, register: Option<char> },
    Put {
        range: LineRangeSpec,
        register: Option<char>,
        before: bool,
    },
    Copy { range: LineRangeSpec, destination: LineAddress },
    Move { range: LineRangeSpec, destination: LineAddress },
    Join { range: LineRangeSpec, keep_spaces: bool },
    Shift {
        range: LineRangeSpec,
        direction: ShiftDirection,
        amount: usize,
    },
    Retab {
        range: LineRangeSpec,
        all: bool,
        tabstop: Option<usize>,
    },
    Mark { range: LineRangeSpec, name: char },
    Print { range: LineRangeSpec, flags: PrintFlags },
    Global {
        range: LineRangeSpec,
        pattern: String,
        matching: bool,
        command: Box<Command>,
    },
    Substitute {
        range: LineRangeSpec,
        pattern: String,
        replacement: String,
        flags: SubstituteFlags,
    },
    /// `:s` without a pattern, `:&`, `:&&` and `:~`.
    SubstituteRepeat {
        range: LineRangeSpec,
        flags: SubstituteFlags,
        use_last_search: bool,
    },
    Set { args: Vec<SetArgument> },
    Map {
        modes: MapModes,
        lhs: Option<String>,
        rhs: Option<String>,
        noremap: bool,
    },
    Unmap { modes: MapModes, lhs: String },
    MapClear { modes: MapModes },
    Undo,
    Redo,
    Write {
        range: LineRangeSpec,
        force: bool,
        append: bool,
        target: WriteTarget,
    },
    WriteAll,
    /// `:wq` and `:x` (`only_if_modified`).
    WriteQuit {
        force: bool,
        path: Option<PathBuf>,
        only_if_modified: bool,
    },
    Quit { force: bool, all: bool },
    Edit { force: bool, path: Option<PathBuf> },
    Read { range: LineRangeSpec, source: ReadSource },
    Source { path: PathBuf },
    ChangeDirectory { path: Option<String> },
    PrintWorkingDirectory,
    Make { args: String },
    Shell { command: String },
    Filter { range: LineRangeSpec, command: String },
    Marks { names: Option<String> },
    Registers { names: Option<String> },
    Echo { exprs: Vec<Expr> },
    Let { name: String, expr: Expr },
    Fold { range: LineRangeSpec },
    Split { vertical: bool, file: Option<String> },
    Close { force: bool },
}

impl Command {
    /// Short name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Jump { .. } => "jump",
            Command::Search { .. } => "search",
            Command::Delete { .. } => "delete",
            Command::Yank { .. } => "yank",
            Command::Put { .. } => "put",
            Command::Copy { .. } => "copy",
            Command::Move { .. } => "move",
            Command::Join { .. } => "join",
            Command::Shift { .. } => "shift",
            Command::Retab { .. } => "retab",
            Command::Mark { .. } => "mark",
            Command::Print { .. } => "print",
            Command::Global { .. } => "global",
            Command::Substitute { .. } => "substitute",
            Command::SubstituteRepeat { .. } => "substitute_repeat",
            Command::Set { .. } => "set",
            Command::Map { .. } => "map",
            Command::Unmap { .. } => "unmap",
            Command::MapClear { .. } => "mapclear",
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::Write { .. } => "write",
            Command::WriteAll => "wall",
            Command::WriteQuit { .. } => "write_quit",
            Command::Quit { .. } => "quit",
            Command::Edit { .. } => "edit",
            Command::Read { .. } => "read",
            Command::Source { .. } => "source",
            Command::ChangeDirectory { .. } => "cd",
            Command::PrintWorkingDirectory => "pwd",
            Command::Make { .. } => "make",
            Command::Shell { .. } => "shell",
            Command::Filter { .. } => "filter",
            Command::Marks { .. } => "marks",
            Command::Registers { .. } => "registers",
            Command::Echo { .. } => "echo",
            Command::Let { .. } => "let",
            Command::Fold { .. } => "fold",
            Command::Split { .. } => "split",
            Command::Close { .. } => "close",
        }
    }
}
