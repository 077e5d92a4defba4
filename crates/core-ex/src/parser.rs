//! Command line parsing: `[range] name[!] [args]` -> `Command`.
//!
//! Parsing is pure; nothing here looks at the buffer. Addresses stay
//! symbolic and are resolved when the command runs.
//!
//! Command names may be abbreviated down to a per-command minimum
//! (`:s`, `:se`, `:norem` ...). The table below lists each full name with the
//! shortest accepted prefix length.

use crate::command::{
    Command, LineAddress, LineRangeSpec, PrintFlags, ReadSource, SetArgument, SetOp,
    ShiftDirection, WriteTarget,
};
use crate::error::ExError;
use crate::expr::{parse_expr, parse_expr_list};
use core_keymap::MapModes;
use core_state::{Options, SubstituteFlags};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    ChangeDirectory,
    Close,
    Copy,
    Delete,
    Echo,
    Edit,
    Fold,
    Global,
    Join,
    Let,
    List,
    Make,
    Map(MapModes),
    NoRemap(MapModes),
    Unmap(MapModes),
    MapClear(MapModes),
    Mark,
    Marks,
    Move,
    Number,
    Print,
    Put,
    Pwd,
    Quit,
    QuitAll,
    Read,
    Redo,
    Registers,
    Retab,
    Set,
    Source,
    Split,
    Substitute,
    Undo,
    VGlobal,
    VSplit,
    Write,
    WriteAll,
    WriteQuit,
    Xit,
    Yank,
}

const NVO: MapModes = MapModes::NVO;
const VS: MapModes = MapModes::VISUAL.union(MapModes::SELECT);

/// (full name, minimum abbreviation length, kind)
const COMMANDS: &[(&str, usize, Kind)] = &[
    ("cd", 2, Kind::ChangeDirectory),
    ("chdir", 3, Kind::ChangeDirectory),
    ("close", 3, Kind::Close),
    ("copy", 2, Kind::Copy),
    ("cmap", 2, Kind::Map(MapModes::CMDLINE)),
    ("cnoremap", 3, Kind::NoRemap(MapModes::CMDLINE)),
    ("cunmap", 2, Kind::Unmap(MapModes::CMDLINE)),
    ("cmapclear", 5, Kind::MapClear(MapModes::CMDLINE)),
    ("delete", 1, Kind::Delete),
    ("display", 2, Kind::Registers),
    ("echo", 2, Kind::Echo),
    ("edit", 1, Kind::Edit),
    ("fold", 2, Kind::Fold),
    ("global", 1, Kind::Global),
    ("imap", 2, Kind::Map(MapModes::INSERT)),
    ("inoremap", 3, Kind::NoRemap(MapModes::INSERT)),
    ("iunmap", 2, Kind::Unmap(MapModes::INSERT)),
    ("imapclear", 5, Kind::MapClear(MapModes::INSERT)),
    ("join", 1, Kind::Join),
    ("k", 1, Kind::Mark),
    ("list", 1, Kind::List),
    ("let", 3, Kind::Let),
    ("lmap", 2, Kind::Map(MapModes::LANG)),
    ("lnoremap", 2, Kind::NoRemap(MapModes::LANG)),
    ("lunmap", 2, Kind::Unmap(MapModes::LANG)),
    ("lmapclear", 5, Kind::MapClear(MapModes::LANG)),
    ("move", 1, Kind::Move),
    ("mark", 2, Kind::Mark),
    ("marks", 5, Kind::Marks),
    ("map", 3, Kind::Map(NVO)),
    ("mapclear", 4, Kind::MapClear(NVO)),
    ("make", 3, Kind::Make),
    ("number", 2, Kind::Number),
    ("nmap", 2, Kind::Map(MapModes::NORMAL)),
    ("nnoremap", 2, Kind::NoRemap(MapModes::NORMAL)),
    ("nunmap", 3, Kind::Unmap(MapModes::NORMAL)),
    ("nmapclear", 5, Kind::MapClear(MapModes::NORMAL)),
    ("noremap", 2, Kind::NoRemap(NVO)),
    ("omap", 2, Kind::Map(MapModes::OP_PENDING)),
    ("onoremap", 3, Kind::NoRemap(MapModes::OP_PENDING)),
    ("ounmap", 2, Kind::Unmap(MapModes::OP_PENDING)),
    ("omapclear", 5, Kind::MapClear(MapModes::OP_PENDING)),
    ("print", 1, Kind::Print),
    ("put", 2, Kind::Put),
    ("pwd", 2, Kind::Pwd),
    ("quit", 1, Kind::Quit),
    ("qall", 2, Kind::QuitAll),
    ("quitall", 5, Kind::QuitAll),
    ("read", 1, Kind::Read),
    ("redo", 3, Kind::Redo),
    ("registers", 3, Kind::Registers),
    ("retab", 3, Kind::Retab),
    ("substitute", 1, Kind::Substitute),
    ("set", 2, Kind::Set),
    ("source", 2, Kind::Source),
    ("split", 2, Kind::Split),
    ("smap", 4, Kind::Map(MapModes::SELECT)),
    ("snoremap", 4, Kind::NoRemap(MapModes::SELECT)),
    ("sunmap", 4, Kind::Unmap(MapModes::SELECT)),
    ("smapclear", 5, Kind::MapClear(MapModes::SELECT)),
    ("t", 1, Kind::Copy),
    ("undo", 1, Kind::Undo),
    ("unmap", 3, Kind::Unmap(NVO)),
    ("vglobal", 1, Kind::VGlobal),
    ("vsplit", 2, Kind::VSplit),
    ("vmap", 2, Kind::Map(VS)),
    ("vnoremap", 2, Kind::NoRemap(VS)),
    ("vunmap", 2, Kind::Unmap(VS)),
    ("vmapclear", 5, Kind::MapClear(VS)),
    ("write", 1, Kind::Write),
    ("wall", 2, Kind::WriteAll),
    ("wq", 2, Kind::WriteQuit),
    ("xit", 1, Kind::Xit),
    ("xmap", 2, Kind::Map(MapModes::VISUAL)),
    ("xnoremap", 2, Kind::NoRemap(MapModes::VISUAL)),
    ("xunmap", 2, Kind::Unmap(MapModes::VISUAL)),
    ("xmapclear", 5, Kind::MapClear(MapModes::VISUAL)),
    ("yank", 1, Kind::Yank),
];

fn lookup(name: &str) -> Option<Kind> {
    COMMANDS
        .iter()
        .find(|(full, min, _)| name.len() >= *min && full.starts_with(name))
        .map(|(_, _, kind)| *kind)
}

/// Scanner over one command line.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            return true;
        }
        false
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn number(&mut self) -> Option<usize> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return None;
        }
        // Absurdly long counts saturate rather than fail.
        Some(digits.parse().unwrap_or(usize::MAX))
    }

    fn count(&mut self) -> Option<i64> {
        self.skip_ws();
        self.number().map(|n| i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Text up to an unescaped `delim`; `\delim` becomes `delim`, other
    /// escapes are kept. Returns the text and whether `delim` was found.
    fn delimited(&mut self, delim: char) -> (String, bool) {
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == delim {
                return (out, true);
            }
            if c == '\\'
                && let Some(next) = self.bump()
            {
                if next != delim {
                    out.push('\\');
                }
                out.push(next);
                continue;
            }
            out.push(c);
        }
        (out, false)
    }

    /// Remaining text trimmed, `None` when blank.
    fn argument(&mut self) -> Option<String> {
        let arg = self.rest().trim();
        self.pos = self.src.len();
        (!arg.is_empty()).then(|| arg.to_string())
    }

    fn finish(&mut self) -> Result<(), ExError> {
        self.skip_ws();
        if self.at_end() {
            Ok(())
        } else {
            Err(ExError::TrailingCharacters(self.rest().to_string()))
        }
    }
}

fn is_pattern_delimiter(c: char) -> bool {
    !(c.is_alphanumeric() || c.is_whitespace() || matches!(c, '"' | '|' | '\\'))
}

fn with_count(range: LineRangeSpec, count: Option<i64>) -> LineRangeSpec {
    match count {
        Some(count) => LineRangeSpec::WithCount {
            range: Box::new(range),
            count,
        },
        None => range,
    }
}

fn argument_required() -> ExError {
    ExError::InvalidArgument("argument required".into())
}

pub struct CommandParser;

impl CommandParser {
    /// Parse one command line. Blank lines and `"` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, ExError> {
        let mut cur = Cursor::new(line);
        loop {
            cur.skip_ws();
            if !cur.eat(':') {
                break;
            }
        }
        if cur.at_end() || cur.peek() == Some('"') {
            return Ok(None);
        }
        let range = parse_range(&mut cur)?;
        cur.skip_ws();
        if cur.at_end() {
            return Ok(Some(match range {
                LineRangeSpec::Single(LineAddress::NextMatch(pattern)) => Command::Search {
                    pattern,
                    backward: false,
                },
                LineRangeSpec::Single(LineAddress::PrevMatch(pattern)) => Command::Search {
                    pattern,
                    backward: true,
                },
                range => Command::Jump { range },
            }));
        }
        parse_command(&mut cur, range).map(Some)
    }
}

fn parse_range(cur: &mut Cursor<'_>) -> Result<LineRangeSpec, ExError> {
    cur.skip_ws();
    if cur.eat('%') {
        return Ok(LineRangeSpec::Entire);
    }
    let mut spec = match parse_address(cur)? {
        Some(a) => LineRangeSpec::Single(a),
        None => LineRangeSpec::None,
    };
    loop {
        cur.skip_ws();
        let move_caret_first = match cur.peek() {
            Some(',') => false,
            Some(';') => true,
            _ => break,
        };
        cur.bump();
        let left = match std::mem::replace(&mut spec, LineRangeSpec::None) {
            LineRangeSpec::Single(a) => a,
            LineRangeSpec::Pair { right, .. } => right,
            _ => LineAddress::Current,
        };
        let right = parse_address(cur)?.unwrap_or(LineAddress::Current);
        spec = LineRangeSpec::Pair {
            left,
            right,
            move_caret_first,
        };
    }
    Ok(spec)
}

fn parse_address(cur: &mut Cursor<'_>) -> Result<Option<LineAddress>, ExError> {
    cur.skip_ws();
    let base = match cur.peek() {
        Some('.') => {
            cur.bump();
            Some(LineAddress::Current)
        }
        Some('$') => {
            cur.bump();
            Some(LineAddress::Last)
        }
        Some(c) if c.is_ascii_digit() => cur.number().map(LineAddress::Number),
        Some('\'') => {
            cur.bump();
            Some(LineAddress::Mark(cur.bump().ok_or(ExError::InvalidAddress)?))
        }
        Some(d @ ('/' | '?')) => {
            cur.bump();
            let (pattern, _) = cur.delimited(d);
            Some(if d == '/' {
                LineAddress::NextMatch(pattern)
            } else {
                LineAddress::PrevMatch(pattern)
            })
        }
        _ => None,
    };
    let mut offset: i64 = 0;
    let mut has_offset = false;
    while let Some(sign @ ('+' | '-')) = cur.peek() {
        cur.bump();
        let n = cur
            .number()
            .map_or(1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        offset = if sign == '+' {
            offset.saturating_add(n)
        } else {
            offset.saturating_sub(n)
        };
        has_offset = true;
    }
    Ok(match (base, has_offset) {
        (None, false) => None,
        (base, true) => Some(LineAddress::Offset(
            Box::new(base.unwrap_or(LineAddress::Current)),
            offset,
        )),
        (base, false) => base,
    })
}

fn parse_command(cur: &mut Cursor<'_>, range: LineRangeSpec) -> Result<Command, ExError> {
    let start = cur.pos;
    let name = match cur.peek() {
        Some(c) if c.is_ascii_alphabetic() => cur.take_while(|c| c.is_ascii_alphabetic()),
        _ => {
            cur.bump();
            &cur.src[start..cur.pos]
        }
    };
    match name {
        "&" => return parse_substitute_repeat(cur, range, false),
        "~" => return parse_substitute_repeat(cur, range, true),
        "<" | ">" => return parse_shift(cur, range, name),
        "!" => return parse_bang(cur, range),
        "#" => return parse_print(cur, range, PrintFlags::NUMBER),
        _ => {}
    }
    let kind = match lookup(name) {
        Some(kind) => kind,
        // `:ka` sets mark `a`.
        None if name.starts_with('k') && name.len() == 2 => {
            cur.pos = start + 1;
            Kind::Mark
        }
        None => {
            return Err(ExError::NotAnEditorCommand(
                cur.src[start..].trim_end().to_string(),
            ));
        }
    };
    let bang = kind != Kind::Substitute && cur.eat('!');
    if !range.is_none() && !accepts_range(kind) {
        return Err(ExError::InvalidRange);
    }
    let command = match kind {
        Kind::Delete | Kind::Yank => {
            cur.skip_ws();
            let register = match cur.peek() {
                Some(c) if !c.is_ascii_digit() => cur.bump(),
                _ => None,
            };
            let range = with_count(range, cur.count());
            cur.finish()?;
            if kind == Kind::Delete {
                Command::Delete { range, register }
            } else {
                Command::Yank { range, register }
            }
        }
        Kind::Put => {
            cur.skip_ws();
            let register = cur.bump();
            cur.finish()?;
            Command::Put {
                range,
                register,
                before: bang,
            }
        }
        Kind::Copy | Kind::Move => {
            let destination = parse_address(cur)?.ok_or(ExError::InvalidAddress)?;
            cur.finish()?;
            if kind == Kind::Copy {
                Command::Copy { range, destination }
            } else {
                Command::Move { range, destination }
            }
        }
        Kind::Join => {
            let count = cur.count();
            cur.finish()?;
            Command::Join {
                range: LineRangeSpec::Join {
                    range: Box::new(range),
                    count,
                },
                keep_spaces: bang,
            }
        }
        Kind::Print => return parse_print(cur, range, PrintFlags::empty()),
        Kind::Number => return parse_print(cur, range, PrintFlags::NUMBER),
        Kind::List => return parse_print(cur, range, PrintFlags::LIST),
        Kind::Retab => {
            let tabstop = cur.count().map(|n| usize::try_from(n).unwrap_or(usize::MAX));
            cur.finish()?;
            Command::Retab {
                range,
                all: bang,
                tabstop,
            }
        }
        Kind::Mark => {
            cur.skip_ws();
            let name = cur.bump().ok_or_else(argument_required)?;
            cur.finish()?;
            Command::Mark { range, name }
        }
        Kind::Global | Kind::VGlobal => {
            let matching = !(bang || kind == Kind::VGlobal);
            parse_global(cur, range, matching)?
        }
        Kind::Substitute => return parse_substitute(cur, range),
        Kind::Set => Command::Set {
            args: parse_set_args(cur.rest()),
        },
        Kind::Map(modes) | Kind::NoRemap(modes) => {
            let modes = bang_modes(modes, bang)?;
            let (lhs, rhs) = parse_map_args(cur.rest())?;
            Command::Map {
                modes,
                lhs,
                rhs,
                noremap: matches!(kind, Kind::NoRemap(_)),
            }
        }
        Kind::Unmap(modes) => {
            let modes = bang_modes(modes, bang)?;
            let lhs = cur.argument().ok_or_else(argument_required)?;
            Command::Unmap { modes, lhs }
        }
        Kind::MapClear(modes) => {
            let modes = bang_modes(modes, bang)?;
            cur.finish()?;
            Command::MapClear { modes }
        }
        Kind::Undo => {
            cur.finish()?;
            Command::Undo
        }
        Kind::Redo => {
            cur.finish()?;
            Command::Redo
        }
        Kind::Write => {
            cur.skip_ws();
            let append = cur.rest().starts_with(">>");
            if append {
                cur.pos += 2;
                cur.skip_ws();
            }
            let target = if !append && cur.eat('!') {
                WriteTarget::Shell(cur.argument().ok_or_else(argument_required)?)
            } else {
                WriteTarget::File(cur.argument().map(PathBuf::from))
            };
            Command::Write {
                range,
                force: bang,
                append,
                target,
            }
        }
        Kind::WriteAll => {
            cur.finish()?;
            Command::WriteAll
        }
        Kind::WriteQuit | Kind::Xit => Command::WriteQuit {
            force: bang,
            path: cur.argument().map(PathBuf::from),
            only_if_modified: kind == Kind::Xit,
        },
        Kind::Quit | Kind::QuitAll => {
            cur.finish()?;
            Command::Quit {
                force: bang,
                all: kind == Kind::QuitAll,
            }
        }
        Kind::Edit => Command::Edit {
            force: bang,
            path: cur.argument().map(PathBuf::from),
        },
        Kind::Read => {
            cur.skip_ws();
            let source = if cur.eat('!') {
                ReadSource::Shell(cur.argument().ok_or_else(argument_required)?)
            } else {
                ReadSource::File(cur.argument().map(PathBuf::from))
            };
            Command::Read { range, source }
        }
        Kind::Source => Command::Source {
            path: cur.argument().map(PathBuf::from).ok_or_else(argument_required)?,
        },
        Kind::ChangeDirectory => Command::ChangeDirectory {
            path: cur.argument(),
        },
        Kind::Pwd => {
            cur.finish()?;
            Command::PrintWorkingDirectory
        }
        Kind::Make => Command::Make {
            args: cur.argument().unwrap_or_default(),
        },
        Kind::Marks => Command::Marks {
            names: cur.argument(),
        },
        Kind::Registers => Command::Registers {
            names: cur.argument(),
        },
        Kind::Echo => Command::Echo {
            exprs: parse_expr_list(cur.rest())?,
        },
        Kind::Let => parse_let(cur)?,
        Kind::Fold => {
            cur.finish()?;
            Command::Fold { range }
        }
        Kind::Split | Kind::VSplit => Command::Split {
            vertical: kind == Kind::VSplit,
            file: cur.argument(),
        },
        Kind::Close => {
            cur.finish()?;
            Command::Close { force: bang }
        }
    };
    Ok(command)
}

fn accepts_range(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Copy
            | Kind::Delete
            | Kind::Fold
            | Kind::Global
            | Kind::Join
            | Kind::List
            | Kind::Mark
            | Kind::Move
            | Kind::Number
            | Kind::Print
            | Kind::Put
            | Kind::Read
            | Kind::Retab
            | Kind::Substitute
            | Kind::VGlobal
            | Kind::Write
            | Kind::Yank
    )
}

/// `:map!` family: bang switches the NVO commands to insert + command-line.
fn bang_modes(modes: MapModes, bang: bool) -> Result<MapModes, ExError> {
    match (bang, modes == MapModes::NVO) {
        (false, _) => Ok(modes),
        (true, true) => Ok(MapModes::INSERT_CMDLINE),
        (true, false) => Err(ExError::TrailingCharacters("!".into())),
    }
}

fn parse_print(
    cur: &mut Cursor<'_>,
    range: LineRangeSpec,
    mut flags: PrintFlags,
) -> Result<Command, ExError> {
    let range = with_count(range, cur.count());
    cur.skip_ws();
    while let Some(c) = cur.peek() {
        match c {
            '#' => flags |= PrintFlags::NUMBER,
            'l' => flags |= PrintFlags::LIST,
            'p' => {}
            _ => break,
        }
        cur.bump();
    }
    cur.finish()?;
    Ok(Command::Print { range, flags })
}

fn parse_shift(cur: &mut Cursor<'_>, range: LineRangeSpec, name: &str) -> Result<Command, ExError> {
    let (direction, c) = if name == ">" {
        (ShiftDirection::Right, '>')
    } else {
        (ShiftDirection::Left, '<')
    };
    let mut amount = 1;
    loop {
        cur.skip_ws();
        if !cur.eat(c) {
            break;
        }
        amount += 1;
    }
    let range = with_count(range, cur.count());
    cur.finish()?;
    Ok(Command::Shift {
        range,
        direction,
        amount,
    })
}

fn parse_bang(cur: &mut Cursor<'_>, range: LineRangeSpec) -> Result<Command, ExError> {
    let command = cur.rest().trim_start().to_string();
    cur.pos = cur.src.len();
    if command.is_empty() {
        return Err(argument_required());
    }
    Ok(if range.is_none() {
        Command::Shell { command }
    } else {
        Command::Filter { range, command }
    })
}

fn parse_global(
    cur: &mut Cursor<'_>,
    range: LineRangeSpec,
    matching: bool,
) -> Result<Command, ExError> {
    let delim = cur.bump().ok_or_else(argument_required)?;
    if !is_pattern_delimiter(delim) {
        return Err(ExError::InvalidArgument(format!(
            "regular expression delimiter: {delim}"
        )));
    }
    let (pattern, _) = cur.delimited(delim);
    let command = CommandParser::parse(cur.rest())?.unwrap_or(Command::Print {
        range: LineRangeSpec::None,
        flags: PrintFlags::empty(),
    });
    Ok(Command::Global {
        range,
        pattern,
        matching,
        command: Box::new(command),
    })
}

/// Flag letters after a substitute; `&` is only accepted first.
fn parse_substitute_flags(cur: &mut Cursor<'_>) -> SubstituteFlags {
    let mut flags = SubstituteFlags::empty();
    if cur.eat('&') {
        flags |= SubstituteFlags::USE_PREVIOUS_FLAGS;
    }
    while let Some(c) = cur.peek() {
        match SubstituteFlags::from_char(c) {
            Some(f) if c != '&' => flags |= f,
            _ => break,
        }
        cur.bump();
    }
    flags
}

fn parse_substitute(cur: &mut Cursor<'_>, range: LineRangeSpec) -> Result<Command, ExError> {
    let delim = match cur.peek() {
        Some(c) if is_pattern_delimiter(c) && c != '&' => c,
        _ => return parse_substitute_repeat(cur, range, false),
    };
    cur.bump();
    let (pattern, closed) = cur.delimited(delim);
    let (replacement, closed) = if closed {
        cur.delimited(delim)
    } else {
        (String::new(), false)
    };
    let flags = if closed {
        parse_substitute_flags(cur)
    } else {
        SubstituteFlags::empty()
    };
    let range = with_count(range, cur.count());
    cur.finish()?;
    Ok(Command::Substitute {
        range,
        pattern,
        replacement,
        flags,
    })
}

fn parse_substitute_repeat(
    cur: &mut Cursor<'_>,
    range: LineRangeSpec,
    use_last_search: bool,
) -> Result<Command, ExError> {
    cur.skip_ws();
    let flags = parse_substitute_flags(cur);
    let range = with_count(range, cur.count());
    cur.finish()?;
    Ok(Command::SubstituteRepeat {
        range,
        flags,
        use_last_search,
    })
}

/// Split `:set` arguments on unescaped whitespace and classify each.
pub fn parse_set_args(src: &str) -> Vec<SetArgument> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    if tokens.is_empty() {
        return vec![SetArgument {
            op: SetOp::ShowChanged,
            token: String::new(),
        }];
    }
    tokens
        .into_iter()
        .map(|token| SetArgument {
            op: classify_set_token(&token),
            token,
        })
        .collect()
}

fn classify_set_token(token: &str) -> SetOp {
    match token {
        "all" => return SetOp::ShowAll,
        "termcap" => return SetOp::ShowTermcap,
        _ => {}
    }
    if let Some(at) = token.find(['=', ':']) {
        let (name, value) = (&token[..at], token[at + 1..].to_string());
        let op = |n: &str| n.to_string();
        return match name.chars().last() {
            Some('+') => SetOp::Add {
                name: op(&name[..name.len() - 1]),
                value,
            },
            Some('^') => SetOp::Multiply {
                name: op(&name[..name.len() - 1]),
                value,
            },
            Some('-') => SetOp::Subtract {
                name: op(&name[..name.len() - 1]),
                value,
            },
            _ => SetOp::Assign {
                name: op(name),
                value,
            },
        };
    }
    if let Some(name) = token.strip_suffix('?') {
        return SetOp::Query(name.to_string());
    }
    if let Some(name) = token.strip_suffix('!') {
        return SetOp::InvertSetting(name.to_string());
    }
    if let Some(name) = token.strip_suffix('&') {
        return SetOp::Default(name.to_string());
    }
    if let Some(name) = token.strip_prefix("inv")
        && Options::lookup(name).is_some()
    {
        return SetOp::InvertSetting(name.to_string());
    }
    if let Some(name) = token.strip_prefix("no")
        && Options::lookup(name).is_some()
    {
        return SetOp::ResetSetting(name.to_string());
    }
    SetOp::UseSetting(token.to_string())
}

const IGNORED_MAP_ARGS: &[&str] = &["<silent>", "<nowait>", "<special>", "<unique>"];
const UNSUPPORTED_MAP_ARGS: &[&str] = &["<buffer>", "<script>", "<expr>"];

fn parse_map_args(src: &str) -> Result<(Option<String>, Option<String>), ExError> {
    let mut rest = src.trim_start();
    loop {
        let Some(word) = rest.split_whitespace().next() else {
            return Ok((None, None));
        };
        let lower = word.to_ascii_lowercase();
        if IGNORED_MAP_ARGS.contains(&lower.as_str()) {
            rest = rest[word.len()..].trim_start();
        } else if UNSUPPORTED_MAP_ARGS.contains(&lower.as_str()) {
            return Err(ExError::Unsupported(word.to_string()));
        } else {
            break;
        }
    }
    let (lhs, rhs) = match rest.find(char::is_whitespace) {
        Some(at) => (&rest[..at], rest[at..].trim_start()),
        None => (rest, ""),
    };
    Ok((
        Some(lhs.to_string()),
        (!rhs.is_empty()).then(|| rhs.to_string()),
    ))
}

fn parse_let(cur: &mut Cursor<'_>) -> Result<Command, ExError> {
    cur.skip_ws();
    let name = cur
        .take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        .to_string();
    if name.is_empty() {
        return Err(argument_required());
    }
    cur.skip_ws();
    for op in ["+=", "-=", "*=", "/=", "%=", ".="] {
        if cur.rest().starts_with(op) {
            return Err(ExError::Unsupported(op.to_string()));
        }
    }
    if !cur.eat('=') {
        return Err(ExError::InvalidArgument(format!("expected = after {name}")));
    }
    let expr = parse_expr(cur.rest())?;
    Ok(Command::Let { name, expr })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(line: &str) -> Command {
        CommandParser::parse(line)
            .unwrap_or_else(|e| panic!("{line}: {e}"))
            .unwrap_or_else(|| panic!("{line}: empty"))
    }

    fn num(n: usize) -> LineAddress {
        LineAddress::Number(n)
    }

    #[test]
    fn blank_and_comment_lines() {
        assert!(CommandParser::parse("").unwrap().is_none());
        assert!(CommandParser::parse("  ::  ").unwrap().is_none());
        assert!(CommandParser::parse("\" note").unwrap().is_none());
    }

    #[test]
    fn bare_ranges_jump() {
        assert_eq!(
            parse("5"),
            Command::Jump {
                range: LineRangeSpec::Single(num(5))
            }
        );
        assert_eq!(
            parse("+2"),
            Command::Jump {
                range: LineRangeSpec::Single(LineAddress::Offset(
                    Box::new(LineAddress::Current),
                    2
                ))
            }
        );
        assert_eq!(
            parse("/foo"),
            Command::Search {
                pattern: "foo".into(),
                backward: false
            }
        );
    }

    #[test]
    fn ranges_and_separators() {
        assert_eq!(
            parse("1;$d"),
            Command::Delete {
                range: LineRangeSpec::Pair {
                    left: num(1),
                    right: LineAddress::Last,
                    move_caret_first: true
                },
                register: None
            }
        );
        assert_eq!(
            parse("%y a"),
            Command::Yank {
                range: LineRangeSpec::Entire,
                register: Some('a')
            }
        );
        assert_eq!(
            parse("'a,.-1p"),
            Command::Print {
                range: LineRangeSpec::Pair {
                    left: LineAddress::Mark('a'),
                    right: LineAddress::Offset(Box::new(LineAddress::Current), -1),
                    move_caret_first: false
                },
                flags: PrintFlags::empty()
            }
        );
    }

    #[test]
    fn counts_wrap_the_range() {
        assert_eq!(
            parse("3d x 2"),
            Command::Delete {
                range: LineRangeSpec::WithCount {
                    range: Box::new(LineRangeSpec::Single(num(3))),
                    count: 2
                },
                register: Some('x')
            }
        );
        assert_eq!(
            parse("j 4"),
            Command::Join {
                range: LineRangeSpec::Join {
                    range: Box::new(LineRangeSpec::None),
                    count: Some(4)
                },
                keep_spaces: false
            }
        );
    }

    #[test]
    fn abbreviations_resolve() {
        assert!(matches!(parse("se ts=4"), Command::Set { .. }));
        assert!(matches!(parse("so x.vim"), Command::Source { .. }));
        assert!(matches!(parse("sp"), Command::Split { vertical: false, .. }));
        assert!(matches!(parse("vs"), Command::Split { vertical: true, .. }));
        assert!(matches!(parse("ma a"), Command::Mark { name: 'a', .. }));
        assert!(matches!(parse("kb"), Command::Mark { name: 'b', .. }));
        assert!(matches!(parse("marks"), Command::Marks { names: None }));
        assert!(matches!(parse("reg"), Command::Registers { .. }));
        assert!(matches!(parse("t0"), Command::Copy { destination: LineAddress::Number(0), .. }));
        assert!(matches!(parse("m$"), Command::Move { destination: LineAddress::Last, .. }));
        assert!(matches!(parse("qa!"), Command::Quit { force: true, all: true }));
        assert!(matches!(parse("x"), Command::WriteQuit { only_if_modified: true, .. }));
        assert!(matches!(parse("red"), Command::Redo));
        assert!(matches!(parse("u"), Command::Undo));
    }

    #[test]
    fn unknown_command_is_reported() {
        let e = CommandParser::parse("frobnicate now").unwrap_err();
        assert_eq!(e.to_string(), "Not an editor command: frobnicate now");
    }

    #[test]
    fn range_on_rangeless_command_fails() {
        assert!(matches!(
            CommandParser::parse("3set ts=2"),
            Err(ExError::InvalidRange)
        ));
    }

    #[test]
    fn substitute_forms() {
        assert_eq!(
            parse(r"%s/a\/b/x&/gi 3"),
            Command::Substitute {
                range: LineRangeSpec::WithCount {
                    range: Box::new(LineRangeSpec::Entire),
                    count: 3
                },
                pattern: "a/b".into(),
                replacement: "x&".into(),
                flags: SubstituteFlags::GLOBAL | SubstituteFlags::IGNORE_CASE
            }
        );
        assert_eq!(
            parse("s#x#y"),
            Command::Substitute {
                range: LineRangeSpec::None,
                pattern: "x".into(),
                replacement: "y".into(),
                flags: SubstituteFlags::empty()
            }
        );
        assert_eq!(
            parse("&&"),
            Command::SubstituteRepeat {
                range: LineRangeSpec::None,
                flags: SubstituteFlags::USE_PREVIOUS_FLAGS,
                use_last_search: false
            }
        );
        assert!(matches!(
            parse("~"),
            Command::SubstituteRepeat {
                use_last_search: true,
                ..
            }
        ));
        assert!(matches!(parse("s g"), Command::SubstituteRepeat { .. }));
    }

    #[test]
    fn global_carries_sub_command() {
        let Command::Global {
            range,
            pattern,
            matching,
            command,
        } = parse("g!/^#/s/a/b/")
        else {
            panic!("expected global");
        };
        assert_eq!(range, LineRangeSpec::None);
        assert_eq!(pattern, "^#");
        assert!(!matching);
        assert!(matches!(*command, Command::Substitute { .. }));
        assert!(matches!(
            parse("v/x/"),
            Command::Global {
                matching: false,
                ref command,
                ..
            } if matches!(**command, Command::Print { .. })
        ));
    }

    #[test]
    fn set_argument_classes() {
        let ops: Vec<SetOp> = parse_set_args("ts=4 nonumber invic ws! sw? et& sw+=2 ai all")
            .into_iter()
            .map(|a| a.op)
            .collect();
        assert_eq!(
            ops,
            vec![
                SetOp::Assign {
                    name: "ts".into(),
                    value: "4".into()
                },
                SetOp::ResetSetting("number".into()),
                SetOp::InvertSetting("ic".into()),
                SetOp::InvertSetting("ws".into()),
                SetOp::Query("sw".into()),
                SetOp::Default("et".into()),
                SetOp::Add {
                    name: "sw".into(),
                    value: "2".into()
                },
                SetOp::UseSetting("ai".into()),
                SetOp::ShowAll,
            ]
        );
        assert_eq!(parse_set_args("")[0].op, SetOp::ShowChanged);
        assert_eq!(parse_set_args("number")[0].op, SetOp::UseSetting("number".into()));
    }

    #[test]
    fn map_family() {
        assert_eq!(
            parse("nnoremap <silent> <C-x> :w<CR>"),
            Command::Map {
                modes: MapModes::NORMAL,
                lhs: Some("<C-x>".into()),
                rhs: Some(":w<CR>".into()),
                noremap: true
            }
        );
        assert_eq!(
            parse("map!"),
            Command::Map {
                modes: MapModes::INSERT_CMDLINE,
                lhs: None,
                rhs: None,
                noremap: false
            }
        );
        assert!(matches!(
            parse("vunmap x"),
            Command::Unmap { modes, .. } if modes == MapModes::VISUAL | MapModes::SELECT
        ));
        assert!(matches!(parse("imapc"), Command::MapClear { modes } if modes == MapModes::INSERT));
        assert!(matches!(
            CommandParser::parse("map <buffer> a b"),
            Err(ExError::Unsupported(_))
        ));
    }

    #[test]
    fn files_and_shell() {
        assert_eq!(
            parse("w >> log.txt"),
            Command::Write {
                range: LineRangeSpec::None,
                force: false,
                append: true,
                target: WriteTarget::File(Some("log.txt".into()))
            }
        );
        assert!(matches!(
            parse("w !wc -l"),
            Command::Write { target: WriteTarget::Shell(ref c), .. } if c == "wc -l"
        ));
        assert!(matches!(parse("w! out"), Command::Write { force: true, .. }));
        assert!(matches!(
            parse("0r !date"),
            Command::Read { source: ReadSource::Shell(ref c), .. } if c == "date"
        ));
        assert_eq!(
            parse("!ls -l"),
            Command::Shell {
                command: "ls -l".into()
            }
        );
        assert!(matches!(parse("%!sort"), Command::Filter { .. }));
        assert!(matches!(parse("cd -"), Command::ChangeDirectory { path: Some(ref p) } if p == "-"));
    }

    #[test]
    fn shift_amount_counts_repeats() {
        assert_eq!(
            parse(">> 3"),
            Command::Shift {
                range: LineRangeSpec::WithCount {
                    range: Box::new(LineRangeSpec::None),
                    count: 3
                },
                direction: ShiftDirection::Right,
                amount: 2
            }
        );
    }

    #[test]
    fn let_and_echo() {
        assert!(matches!(parse("let g:x = 1 + 2"), Command::Let { ref name, .. } if name == "g:x"));
        assert!(matches!(
            CommandParser::parse("let x += 1"),
            Err(ExError::Unsupported(ref op)) if op == "+="
        ));
        assert!(matches!(parse("echo 1 'a'"), Command::Echo { ref exprs } if exprs.len() == 2));
    }
}
