//! `:echo` / `:let` expressions.
//!
//! The grammar is parsed in full (literals, variables, unary and binary
//! operators with the usual precedence) but evaluation only implements
//! integer addition; any other operator reports "option not supported".

use crate::error::ExError;
use core_state::{SessionState, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Concat,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Concat => ".",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => 3,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Concat => 4,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Integer(i64),
    String(String),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Numeric value of a string operand: its leading integer, or 0.
fn to_number(value: &Value) -> i64 {
    match value {
        Value::Integer(n) => *n,
        Value::String(s) => {
            let s = s.trim_start();
            let digits = s
                .char_indices()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '-'))
                .count();
            s[..digits].parse().unwrap_or(0)
        }
    }
}

pub fn evaluate(expr: &Expr, session: &SessionState) -> Result<Value, ExError> {
    match expr {
        Expr::Integer(n) => Ok(Value::Integer(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Variable(name) => session
            .variable(name)
            .cloned()
            .ok_or_else(|| ExError::Expression(format!("Undefined variable: {name}"))),
        Expr::Unary(UnaryOp::Negate, _) => Err(ExError::Unsupported("-".into())),
        Expr::Unary(UnaryOp::Not, _) => Err(ExError::Unsupported("!".into())),
        Expr::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        } => {
            let l = to_number(&evaluate(lhs, session)?);
            let r = to_number(&evaluate(rhs, session)?);
            Ok(Value::Integer(l.wrapping_add(r)))
        }
        Expr::Binary { op, .. } => Err(ExError::Unsupported(op.symbol().into())),
    }
}

/// Parse expressions from `src` until it is exhausted (`:echo a b`).
pub fn parse_expr_list(src: &str) -> Result<Vec<Expr>, ExError> {
    let mut p = ExprParser::new(src);
    let mut out = Vec::new();
    loop {
        p.skip_ws();
        if p.at_end() {
            return Ok(out);
        }
        out.push(p.expr(0)?);
    }
}

/// Parse exactly one expression.
pub fn parse_expr(src: &str) -> Result<Expr, ExError> {
    let mut p = ExprParser::new(src);
    let e = p.expr(0)?;
    p.skip_ws();
    if !p.at_end() {
        return Err(ExError::TrailingCharacters(p.rest().to_string()));
    }
    Ok(e)
}

struct ExprParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn peek_op(&self) -> Option<(BinaryOp, usize)> {
        const OPS: &[(&str, BinaryOp)] = &[
            ("||", BinaryOp::Or),
            ("&&", BinaryOp::And),
            ("==", BinaryOp::Equal),
            ("!=", BinaryOp::NotEqual),
            ("<=", BinaryOp::LessEqual),
            (">=", BinaryOp::GreaterEqual),
            ("<", BinaryOp::Less),
            (">", BinaryOp::Greater),
            ("+", BinaryOp::Add),
            ("-", BinaryOp::Subtract),
            (".", BinaryOp::Concat),
            ("*", BinaryOp::Multiply),
            ("/", BinaryOp::Divide),
            ("%", BinaryOp::Modulo),
        ];
        let rest = self.rest();
        OPS.iter()
            .find(|(s, _)| rest.starts_with(s))
            .map(|(s, op)| (*op, s.len()))
    }

    /// Precedence climbing; `min` is the lowest operator precedence accepted.
    fn expr(&mut self, min: u8) -> Result<Expr, ExError> {
        let mut lhs = self.unary()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            let Some((op, len)) = self.peek_op().filter(|(op, _)| op.precedence() >= min) else {
                self.pos = save;
                return Ok(lhs);
            };
            self.pos += len;
            let rhs = self.expr(op.precedence() + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ExError> {
        self.skip_ws();
        let op = match self.rest().chars().next() {
            Some('-') => UnaryOp::Negate,
            Some('!') => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.pos += 1;
        if op == UnaryOp::Negate {
            // Negative literals are plain integers.
            return Ok(match self.primary()? {
                Expr::Integer(n) => Expr::Integer(-n),
                other => Expr::Unary(op, Box::new(other)),
            });
        }
        Ok(Expr::Unary(op, Box::new(self.unary()?)))
    }

    fn primary(&mut self) -> Result<Expr, ExError> {
        self.skip_ws();
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Err(ExError::Expression("Expected expression".into()));
        };
        match c {
            '0'..='9' => {
                let len = rest.bytes().take_while(u8::is_ascii_digit).count();
                let n = rest[..len]
                    .parse()
                    .map_err(|_| ExError::Expression(format!("Invalid number: {}", &rest[..len])))?;
                self.pos += len;
                Ok(Expr::Integer(n))
            }
            '"' => self.double_quoted(),
            '\'' => self.single_quoted(),
            '(' => {
                self.pos += 1;
                let e = self.expr(0)?;
                self.skip_ws();
                if !self.rest().starts_with(')') {
                    return Err(ExError::Expression("Missing ')'".into()));
                }
                self.pos += 1;
                Ok(e)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let len = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
                    .unwrap_or(rest.len());
                self.pos += len;
                Ok(Expr::Variable(rest[..len].to_string()))
            }
            other => Err(ExError::Expression(format!("Invalid expression: {other}"))),
        }
    }

    fn double_quoted(&mut self) -> Result<Expr, ExError> {
        let mut out = String::new();
        let mut chars = self.rest().char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(Expr::String(out));
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, 'e')) => out.push('\x1b'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(ExError::Expression("Missing quote".into()))
    }

    fn single_quoted(&mut self) -> Result<Expr, ExError> {
        let mut out = String::new();
        let body = &self.rest()[1..];
        let mut chars = body.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if chars.peek().is_some_and(|(_, n)| *n == '\'') {
                    chars.next();
                    out.push('\'');
                    continue;
                }
                self.pos += i + 2;
                return Ok(Expr::String(out));
            }
            out.push(c);
        }
        Err(ExError::Expression("Missing quote".into()))
    }
}
