//! Error type shared by the parser, resolvers and command handlers.
//!
//! Every failure a command can report surfaces as one `ExError`; its
//! `Display` text is what ends up in the status line.

use core_keymap::KeymapError;
use core_state::{MarkError, OptionError, RegisterError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExError {
    #[error("Invalid address")]
    InvalidAddress,
    #[error("Invalid range")]
    InvalidRange,
    #[error("Pattern not found: {0}")]
    PatternNotFound(String),
    #[error("option not supported: {0}")]
    Unsupported(String),
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Not an editor command: {0}")]
    NotAnEditorCommand(String),
    #[error("Trailing characters: {0}")]
    TrailingCharacters(String),
    #[error("No such mapping")]
    NoMapping,
    #[error("No write since last change (add ! to override)")]
    NoWriteSinceLastChange,
    #[error("File exists (add ! to override): {0}")]
    FileExists(String),
    #[error("Conversion error, characters would be lost (add ! to override): {0}")]
    LossyConversion(String),
    #[error("Can't open file {0}")]
    CantOpenFile(String),
    #[error("{target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("shell returned {0}")]
    ShellReturned(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("No file name")]
    NoFileName,
    #[error("No previous regular expression")]
    NoPreviousPattern,
    #[error("No previous substitute regular expression")]
    NoPreviousSubstitute,
    #[error("No previous command")]
    NoPreviousCommand,
    #[error("No previous directory")]
    NoPreviousDirectory,
    #[error("Nothing in register {0}")]
    RegisterEmpty(char),
    #[error("Invalid register name: {0}")]
    InvalidRegister(char),
    #[error("Invalid mark name: {0}")]
    InvalidMark(char),
    #[error("Cannot move a range of lines into itself")]
    MoveIntoItself,
    #[error("Cannot do {0} recursively")]
    Recursive(&'static str),
    #[error("{0}")]
    Expression(String),
}

impl ExError {
    pub(crate) fn io(target: impl std::fmt::Display, source: std::io::Error) -> Self {
        ExError::Io {
            target: target.to_string(),
            source,
        }
    }
}

impl From<OptionError> for ExError {
    fn from(e: OptionError) -> Self {
        match e {
            OptionError::Unknown(name) => ExError::UnknownOption(name),
            OptionError::InvalidValue { name, value } => {
                ExError::InvalidArgument(format!("{name}={value}"))
            }
            OptionError::NotToggle(name) => ExError::InvalidArgument(name),
        }
    }
}

impl From<KeymapError> for ExError {
    fn from(e: KeymapError) -> Self {
        match e {
            KeymapError::NoMapping => ExError::NoMapping,
            KeymapError::EmptyLhs => ExError::InvalidArgument("empty key sequence".into()),
        }
    }
}

impl From<RegisterError> for ExError {
    fn from(e: RegisterError) -> Self {
        match e {
            RegisterError::InvalidName(c) => ExError::InvalidRegister(c),
        }
    }
}

impl From<MarkError> for ExError {
    fn from(e: MarkError) -> Self {
        match e {
            MarkError::InvalidName(c) => ExError::InvalidMark(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_the_token() {
        assert_eq!(
            ExError::Unsupported("ts+=2".into()).to_string(),
            "option not supported: ts+=2"
        );
    }

    #[test]
    fn option_errors_convert() {
        let e: ExError = OptionError::InvalidValue {
            name: "tabstop".into(),
            value: "x".into(),
        }
        .into();
        assert_eq!(e.to_string(), "Invalid argument: tabstop=x");
        let e: ExError = OptionError::Unknown("bogus".into()).into();
        assert!(matches!(e, ExError::UnknownOption(ref n) if n == "bogus"));
    }
}
