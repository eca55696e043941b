use core::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 1-based position in the source text, only used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Translates a byte offset into `source` to a line and column.
    pub fn locate(source: &str, offset: usize) -> Self {
        let before = &source[..offset.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |line| line.chars().count()) + 1;

        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unexpected end of input while parsing string literal")]
    UnterminatedString,
    #[error("invalid escape sequence: \\{0}")]
    InvalidEscape(char),
    #[error("unexpected end of input while parsing list: missing ')'")]
    UnterminatedList,
    #[error("unexpected ')'")]
    UnexpectedCloseParen,
    #[error("unexpected character")]
    UnexpectedCharacter,
}

#[derive(Debug, Error)]
pub enum WispError {
    #[error("syntax error at {location}: {kind}")]
    Syntax {
        kind: SyntaxErrorKind,
        location: Location,
    },

    #[error("undefined variable: '{0}'")]
    UndefinedVariable(String),

    #[error("not a function: {0}")]
    NotCallable(String),

    #[error("{form}: expected {expected} arguments, got {found}")]
    Arity {
        form: String,
        expected: String,
        found: usize,
    },

    #[error("{context}: expected {expected}, got {found}")]
    Type {
        context: String,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The category of a [`WispError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    SyntaxError,
    UndefinedVariableError,
    NotCallableError,
    ArityError,
    TypeError,
    IoError,
}

impl WispError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::SyntaxError,
            Self::UndefinedVariable(_) => ErrorKind::UndefinedVariableError,
            Self::NotCallable(_) => ErrorKind::NotCallableError,
            Self::Arity { .. } => ErrorKind::ArityError,
            Self::Type { .. } => ErrorKind::TypeError,
            Self::Io(_) => ErrorKind::IoError,
        }
    }

    pub(crate) fn arity(form: impl Into<String>, expected: impl Into<String>, found: usize) -> Self {
        Self::Arity { form: form.into(), expected: expected.into(), found }
    }

    pub(crate) fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::Type { context: context.into(), expected: expected.into(), found: found.into() }
    }
}
