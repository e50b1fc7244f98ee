use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::grammar::Symbol;
use crate::token::TokenKind;

/// Problems found while scanning. The lexer still hands out an `ERROR`
/// token for each of these, so scanning never stops early.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type")]
pub enum LexError {
    #[error("LexicalError({line},{column})[Invalid token `{lexeme}`.]")]
    InvalidToken {
        line: u32,
        column: u32,
        lexeme: String,
    },
    #[error("LexicalError({line},{column})[Lexeme is {len} characters long; the limit is {limit}.]")]
    TooLong {
        line: u32,
        column: u32,
        len: usize,
        limit: usize,
    },
    #[error("LexicalError({line},{column})[Missing closing */.]")]
    UnterminatedComment { line: u32, column: u32 },
}

impl LexError {
    pub fn position(&self) -> (u32, u32) {
        use LexError::*;
        match self {
            InvalidToken { line, column, .. } => (*line, *column),
            TooLong { line, column, .. } => (*line, *column),
            UnterminatedComment { line, column } => (*line, *column),
        }
    }
}

/// An accept-or-fail mismatch: the parser wanted `expected` but the current
/// token was of kind `actual`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("SyntaxError({line},{column})[Expected {expected} but got {actual}.]")]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    pub expected: Symbol,
    pub actual: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(untagged)]
pub enum ParseError {
    #[error(transparent)]
    Lexical(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl ParseError {
    pub fn position(&self) -> (u32, u32) {
        match self {
            ParseError::Lexical(e) => e.position(),
            ParseError::Syntax(e) => (e.line, e.column),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ParseError::Syntax(_))
    }
}

/// The append-only log of syntax errors recorded during a walk.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<SyntaxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: SyntaxError) {
        self.entries.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyntaxError> {
        self.entries.iter()
    }

    /// Writes the report header followed by one line per diagnostic.
    /// Writes nothing when the log is empty.
    pub fn write_report<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        writeln!(out, "ERROR REPORT:")?;
        writeln!(out, "{}", "-".repeat(68))?;
        for error in &self.entries {
            writeln!(out, "{}", error)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a SyntaxError;
    type IntoIter = std::slice::Iter<'a, SyntaxError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
