//! A lexer and LL(1) syntax checker for the DeCo teaching language.

pub use crate::grammar::{NonTerminal, Symbol, TokenSet};
pub use crate::lexing::Lexer;
pub use crate::parser_diagnostics::{Diagnostics, LexError, ParseError, SyntaxError};
pub use crate::parsing::{parse, Parser};
pub use crate::token::{Token, TokenKind};

pub mod grammar;
pub(crate) mod inspect;
pub mod lexing;
pub mod parser_diagnostics;
pub mod parsing;
pub mod token;
pub(crate) mod util;
