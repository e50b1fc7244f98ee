use std::io;
use std::mem;

use crate::grammar::{self, NonTerminal, Symbol};
use crate::lexing::Lexer;
use crate::parser_diagnostics::{Diagnostics, LexError, ParseError, SyntaxError};
use crate::token::{Token, TokenKind};

/// Checks a whole program and returns every problem found: lexical errors
/// first, then the syntax error that stopped the walk, if any.
///
/// Lexical errors are only collected up to the point where parsing stopped.
pub fn parse(source: &[u8]) -> Vec<ParseError> {
    let mut parser = Parser::new(source);
    if let Err(error) = parser.parse() {
        tracing::debug!(%error, "program rejected");
    }
    parser.errors()
}

type PResult<T = ()> = Result<T, SyntaxError>;

/// A predictive recursive-descent checker with one token of lookahead.
///
/// The first mismatch is recorded in [`Parser::diagnostics`] and ends the
/// walk; there is no recovery.
#[derive(Debug)]
pub struct Parser {
    lexer: Lexer,
    current: Token,
    diagnostics: Diagnostics,
}

impl Parser {
    pub fn new(source: &[u8]) -> Parser {
        let checked = grammar::tables_checked();
        debug_assert!(checked.is_ok(), "{:?}", checked);
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Walks the whole input. Meant to be called once.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(&mut self) -> Result<(), SyntaxError> {
        self.program()
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn lex_errors(&self) -> &[LexError] {
        self.lexer.errors()
    }

    pub fn errors(&self) -> Vec<ParseError> {
        self.lex_errors()
            .iter()
            .cloned()
            .map(ParseError::from)
            .chain(self.diagnostics.iter().cloned().map(ParseError::from))
            .collect()
    }

    /// Writes the error report to stdout; nothing if the program was accepted.
    pub fn print_diagnostics(&self) -> io::Result<()> {
        self.diagnostics.write_report(io::stdout().lock())
    }

    fn program(&mut self) -> PResult {
        if self.have(NonTerminal::DeclList) {
            self.decl_list()?;
        }
        self.expect(TokenKind::Main)?;
        self.expect(TokenKind::OpenParen)?;
        self.expect(TokenKind::CloseParen)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Void)?;
        self.block()?;
        self.expect(TokenKind::Eof)?;
        Ok(())
    }

    fn decl_list(&mut self) -> PResult {
        self.decl()?;
        while self.have(NonTerminal::DeclList) {
            self.decl()?;
        }
        Ok(())
    }

    fn decl(&mut self) -> PResult {
        if self.have(NonTerminal::VarDecl) {
            self.var_decl()
        } else if self.have(NonTerminal::FuncDecl) {
            self.func_decl()
        } else {
            Err(self.report(NonTerminal::DeclList))
        }
    }

    fn var_decl(&mut self) -> PResult {
        self.type_decl()?;
        self.expect(TokenKind::Ident)?;
        while self.accept(TokenKind::Comma) {
            self.expect(TokenKind::Ident)?;
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn type_decl(&mut self) -> PResult {
        self.expect(NonTerminal::Type)?;
        while self.accept(TokenKind::OpenBracket) {
            self.expect(TokenKind::IntVal)?;
            self.expect(TokenKind::CloseBracket)?;
        }
        Ok(())
    }

    fn func_decl(&mut self) -> PResult {
        self.expect(TokenKind::Function)?;
        let name = self.expect(TokenKind::Ident)?;
        tracing::trace!(name = %name.lexeme, line = name.line, "function declaration");
        self.param_list()?;
        self.expect(TokenKind::Colon)?;
        if !self.accept(TokenKind::Void) {
            self.expect(NonTerminal::Type)?;
        }
        self.func_body()
    }

    fn param_list(&mut self) -> PResult {
        self.expect(TokenKind::OpenParen)?;
        if self.have(NonTerminal::ParamDecl) {
            self.param_decl()?;
            while self.accept(TokenKind::Comma) {
                self.param_decl()?;
            }
        }
        self.expect(TokenKind::CloseParen)?;
        Ok(())
    }

    fn param_decl(&mut self) -> PResult {
        self.param_type()?;
        self.expect(TokenKind::Ident)?;
        Ok(())
    }

    fn param_type(&mut self) -> PResult {
        self.expect(NonTerminal::Type)?;
        while self.accept(TokenKind::OpenBracket) {
            self.expect(TokenKind::CloseBracket)?;
        }
        Ok(())
    }

    fn func_body(&mut self) -> PResult {
        self.block()
    }

    /// `{ [statSeq] }`, shared by function bodies, `main` and every
    /// compound statement.
    fn block(&mut self) -> PResult {
        self.expect(TokenKind::OpenBrace)?;
        if self.have(NonTerminal::StatSeq) {
            self.stat_seq()?;
        }
        self.expect(TokenKind::CloseBrace)?;
        Ok(())
    }

    fn stat_seq(&mut self) -> PResult {
        self.statement()?;
        while self.have(NonTerminal::Statement) {
            self.statement()?;
        }
        Ok(())
    }

    fn statement(&mut self) -> PResult {
        if self.have(NonTerminal::VarDecl) {
            self.var_decl()
        } else if self.have(NonTerminal::AssignStat) {
            self.assign_stat()
        } else if self.have(NonTerminal::FuncCallStat) {
            self.func_call_stat()
        } else if self.have(NonTerminal::IfStat) {
            self.if_stat()
        } else if self.have(NonTerminal::WhileStat) {
            self.while_stat()
        } else if self.have(NonTerminal::DoWhileStat) {
            self.do_while_stat()
        } else if self.have(NonTerminal::ForStat) {
            self.for_stat()
        } else if self.have(NonTerminal::RepeatStat) {
            self.repeat_stat()
        } else if self.have(NonTerminal::ReturnStat) {
            self.return_stat()
        } else {
            Err(self.report(NonTerminal::Statement))
        }
    }

    fn assign_stat(&mut self) -> PResult {
        self.assign()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn func_call_stat(&mut self) -> PResult {
        self.func_call()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn if_stat(&mut self) -> PResult {
        self.expect(TokenKind::If)?;
        self.relation()?;
        self.block()?;
        if self.accept(TokenKind::Else) {
            self.block()?;
        }
        Ok(())
    }

    fn while_stat(&mut self) -> PResult {
        self.expect(TokenKind::While)?;
        self.relation()?;
        self.block()
    }

    fn do_while_stat(&mut self) -> PResult {
        self.expect(TokenKind::Do)?;
        self.block()?;
        self.expect(TokenKind::While)?;
        self.relation()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn for_stat(&mut self) -> PResult {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::OpenParen)?;
        if self.have(NonTerminal::Assign) {
            self.assign()?;
        }
        self.expect(TokenKind::Semicolon)?;
        if self.have(NonTerminal::RelExpr) {
            self.rel_expr()?;
        }
        self.expect(TokenKind::Semicolon)?;
        if self.have(NonTerminal::Assign) {
            self.assign()?;
        }
        self.expect(TokenKind::CloseParen)?;
        self.block()
    }

    fn repeat_stat(&mut self) -> PResult {
        self.expect(TokenKind::Repeat)?;
        self.block()?;
        self.expect(TokenKind::Until)?;
        self.relation()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn return_stat(&mut self) -> PResult {
        self.expect(TokenKind::Return)?;
        if self.have(NonTerminal::RelExpr) {
            self.rel_expr()?;
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn rel_expr(&mut self) -> PResult {
        self.add_expr()?;
        while self.accept(NonTerminal::RelOp) {
            self.add_expr()?;
        }
        Ok(())
    }

    fn add_expr(&mut self) -> PResult {
        self.mult_expr()?;
        loop {
            if self.accept(NonTerminal::AddOp) {
                self.mult_expr()?;
            } else if self.have(TokenKind::IntVal) || self.have(TokenKind::FloatVal) {
                // `x -3` scans as `x` followed by the literal `-3`.
                if let Some((op, operand)) = split_negative_literal(&self.current) {
                    tracing::trace!(line = op.line, column = op.column, "split negative literal");
                    self.current = operand;
                }
                self.mult_expr()?;
            } else {
                return Ok(());
            }
        }
    }

    fn mult_expr(&mut self) -> PResult {
        self.pow_expr()?;
        while self.accept(NonTerminal::MulOp) {
            self.pow_expr()?;
        }
        Ok(())
    }

    fn pow_expr(&mut self) -> PResult {
        self.group_expr()?;
        while self.accept(TokenKind::Pow) {
            self.group_expr()?;
        }
        Ok(())
    }

    fn group_expr(&mut self) -> PResult {
        if self.accept(NonTerminal::Literal) {
            Ok(())
        } else if self.have(NonTerminal::Designator) {
            self.designator()
        } else if self.accept(TokenKind::Not) {
            self.rel_expr()
        } else if self.have(NonTerminal::Relation) {
            self.relation()
        } else if self.have(NonTerminal::FuncCall) {
            self.func_call()
        } else {
            Err(self.report(NonTerminal::GroupExpr))
        }
    }

    fn relation(&mut self) -> PResult {
        self.expect(TokenKind::OpenParen)?;
        self.rel_expr()?;
        self.expect(TokenKind::CloseParen)?;
        Ok(())
    }

    fn assign(&mut self) -> PResult {
        self.designator()?;
        if self.accept(NonTerminal::AssignOp) {
            self.rel_expr()
        } else if self.accept(NonTerminal::UnaryOp) {
            Ok(())
        } else {
            Err(self.report(NonTerminal::Assign))
        }
    }

    fn func_call(&mut self) -> PResult {
        self.expect(TokenKind::Call)?;
        self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::OpenParen)?;
        if self.have(NonTerminal::RelExpr) {
            self.rel_expr()?;
            while self.accept(TokenKind::Comma) {
                self.rel_expr()?;
            }
        }
        self.expect(TokenKind::CloseParen)?;
        Ok(())
    }

    fn designator(&mut self) -> PResult {
        self.expect(TokenKind::Ident)?;
        while self.accept(TokenKind::OpenBracket) {
            self.rel_expr()?;
            self.expect(TokenKind::CloseBracket)?;
        }
        Ok(())
    }

    fn have(&self, symbol: impl Into<Symbol>) -> bool {
        symbol.into().first().has(self.current.kind)
    }

    fn accept(&mut self, symbol: impl Into<Symbol>) -> bool {
        if self.have(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, symbol: impl Into<Symbol>) -> PResult<Token> {
        let symbol = symbol.into();
        if self.have(symbol) {
            Ok(self.advance())
        } else {
            Err(self.report(symbol))
        }
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        mem::replace(&mut self.current, next)
    }

    fn report(&mut self, expected: impl Into<Symbol>) -> SyntaxError {
        let error = SyntaxError {
            line: self.current.line,
            column: self.current.column,
            expected: expected.into(),
            actual: self.current.kind,
        };
        tracing::debug!(%error, "recorded diagnostic");
        self.diagnostics.push(error.clone());
        error
    }
}

/// Splits a literal such as `-3` into a `-` operator at the literal's
/// position and the unsigned literal one column to the right.
pub(crate) fn split_negative_literal(token: &Token) -> Option<(Token, Token)> {
    if !token.is_negative_literal() {
        return None;
    }
    let op = Token::new(TokenKind::Sub, "-", token.line, token.column);
    let operand = Token::new(token.kind, &token.lexeme[1..], token.line, token.column + 1);
    Some((op, operand))
}
