use crate::parser_diagnostics::LexError;
use crate::token::{Token, TokenKind};
use crate::util::{ends_word, CharExt, OptionPredExt};
use bstr::{BStr, BString, ByteSlice};
use once_cell::sync::Lazy;
use std::{collections::HashMap, io};

/// Identifiers and numeric literals longer than this are lexical errors.
pub const MAX_LEXEME_LEN: usize = 32;

static KEYWORDS: Lazy<HashMap<&BStr, TokenKind>> = Lazy::new(|| {
    vec![
        ("void", TokenKind::Void),
        ("bool", TokenKind::Bool),
        ("int", TokenKind::Int),
        ("float", TokenKind::Float),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("while", TokenKind::While),
        ("do", TokenKind::Do),
        ("for", TokenKind::For),
        ("repeat", TokenKind::Repeat),
        ("until", TokenKind::Until),
        ("call", TokenKind::Call),
        ("return", TokenKind::Return),
        ("main", TokenKind::Main),
        ("function", TokenKind::Function),
    ]
    .into_iter()
    .map(|(k, v)| (k.as_bytes().as_bstr(), v))
    .collect::<HashMap<_, _>>()
});

/// A forward-only scanner over one source buffer.
///
/// [`Lexer::next_token`] always produces a token: malformed input comes out
/// as [`TokenKind::Error`] tokens, and the reason is kept in
/// [`Lexer::errors`]. The end of input is reported by exactly one
/// [`TokenKind::Eof`] token; asking again keeps returning `EOF`.
#[derive(Debug, Clone)]
pub struct Lexer {
    source: BString,
    pos: usize,
    line: u32,
    /// Column of the byte consumed last; 0 at the start of a line.
    column: u32,
    closed: bool,
    errors: Vec<LexError>,
}

impl Lexer {
    pub fn new(source: &[u8]) -> Lexer {
        Lexer {
            source: source.into(),
            pos: 0,
            line: 1,
            column: 0,
            closed: false,
            errors: vec![],
        }
    }

    pub fn from_reader<R: io::Read>(mut reader: R) -> io::Result<Lexer> {
        let mut source = Vec::new();
        reader.read_to_end(&mut source)?;
        Ok(Lexer::new(&source))
    }

    /// False once the `EOF` token has been handed out.
    pub fn has_next(&self) -> bool {
        !self.closed
    }

    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn next_token(&mut self) -> Token {
        if self.closed {
            return self.eof_token();
        }
        if let Some(token) = self.skip_trivia() {
            return token;
        }
        let start = self.pos;
        let first = match self.bump() {
            Some(ch) => ch,
            None => {
                self.closed = true;
                tracing::trace!(line = self.line, "end of input");
                return self.eof_token();
            }
        };
        let (line, column) = (self.line, self.column);
        let kind = match first {
            b'(' => TokenKind::OpenParen,
            b')' => TokenKind::CloseParen,
            b'{' => TokenKind::OpenBrace,
            b'}' => TokenKind::CloseBrace,
            b'[' => TokenKind::OpenBracket,
            b']' => TokenKind::CloseBracket,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,
            b'=' => self.pair(b'=', TokenKind::EqualTo, TokenKind::Assign),
            b'!' => self.pair(b'=', TokenKind::NotEqual, TokenKind::Not),
            b'<' => self.pair(b'=', TokenKind::LessEqual, TokenKind::LessThan),
            b'>' => self.pair(b'=', TokenKind::GreaterEqual, TokenKind::GreaterThan),
            b'*' => self.pair(b'=', TokenKind::MulAssign, TokenKind::Mul),
            // `//` and `/*` never get here; skip_trivia consumes them.
            b'/' => self.pair(b'=', TokenKind::DivAssign, TokenKind::Div),
            b'%' => self.pair(b'=', TokenKind::ModAssign, TokenKind::Mod),
            b'^' => self.pair(b'=', TokenKind::PowAssign, TokenKind::Pow),
            b'+' => {
                if self.eat(b'=') {
                    TokenKind::AddAssign
                } else if self.eat(b'+') {
                    TokenKind::Increment
                } else {
                    TokenKind::Add
                }
            }
            b'-' => {
                if self.eat(b'=') {
                    TokenKind::SubAssign
                } else if self.eat(b'-') {
                    TokenKind::Decrement
                } else if self.peek().is_some_and_(|ch| ch.is_ascii_digit()) {
                    // The sign belongs to the literal; the parser splits it
                    // off again where a binary `-` was meant.
                    self.lex_numeric(start, line, column)
                } else {
                    TokenKind::Sub
                }
            }
            b'&' => {
                if self.eat(b'&') {
                    TokenKind::And
                } else {
                    self.poison(start, line, column)
                }
            }
            b'|' => {
                if self.eat(b'|') {
                    TokenKind::Or
                } else {
                    self.poison(start, line, column)
                }
            }
            _ if first.is_ascii_digit() => self.lex_numeric(start, line, column),
            _ if first.is_ascii_alphabetic() => self.lex_word(start, line, column),
            _ => self.poison(start, line, column),
        };
        let token = self.make_token(kind, start, line, column);
        tracing::trace!(kind = token.kind.name(), line, column, "scanned token");
        token
    }

    fn lex_word(&mut self, start: usize, line: u32, column: u32) -> TokenKind {
        while self
            .peek()
            .is_some_and_(|&ch| ch.is_ascii_alphanumeric() || ch == b'_')
        {
            self.bump();
        }
        if !ends_word(self.peek()) {
            return self.poison(start, line, column);
        }
        let word = self.source[start..self.pos].as_bstr();
        if let Some(&kind) = KEYWORDS.get(word) {
            return kind;
        }
        self.check_length(start, line, column, TokenKind::Ident)
    }

    /// Scans `-?digits(.digits)?`. The caller has consumed the first byte.
    fn lex_numeric(&mut self, start: usize, line: u32, column: u32) -> TokenKind {
        while self.peek().is_some_and_(|ch| ch.is_ascii_digit()) {
            self.bump();
        }
        let mut kind = TokenKind::IntVal;
        if self.eat(b'.') {
            kind = TokenKind::FloatVal;
            while self.peek().is_some_and_(|ch| ch.is_ascii_digit()) {
                self.bump();
            }
        }
        // `3.` is malformed, not an integer followed by a dot.
        if !ends_word(self.peek()) || self.source[self.pos - 1] == b'.' {
            return self.poison(start, line, column);
        }
        self.check_length(start, line, column, kind)
    }

    fn check_length(&mut self, start: usize, line: u32, column: u32, kind: TokenKind) -> TokenKind {
        let len = self.pos - start;
        if len > MAX_LEXEME_LEN {
            self.errors.push(LexError::TooLong {
                line,
                column,
                len,
                limit: MAX_LEXEME_LEN,
            });
            return TokenKind::Error;
        }
        kind
    }

    /// Extends the current token up to the next whitespace and marks it as
    /// an error, so one bad character yields one diagnostic.
    fn poison(&mut self, start: usize, line: u32, column: u32) -> TokenKind {
        while self.peek().is_some_and_(|ch| !ch.isspace()) {
            self.bump();
        }
        let lexeme = self.source[start..self.pos].to_str_lossy().into_owned();
        self.errors.push(LexError::InvalidToken {
            line,
            column,
            lexeme,
        });
        TokenKind::Error
    }

    /// Skips whitespace and comments. Returns an error token if a block
    /// comment runs into the end of input.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                Some(ch) if ch.isspace() => {
                    self.bump();
                }
                Some(b'/') if self.peek_n(1) == Some(b'/') => {
                    while self.peek().is_some_and_(|&ch| ch != b'\n') {
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_n(1) == Some(b'*') => {
                    let start = self.pos;
                    self.bump();
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    if !self.skip_block_comment() {
                        self.errors
                            .push(LexError::UnterminatedComment { line, column });
                        return Some(self.make_token(TokenKind::Error, start, line, column));
                    }
                }
                _ => return None,
            }
        }
    }

    fn skip_block_comment(&mut self) -> bool {
        while let Some(ch) = self.bump() {
            if ch == b'*' && self.eat(b'/') {
                return true;
            }
        }
        false
    }

    fn make_token(&self, kind: TokenKind, start: usize, line: u32, column: u32) -> Token {
        let lexeme = self.source[start..self.pos].to_str_lossy().into_owned();
        Token::new(kind, lexeme, line, column)
    }

    fn eof_token(&self) -> Token {
        Token::new(TokenKind::Eof, "", self.line, self.column + 1)
    }

    fn pair(&mut self, second: u8, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.eat(second) {
            double
        } else {
            single
        }
    }

    fn eat(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn peek_n(&self, off: usize) -> Option<u8> {
        self.source.get(self.pos + off).copied()
    }

    fn peek(&self) -> Option<u8> {
        self.peek_n(0)
    }
}

/// Yields every token up to and including the `EOF` token.
impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.closed {
            None
        } else {
            Some(self.next_token())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source.as_bytes()).collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("void bool int float true false if else while do for repeat until call return main function"),
            vec![
                Void, Bool, Int, Float, True, False, If, Else, While, Do, For, Repeat, Until, Call,
                Return, Main, Function, Eof
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        let tokens = lex("foo bar_2 x9 mainly");
        assert_eq!(
            tokens.iter().map(|t| (t.kind, &*t.lexeme)).collect::<Vec<_>>(),
            vec![
                (Ident, "foo"),
                (Ident, "bar_2"),
                (Ident, "x9"),
                (Ident, "mainly"),
                (Eof, "")
            ]
        );
    }

    #[test]
    fn test_longest_match() {
        let tokens = lex("12345;");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::new(IntVal, "12345", 1, 1));
        assert_eq!(tokens[1], Token::new(Semicolon, ";", 1, 6));
        assert_eq!(tokens[2], Token::new(Eof, "", 1, 7));
    }

    #[test]
    fn test_floats() {
        let tokens = lex("3.25 0.5)");
        assert_eq!(tokens[0], Token::new(FloatVal, "3.25", 1, 1));
        assert_eq!(tokens[1], Token::new(FloatVal, "0.5", 1, 6));
        assert_eq!(tokens[2].kind, CloseParen);
    }

    #[test]
    fn test_trailing_dot() {
        let mut lexer = Lexer::new(b"3. x");
        assert_eq!(lexer.next_token(), Token::new(Error, "3.", 1, 1));
        assert_eq!(lexer.next_token(), Token::new(Ident, "x", 1, 4));
        assert_eq!(
            lexer.errors(),
            &[LexError::InvalidToken {
                line: 1,
                column: 1,
                lexeme: "3.".to_owned()
            }]
        );

        assert_eq!(kinds("1.5.3"), vec![Error, Eof]);
        assert_eq!(lex("2.;")[0].lexeme, "2.;");
    }

    #[test]
    fn test_poisoned_words() {
        let tokens = lex("abc$def ghi");
        assert_eq!(tokens[0], Token::new(Error, "abc$def", 1, 1));
        assert_eq!(tokens[1], Token::new(Ident, "ghi", 1, 9));

        let tokens = lex("12abc; 7");
        assert_eq!(tokens[0], Token::new(Error, "12abc;", 1, 1));
        assert_eq!(tokens[1], Token::new(IntVal, "7", 1, 8));

        assert_eq!(kinds("a.b"), vec![Error, Eof]);
        assert_eq!(kinds("x_"), vec![Ident, Eof]);
    }

    #[test]
    fn test_stray_characters() {
        let mut lexer = Lexer::new(b"x @y z");
        let tokens = lexer.by_ref().collect::<Vec<_>>();
        assert_eq!(tokens[1], Token::new(Error, "@y", 1, 3));
        assert_eq!(tokens[2], Token::new(Ident, "z", 1, 6));
        assert_eq!(lexer.errors().len(), 1);

        assert_eq!(kinds("& x"), vec![Error, Ident, Eof]);
        assert_eq!(kinds("|"), vec![Error, Eof]);
        assert_eq!(kinds("_a"), vec![Error, Eof]);
    }

    #[test]
    fn test_negative_literals() {
        assert_eq!(lex("-3")[0], Token::new(IntVal, "-3", 1, 1));
        assert_eq!(lex("-0.5")[0], Token::new(FloatVal, "-0.5", 1, 1));
        assert_eq!(kinds("x-3"), vec![Ident, IntVal, Eof]);
        assert_eq!(lex("x-3")[1], Token::new(IntVal, "-3", 1, 2));
        assert_eq!(kinds("x - 3"), vec![Ident, Sub, IntVal, Eof]);
        assert_eq!(kinds("x - -3"), vec![Ident, Sub, IntVal, Eof]);
        assert_eq!(kinds("--3"), vec![Decrement, IntVal, Eof]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <= >= += -= *= /= %= ^= ++ -- && ||"),
            vec![
                EqualTo, NotEqual, LessEqual, GreaterEqual, AddAssign, SubAssign, MulAssign,
                DivAssign, ModAssign, PowAssign, Increment, Decrement, And, Or, Eof
            ]
        );
        assert_eq!(
            kinds("= ! < > + - * / % ^ ( ) { } [ ] , : ;"),
            vec![
                Assign, Not, LessThan, GreaterThan, Add, Sub, Mul, Div, Mod, Pow, OpenParen,
                CloseParen, OpenBrace, CloseBrace, OpenBracket, CloseBracket, Comma, Colon,
                Semicolon, Eof
            ]
        );
        assert_eq!(kinds("a[i]+=b"), vec![Ident, OpenBracket, Ident, CloseBracket, AddAssign, Ident, Eof]);
    }

    #[test]
    fn test_line_comment() {
        let tokens = lex("a // comment\nb");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::new(Ident, "a", 1, 1));
        assert_eq!(tokens[1], Token::new(Ident, "b", 2, 1));
        assert_eq!(kinds("// only a comment"), vec![Eof]);
    }

    #[test]
    fn test_block_comment() {
        let tokens = lex("a /* x\n y */ b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1], Token::new(Ident, "b", 2, 7));

        let mut lexer = Lexer::new(b"/* closed at the very end */");
        assert_eq!(lexer.next_token().kind, Eof);
        assert!(lexer.errors().is_empty());

        assert_eq!(kinds("x/**/y"), vec![Ident, Ident, Eof]);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = Lexer::new(b"a\n  /* never\nclosed");
        let tokens = lexer.by_ref().collect::<Vec<_>>();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1], Token::new(Error, "/* never\nclosed", 2, 3));
        assert_eq!(tokens[2].kind, Eof);
        assert_eq!(
            lexer.errors(),
            &[LexError::UnterminatedComment { line: 2, column: 3 }]
        );
    }

    #[test]
    fn test_too_long() {
        let ok = "a".repeat(MAX_LEXEME_LEN);
        assert_eq!(kinds(&ok), vec![Ident, Eof]);

        let long = "a".repeat(MAX_LEXEME_LEN + 1);
        let mut lexer = Lexer::new(long.as_bytes());
        assert_eq!(lexer.next_token(), Token::new(Error, long.clone(), 1, 1));
        assert_eq!(
            lexer.errors(),
            &[LexError::TooLong {
                line: 1,
                column: 1,
                len: MAX_LEXEME_LEN + 1,
                limit: MAX_LEXEME_LEN
            }]
        );

        let digits = "9".repeat(40);
        assert_eq!(kinds(&digits), vec![Error, Eof]);
    }

    #[test]
    fn test_end_of_input() {
        let mut lexer = Lexer::new(b"");
        assert!(lexer.has_next());
        assert_eq!(lexer.next_token(), Token::new(Eof, "", 1, 1));
        assert!(!lexer.has_next());
        assert_eq!(lexer.next_token().kind, Eof);
        assert_eq!(lexer.next(), None);

        assert_eq!(lex("ab").last(), Some(&Token::new(Eof, "", 1, 3)));
        assert_eq!(lex("ab\n").last(), Some(&Token::new(Eof, "", 2, 1)));
    }

    #[test]
    fn test_positions() {
        let tokens = lex("int x;\n\t x = 1;");
        let positions = tokens
            .iter()
            .map(|t| (t.kind, t.line, t.column))
            .collect::<Vec<_>>();
        assert_eq!(
            positions,
            vec![
                (Int, 1, 1),
                (Ident, 1, 5),
                (Semicolon, 1, 6),
                (Ident, 2, 3),
                (Assign, 2, 5),
                (IntVal, 2, 7),
                (Semicolon, 2, 8),
                (Eof, 2, 9),
            ]
        );
    }

    #[test]
    fn test_vertical_tab_is_whitespace() {
        assert_eq!(kinds("a\x0Bb"), vec![Ident, Ident, Eof]);
    }

    #[test]
    fn test_from_reader() {
        let lexer = Lexer::from_reader(&b"main"[..]).unwrap();
        assert_eq!(lexer.map(|t| t.kind).collect::<Vec<_>>(), vec![Main, Eof]);
    }
}
