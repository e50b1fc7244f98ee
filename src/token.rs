use std::fmt;

use serde::Serialize;

use crate::inspect::inspect_lexeme;

/// One lexical unit together with the exact text it was scanned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// 1-based line of the first byte.
    pub line: u32,
    /// 1-based column of the first byte on its line.
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub(crate) fn is_negative_literal(&self) -> bool {
        matches!(self.kind, TokenKind::IntVal | TokenKind::FloatVal) && self.lexeme.starts_with('-')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line: {}, Char: {}, Lexeme: {}, Kind: {}",
            self.line,
            self.column,
            inspect_lexeme(&self.lexeme),
            self.kind.name()
        )
    }
}

/// The kind of a [`Token`].
///
/// The declaration order is significant: a kind's ordinal is its bit
/// position in a [`TokenSet`](crate::grammar::TokenSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `^`
    Pow,
    /// `==`
    EqualTo,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEqual,
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
    /// `^=`
    PowAssign,
    /// `++`
    Increment,
    /// `--`
    Decrement,
    /// `void`
    Void,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `true`
    True,
    /// `false`
    False,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `if`
    If,
    /// `else`
    Else,
    /// `while`
    While,
    /// `do`
    Do,
    /// `for`
    For,
    /// `repeat`
    Repeat,
    /// `until`
    Until,
    /// `call`
    Call,
    /// `return`
    Return,
    /// `main`
    Main,
    /// `function`
    Function,
    /// `42`, `-7`
    IntVal,
    /// `3.25`, `-0.5`
    FloatVal,
    /// `foo`, `bar_2`
    Ident,
    /// End of input. Handed out exactly once by a lexer.
    Eof,
    /// A malformed or unrecognized run of characters.
    Error,
}

impl TokenKind {
    pub const COUNT: usize = 55;

    pub const ALL: [TokenKind; TokenKind::COUNT] = {
        use TokenKind::*;
        [
            And, Or, Not, Add, Sub, Mul, Div, Mod, Pow, EqualTo, NotEqual, LessThan, LessEqual,
            GreaterThan, GreaterEqual, Assign, AddAssign, SubAssign, MulAssign, DivAssign,
            ModAssign, PowAssign, Increment, Decrement, Void, Bool, Int, Float, True, False,
            OpenParen, CloseParen, OpenBrace, CloseBrace, OpenBracket, CloseBracket, Comma, Colon,
            Semicolon, If, Else, While, Do, For, Repeat, Until, Call, Return, Main, Function,
            IntVal, FloatVal, Ident, Eof, Error,
        ]
    };

    /// The upper-case name used in token dumps, e.g. `ADD_ASSIGN`.
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            And => "AND",
            Or => "OR",
            Not => "NOT",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Pow => "POW",
            EqualTo => "EQUAL_TO",
            NotEqual => "NOT_EQUAL",
            LessThan => "LESS_THAN",
            LessEqual => "LESS_EQUAL",
            GreaterThan => "GREATER_THAN",
            GreaterEqual => "GREATER_EQUAL",
            Assign => "ASSIGN",
            AddAssign => "ADD_ASSIGN",
            SubAssign => "SUB_ASSIGN",
            MulAssign => "MUL_ASSIGN",
            DivAssign => "DIV_ASSIGN",
            ModAssign => "MOD_ASSIGN",
            PowAssign => "POW_ASSIGN",
            Increment => "UNI_INC",
            Decrement => "UNI_DEC",
            Void => "VOID",
            Bool => "BOOL",
            Int => "INT",
            Float => "FLOAT",
            True => "TRUE",
            False => "FALSE",
            OpenParen => "OPEN_PAREN",
            CloseParen => "CLOSE_PAREN",
            OpenBrace => "OPEN_BRACE",
            CloseBrace => "CLOSE_BRACE",
            OpenBracket => "OPEN_BRACKET",
            CloseBracket => "CLOSE_BRACKET",
            Comma => "COMMA",
            Colon => "COLON",
            Semicolon => "SEMICOLON",
            If => "IF",
            Else => "ELSE",
            While => "WHILE",
            Do => "DO",
            For => "FOR",
            Repeat => "REPEAT",
            Until => "UNTIL",
            Call => "CALL",
            Return => "RETURN",
            Main => "MAIN",
            Function => "FUNC",
            IntVal => "INT_VAL",
            FloatVal => "FLOAT_VAL",
            Ident => "IDENT",
            Eof => "SCAN_EOF",
            Error => "ERROR",
        }
    }

    /// How the kind is spelled in source, or a placeholder name for kinds
    /// without a fixed spelling. Diagnostics use this form.
    pub fn spelling(self) -> &'static str {
        use TokenKind::*;
        match self {
            And => "&&",
            Or => "||",
            Not => "!",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "^",
            EqualTo => "==",
            NotEqual => "!=",
            LessThan => "<",
            LessEqual => "<=",
            GreaterThan => ">",
            GreaterEqual => ">=",
            Assign => "=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            PowAssign => "^=",
            Increment => "++",
            Decrement => "--",
            Void => "void",
            Bool => "bool",
            Int => "int",
            Float => "float",
            True => "true",
            False => "false",
            OpenParen => "(",
            CloseParen => ")",
            OpenBrace => "{",
            CloseBrace => "}",
            OpenBracket => "[",
            CloseBracket => "]",
            Comma => ",",
            Colon => ":",
            Semicolon => ";",
            If => "if",
            Else => "else",
            While => "while",
            Do => "do",
            For => "for",
            Repeat => "repeat",
            Until => "until",
            Call => "call",
            Return => "return",
            Main => "main",
            Function => "function",
            IntVal => "INT_VAL",
            FloatVal => "FLOAT_VAL",
            Ident => "IDENT",
            Eof => "EOF",
            Error => "ERROR",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}
