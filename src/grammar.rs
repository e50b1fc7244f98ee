//! FIRST sets of the DeCo grammar and the lookahead decisions built on them.
//!
//! The grammar is LL(1): every choice the parser makes is settled by testing
//! the current token against the FIRST sets of the alternatives. The sets
//! below were derived by hand from the productions in [`crate::parsing`];
//! [`check_decisions`] verifies that the alternatives at every decision
//! point stay disjoint, so a grammar change that breaks single-token
//! lookahead is caught by the test suite.

use std::fmt;
use std::io;

use bitflags::bitflags;
use derive_more::From;
use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;

use crate::token::TokenKind;

bitflags! {
    /// A set of token kinds. Bit `n` stands for the kind with ordinal `n`.
    #[derive(Default)]
    pub struct TokenSet: u64 {
        const ALL_KINDS = (1 << TokenKind::COUNT) - 1;
    }
}

impl TokenSet {
    pub const fn of(kinds: &[TokenKind]) -> TokenSet {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            bits |= 1u64 << (kinds[i] as u64);
            i += 1;
        }
        TokenSet::from_bits_truncate(bits)
    }

    pub const fn with(self, other: TokenSet) -> TokenSet {
        TokenSet::from_bits_truncate(self.bits() | other.bits())
    }

    pub const fn has(self, kind: TokenKind) -> bool {
        self.bits() & (1u64 << (kind as u64)) != 0
    }

    pub fn kinds(self) -> impl Iterator<Item = TokenKind> {
        TokenKind::ALL.into_iter().filter(move |&kind| self.has(kind))
    }
}

impl From<TokenKind> for TokenSet {
    fn from(kind: TokenKind) -> Self {
        TokenSet::of(&[kind])
    }
}

impl fmt::Display for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for kind in self.kinds() {
            write!(f, "{} ", kind)?;
        }
        f.write_str("}")
    }
}

/// A grammar symbol with one or more productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NonTerminal {
    MulOp,
    AddOp,
    RelOp,
    AssignOp,
    UnaryOp,
    Type,
    BoolLit,
    Literal,
    Designator,
    GroupExpr,
    PowExpr,
    MultExpr,
    AddExpr,
    RelExpr,
    Relation,
    Assign,
    FuncCall,
    AssignStat,
    FuncCallStat,
    IfStat,
    WhileStat,
    DoWhileStat,
    ForStat,
    RepeatStat,
    ReturnStat,
    Statement,
    StatSeq,
    TypeDecl,
    VarDecl,
    ParamType,
    ParamDecl,
    DeclList,
    ParamList,
    FuncBody,
    FuncDecl,
    Program,
}

impl NonTerminal {
    pub const COUNT: usize = 36;

    pub const ALL: [NonTerminal; NonTerminal::COUNT] = {
        use NonTerminal::*;
        [
            MulOp, AddOp, RelOp, AssignOp, UnaryOp, Type, BoolLit, Literal, Designator, GroupExpr,
            PowExpr, MultExpr, AddExpr, RelExpr, Relation, Assign, FuncCall, AssignStat,
            FuncCallStat, IfStat, WhileStat, DoWhileStat, ForStat, RepeatStat, ReturnStat,
            Statement, StatSeq, TypeDecl, VarDecl, ParamType, ParamDecl, DeclList, ParamList,
            FuncBody, FuncDecl, Program,
        ]
    };

    pub fn first(self) -> TokenSet {
        FIRST_SETS[self as usize]
    }

    pub fn name(self) -> &'static str {
        use NonTerminal::*;
        match self {
            MulOp => "MUL_OP",
            AddOp => "ADD_OP",
            RelOp => "REL_OP",
            AssignOp => "ASSIGN_OP",
            UnaryOp => "UNARY_OP",
            Type => "TYPE",
            BoolLit => "BOOL_LIT",
            Literal => "LITERAL",
            Designator => "DESIGNATOR",
            GroupExpr => "GROUP_EXPR",
            PowExpr => "POW_EXPR",
            MultExpr => "MULT_EXPR",
            AddExpr => "ADD_EXPR",
            RelExpr => "REL_EXPR",
            Relation => "RELATION",
            Assign => "ASSIGN",
            FuncCall => "FUNC_CALL",
            AssignStat => "ASSIGN_STAT",
            FuncCallStat => "FUNC_CALL_STAT",
            IfStat => "IF_STAT",
            WhileStat => "WHILE_STAT",
            DoWhileStat => "DO_WHILE_STAT",
            ForStat => "FOR_STAT",
            RepeatStat => "REPEAT_STAT",
            ReturnStat => "RETURN_STAT",
            Statement => "STATEMENT",
            StatSeq => "STAT_SEQ",
            TypeDecl => "TYPE_DECL",
            VarDecl => "VAR_DECL",
            ParamType => "PARAM_TYPE",
            ParamDecl => "PARAM_DECL",
            DeclList => "DECL_LIST",
            ParamList => "PARAM_LIST",
            FuncBody => "FUNC_BODY",
            FuncDecl => "FUNC_DECL",
            Program => "PROGRAM",
        }
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod first {
    use super::TokenSet;
    use crate::token::TokenKind::*;

    pub(super) const MUL_OP: TokenSet = TokenSet::of(&[And, Mul, Div, Mod]);
    pub(super) const ADD_OP: TokenSet = TokenSet::of(&[Or, Add, Sub]);
    pub(super) const REL_OP: TokenSet = TokenSet::of(&[
        EqualTo,
        NotEqual,
        LessThan,
        LessEqual,
        GreaterThan,
        GreaterEqual,
    ]);
    pub(super) const ASSIGN_OP: TokenSet = TokenSet::of(&[
        Assign, AddAssign, SubAssign, MulAssign, DivAssign, ModAssign, PowAssign,
    ]);
    pub(super) const UNARY_OP: TokenSet = TokenSet::of(&[Increment, Decrement]);
    pub(super) const TYPE: TokenSet = TokenSet::of(&[Bool, Int, Float]);
    pub(super) const BOOL_LIT: TokenSet = TokenSet::of(&[True, False]);
    pub(super) const LITERAL: TokenSet = BOOL_LIT.with(TokenSet::of(&[IntVal, FloatVal]));
    pub(super) const DESIGNATOR: TokenSet = TokenSet::of(&[Ident]);
    pub(super) const RELATION: TokenSet = TokenSet::of(&[OpenParen]);
    pub(super) const FUNC_CALL: TokenSet = TokenSet::of(&[Call]);
    pub(super) const GROUP_EXPR: TokenSet = LITERAL
        .with(DESIGNATOR)
        .with(TokenSet::of(&[Not]))
        .with(RELATION)
        .with(FUNC_CALL);
    pub(super) const POW_EXPR: TokenSet = GROUP_EXPR;
    pub(super) const MULT_EXPR: TokenSet = POW_EXPR;
    pub(super) const ADD_EXPR: TokenSet = MULT_EXPR;
    pub(super) const REL_EXPR: TokenSet = ADD_EXPR;
    pub(super) const ASSIGN: TokenSet = DESIGNATOR;
    pub(super) const ASSIGN_STAT: TokenSet = ASSIGN;
    pub(super) const FUNC_CALL_STAT: TokenSet = FUNC_CALL;
    pub(super) const IF_STAT: TokenSet = TokenSet::of(&[If]);
    pub(super) const WHILE_STAT: TokenSet = TokenSet::of(&[While]);
    pub(super) const DO_WHILE_STAT: TokenSet = TokenSet::of(&[Do]);
    pub(super) const FOR_STAT: TokenSet = TokenSet::of(&[For]);
    pub(super) const REPEAT_STAT: TokenSet = TokenSet::of(&[Repeat]);
    pub(super) const RETURN_STAT: TokenSet = TokenSet::of(&[Return]);
    pub(super) const TYPE_DECL: TokenSet = TYPE;
    pub(super) const VAR_DECL: TokenSet = TYPE_DECL;
    pub(super) const STATEMENT: TokenSet = VAR_DECL
        .with(ASSIGN_STAT)
        .with(FUNC_CALL_STAT)
        .with(IF_STAT)
        .with(WHILE_STAT)
        .with(DO_WHILE_STAT)
        .with(FOR_STAT)
        .with(REPEAT_STAT)
        .with(RETURN_STAT);
    pub(super) const STAT_SEQ: TokenSet = STATEMENT;
    pub(super) const PARAM_TYPE: TokenSet = TYPE;
    pub(super) const PARAM_DECL: TokenSet = PARAM_TYPE;
    pub(super) const FUNC_DECL: TokenSet = TokenSet::of(&[Function]);
    pub(super) const DECL_LIST: TokenSet = VAR_DECL.with(FUNC_DECL);
    pub(super) const PARAM_LIST: TokenSet = TokenSet::of(&[OpenParen]);
    pub(super) const FUNC_BODY: TokenSet = TokenSet::of(&[OpenBrace]);
    pub(super) const PROGRAM: TokenSet = DECL_LIST.with(TokenSet::of(&[Main]));
}

/// Indexed by `NonTerminal as usize`.
static FIRST_SETS: [TokenSet; NonTerminal::COUNT] = [
    first::MUL_OP,
    first::ADD_OP,
    first::REL_OP,
    first::ASSIGN_OP,
    first::UNARY_OP,
    first::TYPE,
    first::BOOL_LIT,
    first::LITERAL,
    first::DESIGNATOR,
    first::GROUP_EXPR,
    first::POW_EXPR,
    first::MULT_EXPR,
    first::ADD_EXPR,
    first::REL_EXPR,
    first::RELATION,
    first::ASSIGN,
    first::FUNC_CALL,
    first::ASSIGN_STAT,
    first::FUNC_CALL_STAT,
    first::IF_STAT,
    first::WHILE_STAT,
    first::DO_WHILE_STAT,
    first::FOR_STAT,
    first::REPEAT_STAT,
    first::RETURN_STAT,
    first::STATEMENT,
    first::STAT_SEQ,
    first::TYPE_DECL,
    first::VAR_DECL,
    first::PARAM_TYPE,
    first::PARAM_DECL,
    first::DECL_LIST,
    first::PARAM_LIST,
    first::FUNC_BODY,
    first::FUNC_DECL,
    first::PROGRAM,
];

/// Something the parser can expect: one token kind, or any token that can
/// begin a nonterminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Serialize)]
pub enum Symbol {
    Terminal(TokenKind),
    NonTerminal(NonTerminal),
}

impl Symbol {
    pub fn first(self) -> TokenSet {
        match self {
            Symbol::Terminal(kind) => kind.into(),
            Symbol::NonTerminal(nt) => nt.first(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(kind) => write!(f, "{}", kind),
            Symbol::NonTerminal(nt) => write!(f, "a token from {}", nt),
        }
    }
}

/// A point where the parser picks between alternatives by looking at one
/// token. For optional and repeated constituents the alternatives include
/// what may follow them.
///
/// `! relExpr` takes the longest expression it can, so the expression loops
/// list the tokens that end an expression in statement context: `)`, `;`,
/// `,` and `]`.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub name: &'static str,
    pub alternatives: &'static [Symbol],
}

macro_rules! alt {
    (T $kind:ident) => {
        Symbol::Terminal(TokenKind::$kind)
    };
    (N $nt:ident) => {
        Symbol::NonTerminal(NonTerminal::$nt)
    };
}

pub const DECISIONS: &[Decision] = &[
    Decision {
        name: "program",
        alternatives: &[alt!(N DeclList), alt!(T Main)],
    },
    Decision {
        name: "declList",
        alternatives: &[alt!(N VarDecl), alt!(N FuncDecl), alt!(T Main)],
    },
    Decision {
        name: "varDecl",
        alternatives: &[alt!(T Comma), alt!(T Semicolon)],
    },
    Decision {
        name: "typeDecl",
        alternatives: &[alt!(T OpenBracket), alt!(T Ident)],
    },
    Decision {
        name: "funcDecl",
        alternatives: &[alt!(T Void), alt!(N Type)],
    },
    Decision {
        name: "paramList",
        alternatives: &[alt!(N ParamDecl), alt!(T CloseParen)],
    },
    Decision {
        name: "paramList tail",
        alternatives: &[alt!(T Comma), alt!(T CloseParen)],
    },
    Decision {
        name: "paramType",
        alternatives: &[alt!(T OpenBracket), alt!(T Ident)],
    },
    Decision {
        name: "block",
        alternatives: &[alt!(N StatSeq), alt!(T CloseBrace)],
    },
    Decision {
        name: "statement",
        alternatives: &[
            alt!(N VarDecl),
            alt!(N AssignStat),
            alt!(N FuncCallStat),
            alt!(N IfStat),
            alt!(N WhileStat),
            alt!(N DoWhileStat),
            alt!(N ForStat),
            alt!(N RepeatStat),
            alt!(N ReturnStat),
        ],
    },
    Decision {
        name: "ifStat",
        alternatives: &[alt!(T Else), alt!(N Statement), alt!(T CloseBrace)],
    },
    Decision {
        name: "forStat init",
        alternatives: &[alt!(N Assign), alt!(T Semicolon)],
    },
    Decision {
        name: "forStat condition",
        alternatives: &[alt!(N RelExpr), alt!(T Semicolon)],
    },
    Decision {
        name: "forStat update",
        alternatives: &[alt!(N Assign), alt!(T CloseParen)],
    },
    Decision {
        name: "returnStat",
        alternatives: &[alt!(N RelExpr), alt!(T Semicolon)],
    },
    Decision {
        name: "relExpr",
        alternatives: &[
            alt!(N RelOp),
            alt!(T CloseParen),
            alt!(T Semicolon),
            alt!(T Comma),
            alt!(T CloseBracket),
        ],
    },
    Decision {
        name: "addExpr",
        alternatives: &[
            alt!(N AddOp),
            alt!(T IntVal),
            alt!(T FloatVal),
            alt!(N RelOp),
            alt!(T CloseParen),
            alt!(T Semicolon),
            alt!(T Comma),
            alt!(T CloseBracket),
        ],
    },
    Decision {
        name: "multExpr",
        alternatives: &[
            alt!(N MulOp),
            alt!(N AddOp),
            alt!(T IntVal),
            alt!(T FloatVal),
            alt!(N RelOp),
            alt!(T CloseParen),
            alt!(T Semicolon),
            alt!(T Comma),
            alt!(T CloseBracket),
        ],
    },
    Decision {
        name: "powExpr",
        alternatives: &[
            alt!(T Pow),
            alt!(N MulOp),
            alt!(N AddOp),
            alt!(T IntVal),
            alt!(T FloatVal),
            alt!(N RelOp),
            alt!(T CloseParen),
            alt!(T Semicolon),
            alt!(T Comma),
            alt!(T CloseBracket),
        ],
    },
    Decision {
        name: "groupExpr",
        alternatives: &[
            alt!(N Literal),
            alt!(N Designator),
            alt!(T Not),
            alt!(N Relation),
            alt!(N FuncCall),
        ],
    },
    Decision {
        name: "assign",
        alternatives: &[alt!(N AssignOp), alt!(N UnaryOp)],
    },
    Decision {
        name: "designator in assign",
        alternatives: &[alt!(T OpenBracket), alt!(N AssignOp), alt!(N UnaryOp)],
    },
    Decision {
        name: "designator in groupExpr",
        alternatives: &[
            alt!(T OpenBracket),
            alt!(T Pow),
            alt!(N MulOp),
            alt!(N AddOp),
            alt!(T IntVal),
            alt!(T FloatVal),
            alt!(N RelOp),
            alt!(T CloseParen),
            alt!(T Semicolon),
            alt!(T Comma),
            alt!(T CloseBracket),
        ],
    },
    Decision {
        name: "funcCall",
        alternatives: &[alt!(N RelExpr), alt!(T CloseParen)],
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{decision}: FIRST({first}) and FIRST({second}) share {overlap}")]
pub struct GrammarConflict {
    pub decision: &'static str,
    pub first: Symbol,
    pub second: Symbol,
    pub overlap: TokenSet,
}

/// Checks that the alternatives at every decision point are pairwise
/// disjoint.
pub fn check_decisions() -> Result<(), GrammarConflict> {
    for decision in DECISIONS {
        for (i, &a) in decision.alternatives.iter().enumerate() {
            for &b in &decision.alternatives[i + 1..] {
                let overlap = a.first() & b.first();
                if !overlap.is_empty() {
                    return Err(GrammarConflict {
                        decision: decision.name,
                        first: a,
                        second: b,
                        overlap,
                    });
                }
            }
        }
    }
    Ok(())
}

static TABLES_CHECKED: Lazy<Result<(), GrammarConflict>> = Lazy::new(|| {
    let result = check_decisions();
    match &result {
        Ok(()) => tracing::debug!(decisions = DECISIONS.len(), "FIRST-set table checked"),
        Err(conflict) => tracing::error!(%conflict, "FIRST-set table needs more than one token of lookahead"),
    }
    result
});

/// Runs [`check_decisions`] once per process and returns the cached result.
pub fn tables_checked() -> Result<(), &'static GrammarConflict> {
    let result: &'static Result<(), GrammarConflict> = &TABLES_CHECKED;
    result.as_ref().map(|_| ())
}

/// Writes one `FIRST set for NAME: { ... }` line per nonterminal.
pub fn write_first_sets<W: io::Write>(mut out: W) -> io::Result<()> {
    for nt in NonTerminal::ALL {
        writeln!(out, "FIRST set for {}: {}", nt, nt.first())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    #[test]
    fn test_decisions_are_disjoint() {
        assert_eq!(check_decisions(), Ok(()));
        assert!(tables_checked().is_ok());
    }

    #[test]
    fn test_expression_loops_are_checked() {
        let names = DECISIONS.iter().map(|d| d.name).collect::<Vec<_>>();
        for name in [
            "relExpr",
            "addExpr",
            "multExpr",
            "powExpr",
            "designator in groupExpr",
        ] {
            assert!(names.contains(&name), "{}", name);
        }
        let pow = DECISIONS.iter().find(|d| d.name == "powExpr").unwrap();
        let follow = pow.alternatives[1..]
            .iter()
            .fold(TokenSet::empty(), |acc, s| acc.with(s.first()));
        assert!(follow.has(Semicolon) && follow.has(Mul) && follow.has(IntVal));
        assert!(!follow.has(Pow));
    }

    #[test]
    fn test_all_is_in_ordinal_order() {
        for (i, nt) in NonTerminal::ALL.iter().enumerate() {
            assert_eq!(*nt as usize, i, "{:?}", nt);
        }
    }

    #[test]
    fn test_every_first_set_is_nonempty_and_clean() {
        for nt in NonTerminal::ALL {
            let first = nt.first();
            assert!(!first.is_empty(), "{}", nt);
            assert!(!first.has(Eof), "{}", nt);
            assert!(!first.has(TokenKind::Error), "{}", nt);
        }
    }

    #[test]
    fn test_composite_sets() {
        let union = |nts: &[NonTerminal]| {
            nts.iter()
                .fold(TokenSet::empty(), |acc, nt| acc.with(nt.first()))
        };
        assert_eq!(
            NonTerminal::Statement.first(),
            union(&[
                NonTerminal::VarDecl,
                NonTerminal::AssignStat,
                NonTerminal::FuncCallStat,
                NonTerminal::IfStat,
                NonTerminal::WhileStat,
                NonTerminal::DoWhileStat,
                NonTerminal::ForStat,
                NonTerminal::RepeatStat,
                NonTerminal::ReturnStat,
            ])
        );
        assert_eq!(
            NonTerminal::GroupExpr.first(),
            union(&[
                NonTerminal::Literal,
                NonTerminal::Designator,
                NonTerminal::Relation,
                NonTerminal::FuncCall,
            ])
            .with(Not.into())
        );
        for nt in [
            NonTerminal::PowExpr,
            NonTerminal::MultExpr,
            NonTerminal::AddExpr,
            NonTerminal::RelExpr,
        ] {
            assert_eq!(nt.first(), NonTerminal::GroupExpr.first(), "{}", nt);
        }
        assert_eq!(
            NonTerminal::Program.first(),
            NonTerminal::DeclList.first().with(Main.into())
        );
    }

    #[test]
    fn test_membership() {
        assert!(NonTerminal::MulOp.first().has(And));
        assert!(NonTerminal::AddOp.first().has(Or));
        assert!(!NonTerminal::AddOp.first().has(And));
        assert!(NonTerminal::AssignOp.first().has(PowAssign));
        assert!(!NonTerminal::Type.first().has(Void));
        assert!(NonTerminal::Literal.first().has(FloatVal));
        assert_eq!(
            NonTerminal::ParamList.first().kinds().collect::<Vec<_>>(),
            vec![OpenParen]
        );
    }

    #[test]
    fn test_conflict_is_reported() {
        let overlap = NonTerminal::Statement.first() & NonTerminal::DeclList.first();
        assert_eq!(overlap.to_string(), "{ bool int float }");
        let conflict = GrammarConflict {
            decision: "example",
            first: NonTerminal::Statement.into(),
            second: NonTerminal::DeclList.into(),
            overlap,
        };
        assert_eq!(
            conflict.to_string(),
            "example: FIRST(a token from STATEMENT) and FIRST(a token from DECL_LIST) share { bool int float }"
        );
    }

    #[test]
    fn test_write_first_sets() {
        let mut buf = Vec::new();
        write_first_sets(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), NonTerminal::COUNT);
        assert!(text.contains("FIRST set for MUL_OP: { && * / % }\n"));
        assert!(text.contains("FIRST set for FUNC_BODY: { { }\n"));
    }
}
