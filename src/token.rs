use std::fmt;

use crate::diagnostics::SourcePosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    NoneLiteral,
    TrueLiteral,
    FalseLiteral,
    StringLiteral,
    NumberLiteral,
    EndOfLine,
    EndOfFile,
    Identifier,

    Begin,
    If,
    Elif,
    Else,
    For,
    End,
    Func,
    And,
    Or,
    Not,
    To,
    Step,
    In,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    Plus,
    Minus,
    Star,
    Slash,
    ParenLeft,
    ParenRight,
    SquareBracketLeft,
    SquareBracketRight,
    Dot,
    Comma,
}

/// Reserved spellings and the kinds they lex to.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("none", TokenKind::NoneLiteral),
    ("true", TokenKind::TrueLiteral),
    ("false", TokenKind::FalseLiteral),
    ("begin", TokenKind::Begin),
    ("end", TokenKind::End),
    ("if", TokenKind::If),
    ("elif", TokenKind::Elif),
    ("else", TokenKind::Else),
    ("for", TokenKind::For),
    ("func", TokenKind::Func),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("not", TokenKind::Not),
    ("to", TokenKind::To),
    ("step", TokenKind::Step),
    ("in", TokenKind::In),
];

/// Two-character operators, matched before any single-character symbol.
pub const DOUBLE_SYMBOLS: &[(&str, TokenKind)] = &[
    ("==", TokenKind::Equals),
    ("!=", TokenKind::NotEquals),
    ("<=", TokenKind::LessThanOrEquals),
    (">=", TokenKind::GreaterThanOrEquals),
    ("+=", TokenKind::PlusAssign),
    ("-=", TokenKind::MinusAssign),
    ("*=", TokenKind::StarAssign),
    ("/=", TokenKind::SlashAssign),
];

pub const SINGLE_SYMBOLS: &[(&str, TokenKind)] = &[
    ("=", TokenKind::Assign),
    ("<", TokenKind::LessThan),
    (">", TokenKind::GreaterThan),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("(", TokenKind::ParenLeft),
    (")", TokenKind::ParenRight),
    ("[", TokenKind::SquareBracketLeft),
    ("]", TokenKind::SquareBracketRight),
    (".", TokenKind::Dot),
    (",", TokenKind::Comma),
];

pub fn keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == text)
        .map(|(_, kind)| *kind)
}

pub fn double_symbol(first: char, second: char) -> Option<TokenKind> {
    DOUBLE_SYMBOLS
        .iter()
        .find(|(spelling, _)| {
            let mut chars = spelling.chars();
            chars.next() == Some(first) && chars.next() == Some(second)
        })
        .map(|(_, kind)| *kind)
}

pub fn single_symbol(ch: char) -> Option<TokenKind> {
    SINGLE_SYMBOLS
        .iter()
        .find(|(spelling, _)| {
            let mut chars = spelling.chars();
            chars.next() == Some(ch) && chars.next().is_none()
        })
        .map(|(_, kind)| *kind)
}

impl TokenKind {
    /// Canonical source text of kinds that have exactly one spelling.
    pub fn spelling(self) -> Option<&'static str> {
        if self == TokenKind::EndOfLine {
            return Some("\n");
        }
        KEYWORDS
            .iter()
            .chain(DOUBLE_SYMBOLS.iter())
            .chain(SINGLE_SYMBOLS.iter())
            .find(|(_, kind)| *kind == self)
            .map(|(spelling, _)| *spelling)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::NoneLiteral
                | TokenKind::TrueLiteral
                | TokenKind::FalseLiteral
                | TokenKind::NumberLiteral
                | TokenKind::StringLiteral
        )
    }

    pub fn is_term_op(self) -> bool {
        matches!(self, TokenKind::Plus | TokenKind::Minus)
    }

    pub fn is_factor_op(self) -> bool {
        matches!(self, TokenKind::Star | TokenKind::Slash)
    }

    pub fn is_comparison_op(self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::LessThan
                | TokenKind::LessThanOrEquals
                | TokenKind::GreaterThan
                | TokenKind::GreaterThanOrEquals
        )
    }

    pub fn is_unary_op(self) -> bool {
        matches!(self, TokenKind::Not | TokenKind::Minus)
    }

    /// `=` or one of the compound forms.
    pub fn is_assignment(self) -> bool {
        self == TokenKind::Assign || self.compound_operator().is_some()
    }

    /// Binary operator a compound assignment desugars to.
    pub fn compound_operator(self) -> Option<TokenKind> {
        match self {
            TokenKind::PlusAssign => Some(TokenKind::Plus),
            TokenKind::MinusAssign => Some(TokenKind::Minus),
            TokenKind::StarAssign => Some(TokenKind::Star),
            TokenKind::SlashAssign => Some(TokenKind::Slash),
            _ => None,
        }
    }

    pub fn ends_statement(self) -> bool {
        matches!(self, TokenKind::EndOfLine | TokenKind::EndOfFile)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: SourcePosition,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {:?}", self.position, self.kind, self.text)
    }
}
