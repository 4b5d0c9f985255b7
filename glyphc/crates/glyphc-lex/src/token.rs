//! Token kinds and the attribute payload later phases read off a token.

use glyphc_util::{Span, Symbol};

/// The syntactic category of a token.
///
/// Two-character operators are distinct variants from their one-character
/// prefixes (`ColonEq` is never confused with `Colon` followed by `Eq`) —
/// the lexer commits to the longer match before emitting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    IntLiteral,
    FloatLiteral,
    BoolLiteral,
    Ident,

    KwIf,
    KwElse,
    KwFor,
    KwWhile,
    KwContinue,
    KwBreak,
    KwReturn,

    Dot,
    Comma,
    Semi,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Lt,
    Gt,
    Bang,

    EqEq,
    NotEq,
    LtEq,
    GtEq,
    Arrow,
    ColonColon,
    ColonEq,
    AndAnd,
    OrOr,

    Eof,
    Error,
}

impl TokenKind {
    /// Keywords as recognized by post-lex string match against a freshly
    /// formed identifier. Order doesn't matter; this is a direct match.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        Some(match s {
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "for" => TokenKind::KwFor,
            "while" => TokenKind::KwWhile,
            "continue" => TokenKind::KwContinue,
            "break" => TokenKind::KwBreak,
            "return" => TokenKind::KwReturn,
            "true" | "false" => return None, // handled as BoolLiteral, not a keyword re-kind
            _ => return None,
        })
    }
}

/// The tagged payload a token carries, if any.
#[derive(Debug, Clone, Copy)]
pub enum TokenAttribute {
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    Ident(Symbol),
}

/// A single lexed token.
///
/// Position fields (`line`, `column`, `source_offset`, `lexeme_length`)
/// exist solely for diagnostics; no later phase branches on them.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub attribute: TokenAttribute,
    pub line: u32,
    pub column: u32,
    pub lexeme_length: u32,
    pub source_offset: u32,
    pub span: Span,
}

impl Token {
    pub fn ident_symbol(&self) -> Option<Symbol> {
        match self.attribute {
            TokenAttribute::Ident(s) => Some(s),
            _ => None,
        }
    }

    pub fn int_value(&self) -> Option<i64> {
        match self.attribute {
            TokenAttribute::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn float_value(&self) -> Option<f64> {
        match self.attribute {
            TokenAttribute::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.attribute {
            TokenAttribute::Bool(v) => Some(v),
            _ => None,
        }
    }
}
