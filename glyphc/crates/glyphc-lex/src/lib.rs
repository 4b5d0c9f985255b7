//! glyphc-lex — lexical analysis.
//!
//! Turns Glyph source bytes into a flat token stream (SPEC §4.1). Owns
//! nothing beyond the token vector it returns: identifiers are interned
//! through the process-global [`glyphc_util::Symbol`] table, so later
//! phases never need a back-reference into this crate.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::{lex, LexOutput};
pub use token::{Token, TokenAttribute, TokenKind};

#[cfg(test)]
mod tests {
    use super::*;
    use glyphc_util::FileId;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src, FileId::DUMMY).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        let out = lex("  x // comment\n  y", FileId::DUMMY);
        assert!(!out.had_errors);
        assert_eq!(kinds("  x // comment\n  y"), vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn nested_block_comments() {
        let out = lex("/* outer /* inner */ still-outer */ x", FileId::DUMMY);
        assert!(!out.had_errors);
        let last_real = out.tokens.iter().rev().nth(1).unwrap();
        assert_eq!(last_real.kind, TokenKind::Ident);
    }

    #[test]
    fn two_char_operators_win_over_one_char_prefix() {
        assert_eq!(kinds("a == b"), vec![TokenKind::Ident, TokenKind::EqEq, TokenKind::Ident, TokenKind::Eof]);
        assert_eq!(kinds("a:=b"), vec![TokenKind::Ident, TokenKind::ColonEq, TokenKind::Ident, TokenKind::Eof]);
        assert_eq!(kinds("a::b"), vec![TokenKind::Ident, TokenKind::ColonColon, TokenKind::Ident, TokenKind::Eof]);
        assert_eq!(kinds("a->b"), vec![TokenKind::Ident, TokenKind::Arrow, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn keywords_re_kind_after_intern() {
        assert_eq!(kinds("if else while"), vec![TokenKind::KwIf, TokenKind::KwElse, TokenKind::KwWhile, TokenKind::Eof]);
    }

    #[test]
    fn integer_literal_fold_multiply_add() {
        let out = lex("12345", FileId::DUMMY);
        assert_eq!(out.tokens[0].int_value(), Some(12345));
    }

    #[test]
    fn unrecognized_byte_produces_error_token_and_continues() {
        let out = lex("x @ y", FileId::DUMMY);
        assert!(out.had_errors);
        assert_eq!(kinds("x @ y"), vec![TokenKind::Ident, TokenKind::Error, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn identical_identifiers_intern_to_the_same_symbol() {
        let out = lex("count count2 count", FileId::DUMMY);
        let a = out.tokens[0].ident_symbol().unwrap();
        let b = out.tokens[1].ident_symbol().unwrap();
        let c = out.tokens[2].ident_symbol().unwrap();
        assert_eq!(a, c);
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use glyphc_util::FileId;
    use proptest::prelude::*;

    fn fold_multiply_add(digits: &str) -> i64 {
        let mut value: i64 = 0;
        for byte in digits.bytes() {
            value = value.wrapping_mul(10).wrapping_add((byte - b'0') as i64);
        }
        value
    }

    proptest! {
        /// Lexing the same source twice always produces the same token-kind
        /// sequence — the lexer carries no hidden state across runs.
        #[test]
        fn lexing_is_deterministic(src in "[ -~\n\t]{0,200}") {
            let a: Vec<TokenKind> = lex(&src, FileId::DUMMY).tokens.iter().map(|t| t.kind).collect();
            let b: Vec<TokenKind> = lex(&src, FileId::DUMMY).tokens.iter().map(|t| t.kind).collect();
            prop_assert_eq!(a, b);
        }

        /// Any run of ASCII letters lexes to a single `Ident` (or keyword/
        /// bool-literal re-kind) token spanning the whole run, never split.
        #[test]
        fn identifier_runs_lex_to_a_single_token(ident in "[a-zA-Z][a-zA-Z0-9_]{0,15}") {
            let out = lex(&ident, FileId::DUMMY);
            prop_assert!(!out.had_errors);
            prop_assert_eq!(out.tokens.len(), 2); // the identifier token plus Eof
            prop_assert_ne!(out.tokens[0].kind, TokenKind::Error);
        }

        /// Any run of decimal digits lexes to one `IntLiteral` whose value
        /// matches the fold-multiply-add reference algorithm exactly.
        #[test]
        fn integer_literals_match_fold_multiply_add(digits in "[0-9]{1,18}") {
            let out = lex(&digits, FileId::DUMMY);
            prop_assert!(!out.had_errors);
            prop_assert_eq!(out.tokens[0].kind, TokenKind::IntLiteral);
            prop_assert_eq!(out.tokens[0].int_value(), Some(fold_multiply_add(&digits)));
        }
    }
}
