//! Lexer: bytes to tokens.
//!
//! Grounded on SPEC §4.1. Whitespace and comments are skipped (block
//! comments nest via a depth counter), two-character operators are tried
//! before their one-character prefix, identifiers are interned through
//! [`glyphc_util::Symbol`], and an unrecognized byte produces an `ERROR`
//! token spanning up to the next delimiter rather than aborting the scan.

use glyphc_util::{FileId, Span, Symbol};

use crate::cursor::Cursor;
use crate::token::{Token, TokenAttribute, TokenKind};

/// Output of lexing a whole source file.
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub had_errors: bool,
}

/// Lex `source` (belonging to `file_id`, for span attribution) into a flat
/// token stream terminated by a single trailing `Eof` token.
pub fn lex(source: &str, file_id: FileId) -> LexOutput {
    let mut lexer = Lexer::new(source, file_id);
    lexer.run();
    LexOutput {
        tokens: lexer.tokens,
        had_errors: lexer.had_errors,
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_delimiter(b: u8) -> bool {
    b == 0
        || b.is_ascii_whitespace()
        || matches!(
            b,
            b'.' | b',' | b';' | b':' | b'(' | b')' | b'{' | b'}' | b'[' | b']' | b'+' | b'-' | b'*' | b'/' | b'%' | b'=' | b'<' | b'>' | b'!' | b'&' | b'|'
        )
}

struct Lexer<'a> {
    cursor: Cursor<'a>,
    file_id: FileId,
    tokens: Vec<Token>,
    had_errors: bool,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, file_id: FileId) -> Self {
        Self {
            cursor: Cursor::new(source),
            file_id,
            tokens: Vec::new(),
            had_errors: false,
        }
    }

    fn run(&mut self) {
        loop {
            self.skip_whitespace_and_comments();
            let start = self.cursor.position();
            let line = self.cursor.line();
            let column = self.cursor.column();
            if self.cursor.is_at_end() {
                self.push(TokenKind::Eof, TokenAttribute::None, start, line, column);
                break;
            }
            self.scan_token(start, line, column);
        }
    }

    fn push(&mut self, kind: TokenKind, attribute: TokenAttribute, start: usize, line: u32, column: u32) {
        let end = self.cursor.position();
        let span = Span::with_file(start, end, self.file_id, line, column);
        self.tokens.push(Token {
            kind,
            attribute,
            line,
            column,
            lexeme_length: (end - start) as u32,
            source_offset: start as u32,
            span,
        });
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current() {
                b' ' | b'\t' | b'\r' | b'\n' => self.cursor.advance(),
                b'/' if self.cursor.peek(1) == b'/' => {
                    while !self.cursor.is_at_end() && self.cursor.current() != b'\n' {
                        self.cursor.advance();
                    }
                }
                b'/' if self.cursor.peek(1) == b'*' => {
                    self.cursor.advance_by(2);
                    let mut depth: u32 = 1;
                    while depth > 0 && !self.cursor.is_at_end() {
                        if self.cursor.current() == b'/' && self.cursor.peek(1) == b'*' {
                            depth += 1;
                            self.cursor.advance_by(2);
                        } else if self.cursor.current() == b'*' && self.cursor.peek(1) == b'/' {
                            depth -= 1;
                            self.cursor.advance_by(2);
                        } else {
                            self.cursor.advance();
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self, start: usize, line: u32, column: u32) {
        let b = self.cursor.current();

        if is_ident_start(b) {
            return self.scan_identifier_or_keyword(start, line, column);
        }
        if b.is_ascii_digit() {
            return self.scan_number(start, line, column);
        }

        // Two-character operators are tried before their one-character
        // prefix by looking at the next byte before committing.
        let two = (b, self.cursor.peek(1));
        let two_char_kind = match two {
            (b'=', b'=') => Some(TokenKind::EqEq),
            (b'!', b'=') => Some(TokenKind::NotEq),
            (b'<', b'=') => Some(TokenKind::LtEq),
            (b'>', b'=') => Some(TokenKind::GtEq),
            (b'-', b'>') => Some(TokenKind::Arrow),
            (b':', b':') => Some(TokenKind::ColonColon),
            (b':', b'=') => Some(TokenKind::ColonEq),
            (b'&', b'&') => Some(TokenKind::AndAnd),
            (b'|', b'|') => Some(TokenKind::OrOr),
            _ => None,
        };
        if let Some(kind) = two_char_kind {
            self.cursor.advance_by(2);
            return self.push(kind, TokenAttribute::None, start, line, column);
        }

        let one_char_kind = match b {
            b'.' => Some(TokenKind::Dot),
            b',' => Some(TokenKind::Comma),
            b';' => Some(TokenKind::Semi),
            b':' => Some(TokenKind::Colon),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b'[' => Some(TokenKind::LBracket),
            b']' => Some(TokenKind::RBracket),
            b'+' => Some(TokenKind::Plus),
            b'-' => Some(TokenKind::Minus),
            b'*' => Some(TokenKind::Star),
            b'/' => Some(TokenKind::Slash),
            b'%' => Some(TokenKind::Percent),
            b'=' => Some(TokenKind::Eq),
            b'<' => Some(TokenKind::Lt),
            b'>' => Some(TokenKind::Gt),
            b'!' => Some(TokenKind::Bang),
            _ => None,
        };
        if let Some(kind) = one_char_kind {
            self.cursor.advance();
            return self.push(kind, TokenAttribute::None, start, line, column);
        }

        // Unrecognized character: consume up to the next delimiter and
        // emit a single ERROR token covering the whole run.
        self.had_errors = true;
        while !self.cursor.is_at_end() && !is_delimiter(self.cursor.current()) {
            self.cursor.advance();
        }
        if self.cursor.position() == start {
            self.cursor.advance();
        }
        self.push(TokenKind::Error, TokenAttribute::None, start, line, column);
    }

    fn scan_identifier_or_keyword(&mut self, start: usize, line: u32, column: u32) {
        while is_ident_continue(self.cursor.current()) {
            self.cursor.advance();
        }
        let end = self.cursor.position();
        let text = self.source_slice(start, end);

        if let Some(kind) = TokenKind::keyword_from_str(text) {
            return self.push(kind, TokenAttribute::None, start, line, column);
        }
        if text == "true" {
            return self.push(TokenKind::BoolLiteral, TokenAttribute::Bool(true), start, line, column);
        }
        if text == "false" {
            return self.push(TokenKind::BoolLiteral, TokenAttribute::Bool(false), start, line, column);
        }

        let symbol = Symbol::intern(text);
        self.push(TokenKind::Ident, TokenAttribute::Ident(symbol), start, line, column);
    }

    fn scan_number(&mut self, start: usize, line: u32, column: u32) {
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }
        if self.cursor.current() == b'.' && self.cursor.peek(1).is_ascii_digit() {
            self.cursor.advance(); // consume '.'
            while self.cursor.current().is_ascii_digit() {
                self.cursor.advance();
            }
            let end = self.cursor.position();
            let text = self.source_slice(start, end);
            let value: f64 = text.parse().unwrap_or(0.0);
            return self.push(TokenKind::FloatLiteral, TokenAttribute::Float(value), start, line, column);
        }

        let end = self.cursor.position();
        let text = self.source_slice(start, end);
        // Fold-multiply-add, matching SPEC §4.1 exactly rather than
        // delegating to the standard library's integer parser.
        let mut value: i64 = 0;
        for byte in text.bytes() {
            value = value.wrapping_mul(10).wrapping_add((byte - b'0') as i64);
        }
        self.push(TokenKind::IntLiteral, TokenAttribute::Int(value), start, line, column);
    }

    fn source_slice(&self, start: usize, end: usize) -> &'a str {
        let bytes = &self.cursor.full_source()[start..end];
        std::str::from_utf8(bytes).unwrap_or("")
    }
}
