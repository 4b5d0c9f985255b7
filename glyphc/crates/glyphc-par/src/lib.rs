//! glyphc-par — recursive-descent parser with checkpoint/rewind (SPEC §4.2).
//!
//! Produces a flat [`ast::Ast`] node pool from a [`glyphc_lex::Token`]
//! stream. Speculative rules capture a [`Checkpoint`] before committing to
//! an alternative; on failure the parser rewinds the token cursor and
//! truncates the node pool, which logically un-parses anything the failed
//! alternative had appended.

pub mod ast;
mod expr;
mod items;
mod stmt;

use glyphc_lex::{Token, TokenKind};
use glyphc_util::Span;

pub use ast::{Ast, BinOp, LiteralValue, Node, NodeIndex, NodeKind, TypeId, UnOp};

/// A parser error, bucketed as either intermediate (discarded if an
/// enclosing alternative ultimately succeeds) or unresolved (surfaced to
/// the user).
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

/// `(token index, node-pool cursor, parent's child count)`, captured
/// before a speculative rule and restored on failure.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    token_index: usize,
    node_pool_len: usize,
    parent_child_count: usize,
}

pub struct ParseOutput {
    pub ast: Ast,
    pub root: NodeIndex,
    pub errors: Vec<ParseError>,
}

/// Parse a complete token stream into a program AST.
pub fn parse(tokens: Vec<Token>) -> ParseOutput {
    let mut parser = Parser::new(tokens);
    let root = parser.parse_program();
    ParseOutput {
        ast: parser.ast,
        root,
        errors: parser.unresolved_errors,
    }
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    current: usize,
    pub(crate) ast: Ast,
    intermediate_errors: Vec<ParseError>,
    unresolved_errors: Vec<ParseError>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            ast: Ast::new(),
            intermediate_errors: Vec::new(),
            unresolved_errors: Vec::new(),
        }
    }

    // --- token cursor -----------------------------------------------

    pub(crate) fn peek(&self) -> &Token {
        let idx = self.current.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    pub(crate) fn advance(&mut self) -> Token {
        let tok = *self.peek();
        if !self.is_at_end() {
            self.current += 1;
        }
        tok
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or record an *intermediate* error and return `None`.
    /// Callers inside a speculative rule should propagate `None` upward so
    /// the enclosing rule can decide whether to rewind.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.intermediate_errors.push(ParseError {
                message: format!("expected {}, found {:?}", what, self.current_kind()),
                span: self.current_span(),
            });
            None
        }
    }

    // --- checkpoint / rewind -----------------------------------------

    pub(crate) fn checkpoint(&self, parent: NodeIndex) -> Checkpoint {
        let parent_child_count = if parent.is_none() {
            0
        } else {
            self.ast.get(parent).children.len()
        };
        Checkpoint {
            token_index: self.current,
            node_pool_len: self.ast.len(),
            parent_child_count,
        }
    }

    pub(crate) fn rewind(&mut self, cp: Checkpoint, parent: NodeIndex) {
        self.current = cp.token_index;
        self.ast.truncate(cp.node_pool_len);
        if !parent.is_none() {
            self.ast.get_mut(parent).children.truncate(cp.parent_child_count);
        }
    }

    /// Move every error recorded since `mark` into the unresolved bucket.
    /// Call this when the enclosing rule gives up on all alternatives.
    pub(crate) fn surface_intermediate_errors(&mut self, mark: usize) {
        let surfaced: Vec<_> = self.intermediate_errors.drain(mark..).collect();
        self.unresolved_errors.extend(surfaced);
    }

    /// Discard every error recorded since `mark`. Call this when a
    /// speculative alternative succeeded despite earlier failed attempts.
    pub(crate) fn discard_intermediate_errors(&mut self, mark: usize) {
        self.intermediate_errors.truncate(mark);
    }

    pub(crate) fn error_mark(&self) -> usize {
        self.intermediate_errors.len()
    }

    pub(crate) fn unresolved_error(&mut self, message: impl Into<String>, span: Span) {
        self.unresolved_errors.push(ParseError { message: message.into(), span });
    }

    pub(crate) fn intermediate_error(&mut self, message: impl Into<String>, span: Span) {
        self.intermediate_errors.push(ParseError { message: message.into(), span });
    }

    // --- resynchronization ---------------------------------------------

    /// Resync to the next `;` or matching `}` after a statement parse
    /// failure.
    pub(crate) fn resync_to_semi_or_rbrace(&mut self) {
        let mut depth: i32 = 0;
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Semi if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    depth -= 1;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Resync to the next source line after a function-header parse
    /// failure.
    pub(crate) fn resync_to_newline(&mut self) {
        let start_line = self.peek().line;
        while !self.is_at_end() && self.peek().line == start_line {
            self.advance();
        }
    }

    /// Point `child`'s parent link at `new_parent`. Used once a child
    /// expression/statement that was parsed standalone gets adopted by an
    /// enclosing node (e.g. a binary operator reparenting its operands).
    pub(crate) fn reparent(&mut self, child: NodeIndex, new_parent: NodeIndex) {
        self.ast.get_mut(child).parent = new_parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphc_lex::lex;
    use glyphc_util::FileId;

    fn parse_src(src: &str) -> ParseOutput {
        let tokens = lex(src, FileId::DUMMY).tokens;
        parse(tokens)
    }

    #[test]
    fn parses_minimal_function() {
        let out = parse_src("main :: () -> i32 { return 0; }");
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let program = out.ast.get(out.root);
        assert_eq!(program.children.len(), 1);
    }

    #[test]
    fn precedence_climbing_builds_left_associative_tree() {
        // 10 - 3 - 2 must parse as (10 - 3) - 2, not 10 - (3 - 2).
        let out = parse_src("main :: () -> i32 { return 10 - 3 - 2; }");
        assert!(out.errors.is_empty());
        let func = out.ast.get(out.ast.get(out.root).children[0]);
        let body = out.ast.get(func.children[1]);
        let ret = out.ast.get(body.children[0]);
        let outer = out.ast.get(ret.children[0]);
        match &outer.kind {
            NodeKind::Binary { op: BinOp::Sub } => {}
            other => panic!("expected outer Sub, got {:?}", other),
        }
        let lhs = out.ast.get(outer.children[0]);
        match &lhs.kind {
            NodeKind::Binary { op: BinOp::Sub } => {}
            other => panic!("expected lhs to be the inner (10 - 3), got {:?}", other),
        }
        let rhs = out.ast.get(outer.children[1]);
        assert!(matches!(rhs.kind, NodeKind::Literal { value: LiteralValue::Int(2) }));
    }

    #[test]
    fn checkpoint_rewind_restores_node_pool_and_cursor() {
        let tokens = lex("x", FileId::DUMMY).tokens;
        let mut parser = Parser::new(tokens);
        let before_len = parser.ast.len();
        let before_pos = parser.current;
        let cp = parser.checkpoint(NodeIndex::NONE);
        let _ = parser.parse_expression();
        assert!(parser.ast.len() > before_len);
        parser.rewind(cp, NodeIndex::NONE);
        assert_eq!(parser.ast.len(), before_len);
        assert_eq!(parser.current, before_pos);
    }

    #[test]
    fn statement_resync_recovers_after_malformed_statement() {
        // The first statement is malformed (missing `;`); the parser
        // should resync to `}` and keep the function header intact.
        let out = parse_src("main :: () -> i32 { x : i32 = 1 return x; }");
        assert!(!out.errors.is_empty());
        assert_eq!(out.ast.get(out.root).children.len(), 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use glyphc_lex::lex;
    use glyphc_util::FileId;
    use proptest::prelude::*;

    proptest! {
        /// Whatever a speculative expression parse does to the token
        /// cursor and node pool — succeed, fail partway, or leave
        /// intermediate errors behind — `rewind` always restores both to
        /// exactly their pre-checkpoint state.
        #[test]
        fn checkpoint_rewind_restores_state_for_arbitrary_input(src in "[a-z0-9 +\\-*/(){};:=]{0,40}") {
            let tokens = lex(&src, FileId::DUMMY).tokens;
            let mut parser = Parser::new(tokens);
            let before_len = parser.ast.len();
            let before_pos = parser.current;
            let before_errors = parser.intermediate_errors.len();
            let cp = parser.checkpoint(NodeIndex::NONE);
            let _ = parser.parse_expression();
            parser.rewind(cp, NodeIndex::NONE);
            parser.intermediate_errors.truncate(before_errors);
            prop_assert_eq!(parser.ast.len(), before_len);
            prop_assert_eq!(parser.current, before_pos);
        }
    }
}
