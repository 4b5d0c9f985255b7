//! Statement parsing.
//!
//! ```text
//! statement := var_def | assignment | if | while | break | continue | return | expr_stmt
//! var_def   := IDENT ':' IDENT ';'
//!            | IDENT ':' IDENT '=' expr ';'
//!            | IDENT ':=' expr ';'
//! assignment:= IDENT '=' expr ';'
//! if        := 'if' expr single_or_block ('else' single_or_block)?
//! while     := 'while' expr single_or_block
//! return    := 'return' expr ';'
//! expr_stmt := expr ';'
//! ```

use glyphc_lex::TokenKind;

use crate::ast::{NodeIndex, NodeKind};
use crate::Parser;

impl Parser {
    pub(crate) fn parse_statement(&mut self, _parent: NodeIndex) -> Option<NodeIndex> {
        match self.current_kind() {
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwBreak => self.parse_break(),
            TokenKind::KwContinue => self.parse_continue(),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::Ident if self.is_var_def_start() => self.parse_var_def(),
            TokenKind::Ident if self.peek_at(1).kind == TokenKind::Eq => self.parse_assignment(),
            _ => self.parse_expr_stmt(),
        }
    }

    fn is_var_def_start(&self) -> bool {
        matches!(self.peek_at(1).kind, TokenKind::Colon | TokenKind::ColonEq)
    }

    fn parse_var_def(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        let name_tok = self.expect(TokenKind::Ident, "a variable name")?;
        let name = name_tok.ident_symbol().expect("Ident token always carries a symbol");

        if self.match_token(TokenKind::ColonEq) {
            let init = self.parse_expression()?;
            let semi = self.expect(TokenKind::Semi, "`;`")?;
            let node = self.ast.push(NodeKind::VarDef { declared_type_name: None }, NodeIndex::NONE, Some(name), start_span.merge(semi.span));
            self.ast.add_child(node, init);
            self.reparent(init, node);
            return Some(node);
        }

        self.expect(TokenKind::Colon, "`:` or `:=`")?;
        let type_tok = self.expect(TokenKind::Ident, "a type name")?;
        let type_name = type_tok.ident_symbol().expect("Ident token always carries a symbol");

        if self.match_token(TokenKind::Eq) {
            let init = self.parse_expression()?;
            let semi = self.expect(TokenKind::Semi, "`;`")?;
            let node = self.ast.push(
                NodeKind::VarDef { declared_type_name: Some(type_name) },
                NodeIndex::NONE,
                Some(name),
                start_span.merge(semi.span),
            );
            self.ast.add_child(node, init);
            self.reparent(init, node);
            return Some(node);
        }

        let semi = self.expect(TokenKind::Semi, "`;`")?;
        Some(self.ast.push(
            NodeKind::VarDef { declared_type_name: Some(type_name) },
            NodeIndex::NONE,
            Some(name),
            start_span.merge(semi.span),
        ))
    }

    fn parse_assignment(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        let name_tok = self.expect(TokenKind::Ident, "a variable name")?;
        let name = name_tok.ident_symbol().expect("Ident token always carries a symbol");
        self.expect(TokenKind::Eq, "`=`")?;
        let rhs = self.parse_expression()?;
        let semi = self.expect(TokenKind::Semi, "`;`")?;
        let node = self.ast.push(NodeKind::Assignment, NodeIndex::NONE, Some(name), start_span.merge(semi.span));
        self.ast.add_child(node, rhs);
        self.reparent(rhs, node);
        Some(node)
    }

    fn parse_if(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        self.expect(TokenKind::KwIf, "`if`")?;
        let cond = self.parse_expression()?;
        let then_branch = self.parse_single_or_block()?;

        let node = self.ast.push(NodeKind::If, NodeIndex::NONE, None, start_span);
        self.ast.add_child(node, cond);
        self.ast.add_child(node, then_branch);
        self.reparent(cond, node);
        self.reparent(then_branch, node);

        let mut end_span = self.ast.get(then_branch).span;
        if self.match_token(TokenKind::KwElse) {
            let else_branch = self.parse_single_or_block()?;
            end_span = self.ast.get(else_branch).span;
            self.ast.add_child(node, else_branch);
            self.reparent(else_branch, node);
        }
        self.ast.get_mut(node).span = start_span.merge(end_span);
        Some(node)
    }

    fn parse_while(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        self.expect(TokenKind::KwWhile, "`while`")?;
        let cond = self.parse_expression()?;
        let body = self.parse_single_or_block()?;

        let node = self.ast.push(NodeKind::While, NodeIndex::NONE, None, start_span.merge(self.ast.get(body).span));
        self.ast.add_child(node, cond);
        self.ast.add_child(node, body);
        self.reparent(cond, node);
        self.reparent(body, node);
        Some(node)
    }

    /// `single_or_block := block | statement`
    fn parse_single_or_block(&mut self) -> Option<NodeIndex> {
        if self.check(TokenKind::LBrace) {
            self.parse_block()
        } else {
            self.parse_statement(NodeIndex::NONE)
        }
    }

    fn parse_break(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        self.expect(TokenKind::KwBreak, "`break`")?;
        let semi = self.expect(TokenKind::Semi, "`;`")?;
        Some(self.ast.push(NodeKind::Break, NodeIndex::NONE, None, start_span.merge(semi.span)))
    }

    fn parse_continue(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        self.expect(TokenKind::KwContinue, "`continue`")?;
        let semi = self.expect(TokenKind::Semi, "`;`")?;
        Some(self.ast.push(NodeKind::Continue, NodeIndex::NONE, None, start_span.merge(semi.span)))
    }

    fn parse_return(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        self.expect(TokenKind::KwReturn, "`return`")?;
        let value = self.parse_expression()?;
        let semi = self.expect(TokenKind::Semi, "`;`")?;
        let node = self.ast.push(NodeKind::Return, NodeIndex::NONE, None, start_span.merge(semi.span));
        self.ast.add_child(node, value);
        self.reparent(value, node);
        Some(node)
    }

    fn parse_expr_stmt(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        let expr = self.parse_expression()?;
        let semi = self.expect(TokenKind::Semi, "`;`")?;
        let node = self.ast.push(NodeKind::ExprStmt, NodeIndex::NONE, None, start_span.merge(semi.span));
        self.ast.add_child(node, expr);
        self.reparent(expr, node);
        Some(node)
    }
}
