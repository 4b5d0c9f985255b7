//! Top-level item parsing: `program := function*`.

use glyphc_lex::TokenKind;
use glyphc_util::Symbol;

use crate::ast::{NodeIndex, NodeKind};
use crate::Parser;

impl Parser {
    /// `program := function*`
    pub(crate) fn parse_program(&mut self) -> NodeIndex {
        let start_span = self.current_span();
        let program = self.ast.push(NodeKind::Program, NodeIndex::NONE, None, start_span);

        while !self.is_at_end() {
            let mark = self.error_mark();
            let cp = self.checkpoint(program);
            match self.parse_function(program) {
                Some(func) => {
                    self.discard_intermediate_errors(mark);
                    self.ast.add_child(program, func);
                }
                None => {
                    self.surface_intermediate_errors(mark);
                    self.rewind(cp, program);
                    self.resync_to_newline();
                }
            }
        }

        program
    }

    /// `function := IDENT '::' '(' param_list? ')' '->' IDENT block`
    fn parse_function(&mut self, parent: NodeIndex) -> Option<NodeIndex> {
        let start_span = self.current_span();
        let name_tok = self.expect(TokenKind::Ident, "a function name")?;
        let name = name_tok.ident_symbol().expect("Ident token always carries a symbol");

        self.expect(TokenKind::ColonColon, "`::`")?;
        self.expect(TokenKind::LParen, "`(`")?;

        let func = self.ast.push(NodeKind::Function { ret_type_name: Symbol::intern("") }, parent, Some(name), start_span);

        if !self.check(TokenKind::RParen) {
            loop {
                let param = self.parse_param(func)?;
                self.ast.add_child(func, param);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Arrow, "`->`")?;

        let ret_type_tok = self.expect(TokenKind::Ident, "a return type name")?;
        let ret_type_name = ret_type_tok.ident_symbol().expect("Ident token always carries a symbol");
        if let NodeKind::Function { ret_type_name: slot } = &mut self.ast.get_mut(func).kind {
            *slot = ret_type_name;
        }

        let body = self.parse_block()?;
        self.ast.add_child(func, body);

        let end_span = self.ast.get(body).span;
        self.ast.get_mut(func).span = start_span.merge(end_span);

        Some(func)
    }

    /// `param := IDENT ':' IDENT`
    fn parse_param(&mut self, parent: NodeIndex) -> Option<NodeIndex> {
        let start_span = self.current_span();
        let name_tok = self.expect(TokenKind::Ident, "a parameter name")?;
        let name = name_tok.ident_symbol().expect("Ident token always carries a symbol");
        self.expect(TokenKind::Colon, "`:`")?;
        let type_tok = self.expect(TokenKind::Ident, "a type name")?;
        let type_name = type_tok.ident_symbol().expect("Ident token always carries a symbol");
        Some(self.ast.push(NodeKind::Param { type_name }, parent, Some(name), start_span))
    }

    /// `block := '{' statement* '}'`
    pub(crate) fn parse_block(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        self.expect(TokenKind::LBrace, "`{`")?;
        let block = self.ast.push(NodeKind::Block, NodeIndex::NONE, None, start_span);

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let mark = self.error_mark();
            let cp = self.checkpoint(block);
            match self.parse_statement(block) {
                Some(stmt) => {
                    self.discard_intermediate_errors(mark);
                    self.ast.add_child(block, stmt);
                }
                None => {
                    self.surface_intermediate_errors(mark);
                    self.rewind(cp, block);
                    self.resync_to_semi_or_rbrace();
                }
            }
        }

        let end_tok = self.expect(TokenKind::RBrace, "`}`")?;
        self.ast.get_mut(block).span = start_span.merge(end_tok.span);
        Some(block)
    }
}
