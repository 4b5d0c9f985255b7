//! Expression parsing: precedence climbing over SPEC §4.2's binary
//! operator table, left-associative throughout.
//!
//! ```text
//! expr    := precedence-climbed from unary
//! unary   := '-' unary | '!' unary | primary
//! primary := INT_LIT | FLOAT_LIT | BOOL_LIT
//!          | IDENT | IDENT '(' arg_list? ')' | '(' expr ')'
//! ```

use glyphc_lex::{Token, TokenKind};

use crate::ast::{BinOp, LiteralValue, NodeIndex, NodeKind, UnOp};
use crate::Parser;

fn binop_for(kind: TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::AndAnd => BinOp::And,
        TokenKind::OrOr => BinOp::Or,
        TokenKind::EqEq => BinOp::Eq,
        TokenKind::NotEq => BinOp::Ne,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::LtEq => BinOp::Le,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::GtEq => BinOp::Ge,
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::Percent => BinOp::Mod,
        _ => return None,
    })
}

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Option<NodeIndex> {
        self.parse_binary(0)
    }

    /// After parsing a primary, look ahead at the next operator; if its
    /// priority is >= `min_priority`, consume it, parse the right side with
    /// `min_priority = priority + 1` (giving left-associativity), build
    /// the binary node, and repeat.
    fn parse_binary(&mut self, min_priority: u8) -> Option<NodeIndex> {
        let mut lhs = self.parse_unary()?;

        loop {
            let Some(op) = binop_for(self.current_kind()) else { break };
            if op.priority() < min_priority {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(op.priority() + 1)?;

            let span = self.ast.get(lhs).span.merge(self.ast.get(rhs).span);
            let node = self.ast.push(NodeKind::Binary { op }, NodeIndex::NONE, None, span);
            self.ast.add_child(node, lhs);
            self.ast.add_child(node, rhs);
            self.reparent(lhs, node);
            self.reparent(rhs, node);
            lhs = node;
        }

        Some(lhs)
    }

    fn parse_unary(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        let op = match self.current_kind() {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Bang => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            let span = start_span.merge(self.ast.get(operand).span);
            let node = self.ast.push(NodeKind::Unary { op }, NodeIndex::NONE, None, span);
            self.ast.add_child(node, operand);
            self.reparent(operand, node);
            return Some(node);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<NodeIndex> {
        let start_span = self.current_span();
        match self.current_kind() {
            TokenKind::IntLiteral => {
                let tok: Token = self.advance();
                Some(self.ast.push(
                    NodeKind::Literal { value: LiteralValue::Int(tok.int_value().unwrap()) },
                    NodeIndex::NONE,
                    None,
                    start_span,
                ))
            }
            TokenKind::FloatLiteral => {
                let tok = self.advance();
                Some(self.ast.push(
                    NodeKind::Literal { value: LiteralValue::Float(tok.float_value().unwrap()) },
                    NodeIndex::NONE,
                    None,
                    start_span,
                ))
            }
            TokenKind::BoolLiteral => {
                let tok = self.advance();
                Some(self.ast.push(
                    NodeKind::Literal { value: LiteralValue::Bool(tok.bool_value().unwrap()) },
                    NodeIndex::NONE,
                    None,
                    start_span,
                ))
            }
            TokenKind::Ident => {
                let tok = self.advance();
                let name = tok.ident_symbol().expect("Ident token always carries a symbol");
                if self.match_token(TokenKind::LParen) {
                    let call = self.ast.push(NodeKind::Call, NodeIndex::NONE, Some(name), start_span);
                    if !self.check(TokenKind::RParen) {
                        loop {
                            let arg = self.parse_expression()?;
                            self.ast.add_child(call, arg);
                            self.reparent(arg, call);
                            if !self.match_token(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let rparen = self.expect(TokenKind::RParen, "`)`")?;
                    self.ast.get_mut(call).span = start_span.merge(rparen.span);
                    Some(call)
                } else {
                    Some(self.ast.push(NodeKind::VarRef, NodeIndex::NONE, Some(name), start_span))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Some(inner)
            }
            _ => {
                self.intermediate_error(format!("expected an expression, found {:?}", self.current_kind()), start_span);
                None
            }
        }
    }
}
