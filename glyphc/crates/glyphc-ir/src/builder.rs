//! Lowers an analyzed AST (`glyphc-par::Ast` + `glyphc-sem::AnalysisOutput`)
//! into an [`IrProgram`].
//!
//! One [`FunctionBuilder`] per source function owns that function's
//! register table and the (definition node → register) map used to
//! resolve `VarRef`/`Assignment` back to the register holding that
//! variable's current value.

use std::collections::HashMap;

use glyphc_par::ast::{Ast, BinOp, LiteralValue, NodeIndex, NodeKind};
use glyphc_sem::analysis::{AnalysisOutput, SymbolRef};
use glyphc_sem::types::{PrimitiveType, TypeId, TypeInterner, TypeSignature};

use crate::ir::{Callee, IrCodeBlock, IrFunction, IrFunctionId, IrInstruction, IrProgram, OperandType, RegisterId, RegisterInfo};

pub fn build_program(ast: &Ast, analysis: &AnalysisOutput) -> IrProgram {
    let mut program = IrProgram::default();
    let mut id_for_index: HashMap<usize, IrFunctionId> = HashMap::new();

    for (index, info) in analysis.functions.iter().enumerate() {
        let mut builder = FunctionBuilder::new(&analysis.types);
        let params = info
            .params
            .iter()
            .map(|&(name, type_id)| builder.registers.push(RegisterInfo { type_id, name: Some(name) }))
            .collect::<Vec<_>>();
        // Parameter registers were just pushed in declaration order; pair
        // each with its defining `Param` node so `VarRef`s inside the body
        // resolve to the right register.
        let param_nodes: Vec<NodeIndex> = ast.get(info.def_node).children.iter().copied().filter(|&c| matches!(ast.get(c).kind, NodeKind::Param { .. })).collect();
        for (node, &reg) in param_nodes.iter().zip(params.iter()) {
            builder.node_register.insert(*node, reg);
        }

        let body = if info.body.is_none() { IrCodeBlock::default() } else { builder.lower_block_node(ast, analysis, info.body) };

        let func = IrFunction { name: info.name, params, return_type: info.ret, registers: builder.registers, body };
        let id = program.functions.push(func);
        id_for_index.insert(index, id);
    }

    program.main = analysis.main_index.and_then(|i| id_for_index.get(&i).copied());
    program
}

struct FunctionBuilder<'a> {
    types: &'a TypeInterner,
    registers: glyphc_util::IndexVec<RegisterId, RegisterInfo>,
    /// Maps a `VarDef`/`Param` node to the register that holds its value.
    node_register: HashMap<NodeIndex, RegisterId>,
}

impl<'a> FunctionBuilder<'a> {
    fn new(types: &'a TypeInterner) -> Self {
        Self { types, registers: glyphc_util::IndexVec::new(), node_register: HashMap::new() }
    }

    fn primitive_of(&self, type_id: TypeId) -> PrimitiveType {
        match self.types.get(type_id) {
            TypeSignature::Primitive(p) => *p,
            other => unreachable!("expected a primitive type signature, found {:?}", other),
        }
    }

    fn is_pointer(&self, type_id: TypeId) -> bool {
        matches!(self.types.get(type_id), TypeSignature::Pointer { .. })
    }

    fn fresh(&mut self, type_id: TypeId) -> RegisterId {
        self.registers.push(RegisterInfo { type_id, name: None })
    }

    fn node_type(&self, ast: &Ast, node: NodeIndex) -> TypeId {
        ast.get(node).type_id.expect("expression nodes are annotated with a type by glyphc-sem")
    }

    /// Lower a statement that is itself a `Block` node, flattening its
    /// children into one code block (blocks are a scoping device only —
    /// scope resolution already happened during analysis).
    fn lower_block_node(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex) -> IrCodeBlock {
        let mut out = Vec::new();
        for &child in &ast.get(node).children {
            self.lower_statement(ast, analysis, child, &mut out);
        }
        IrCodeBlock { instructions: out }
    }

    /// `single_or_block` lowering: the grammar allows an `if`/`while` body
    /// to be either a `Block` or a single bare statement.
    fn lower_body(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex) -> IrCodeBlock {
        if matches!(ast.get(node).kind, NodeKind::Block) {
            self.lower_block_node(ast, analysis, node)
        } else {
            let mut out = Vec::new();
            self.lower_statement(ast, analysis, node, &mut out);
            IrCodeBlock { instructions: out }
        }
    }

    fn lower_statement(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex, out: &mut Vec<IrInstruction>) {
        match ast.get(node).kind.clone() {
            NodeKind::Block => {
                for &child in &ast.get(node).children {
                    self.lower_statement(ast, analysis, child, out);
                }
            }
            NodeKind::VarDef { .. } => self.lower_var_def(ast, analysis, node, out),
            NodeKind::Assignment => self.lower_assignment(ast, analysis, node, out),
            NodeKind::If => self.lower_if(ast, analysis, node, out),
            NodeKind::While => self.lower_while(ast, analysis, node, out),
            NodeKind::Break => out.push(IrInstruction::Break),
            NodeKind::Continue => out.push(IrInstruction::Continue),
            NodeKind::Return => {
                let value = ast.get(node).children.first().map(|&e| self.lower_expr(ast, analysis, e, out));
                out.push(IrInstruction::Return { value });
            }
            NodeKind::ExprStmt => {
                if let Some(&expr) = ast.get(node).children.first() {
                    self.lower_expr(ast, analysis, expr, out);
                }
            }
            other => unreachable!("{:?} is not a statement", other),
        }
    }

    fn lower_var_def(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex, out: &mut Vec<IrInstruction>) {
        let var_type = self.node_type(ast, node);
        let dst = self.fresh(var_type);
        self.node_register.insert(node, dst);

        if let Some(&init) = ast.get(node).children.first() {
            let init_type = self.node_type(ast, init);
            let value = self.lower_expr(ast, analysis, init, out);
            if init_type == var_type {
                out.push(IrInstruction::Move { dst, src: value });
            } else {
                // Declared type differs from the initializer's inferred type
                // but both are numeric (analysis would otherwise have
                // rejected this) — insert the explicit numeric cast SPEC
                // §4.3 calls for.
                out.push(IrInstruction::Cast { dst, src: value, to: self.primitive_of(var_type), from: self.primitive_of(init_type) });
            }
        }
    }

    fn lower_assignment(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex, out: &mut Vec<IrInstruction>) {
        let Some(SymbolRef::Variable { definition_node }) = analysis.node_to_symbol.get(&node).copied() else {
            unreachable!("Assignment node must resolve to a variable after successful analysis")
        };
        let dst = *self.node_register.get(&definition_node).expect("variable's defining node must have a register");
        let rhs = ast.get(node).children[0];
        let value = self.lower_expr(ast, analysis, rhs, out);
        out.push(IrInstruction::Move { dst, src: value });
    }

    fn lower_if(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex, out: &mut Vec<IrInstruction>) {
        let children = ast.get(node).children.clone();
        let cond = self.lower_expr(ast, analysis, children[0], out);
        let then_block = self.lower_body(ast, analysis, children[1]);
        let else_block = children.get(2).map(|&n| self.lower_body(ast, analysis, n));
        out.push(IrInstruction::If { cond, then_block, else_block });
    }

    fn lower_while(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex, out: &mut Vec<IrInstruction>) {
        let children = ast.get(node).children.clone();
        let mut cond_instrs = Vec::new();
        let cond = self.lower_expr(ast, analysis, children[0], &mut cond_instrs);
        let body = self.lower_body(ast, analysis, children[1]);
        out.push(IrInstruction::While { cond_block: IrCodeBlock { instructions: cond_instrs }, cond, body });
    }

    fn lower_expr(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex, out: &mut Vec<IrInstruction>) -> RegisterId {
        let ty = self.node_type(ast, node);
        match ast.get(node).kind.clone() {
            NodeKind::Literal { value } => {
                let dst = self.fresh(ty);
                out.push(match value {
                    LiteralValue::Int(v) => IrInstruction::LoadConstInt { dst, value: v },
                    LiteralValue::Float(v) => IrInstruction::LoadConstFloat { dst, value: v },
                    LiteralValue::Bool(v) => IrInstruction::LoadConstBool { dst, value: v },
                });
                dst
            }
            NodeKind::VarRef => {
                let Some(SymbolRef::Variable { definition_node }) = analysis.node_to_symbol.get(&node).copied() else {
                    unreachable!("VarRef node must resolve to a variable after successful analysis")
                };
                *self.node_register.get(&definition_node).expect("variable's defining node must have a register")
            }
            NodeKind::Call => self.lower_call(ast, analysis, node, ty, out),
            NodeKind::Binary { op } => self.lower_binary(ast, analysis, node, op, ty, out),
            NodeKind::Unary { op } => {
                let operand = ast.get(node).children[0];
                let operand_type = self.node_type(ast, operand);
                let src = self.lower_expr(ast, analysis, operand, out);
                let dst = self.fresh(ty);
                out.push(IrInstruction::Unary { dst, op, src, ty: self.primitive_of(operand_type) });
                dst
            }
            other => unreachable!("{:?} is not an expression", other),
        }
    }

    fn lower_call(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex, ty: TypeId, out: &mut Vec<IrInstruction>) -> RegisterId {
        let args: Vec<RegisterId> = ast.get(node).children.clone().into_iter().map(|a| self.lower_expr(ast, analysis, a, out)).collect();
        let callee = match analysis.node_to_symbol.get(&node).copied().expect("Call node must resolve after successful analysis") {
            SymbolRef::Function { index } => Callee::Function(IrFunctionId(index as u32)),
            SymbolRef::Hardcoded(hf) => Callee::Hardcoded(hf),
            SymbolRef::Variable { .. } => unreachable!("a Call node cannot resolve to a variable"),
        };
        let dst = if self.types.get(ty) == &TypeSignature::Void { None } else { Some(self.fresh(ty)) };
        out.push(IrInstruction::Call { dst, callee, args });
        match dst {
            Some(reg) => reg,
            None => {
                let void_ty = self.types.void;
                self.fresh(void_ty)
            }
        }
    }

    fn lower_binary(&mut self, ast: &Ast, analysis: &AnalysisOutput, node: NodeIndex, op: BinOp, result_ty: TypeId, out: &mut Vec<IrInstruction>) -> RegisterId {
        let children = ast.get(node).children.clone();
        let operand_ty = self.node_type(ast, children[0]);
        let lhs = self.lower_expr(ast, analysis, children[0], out);
        let rhs = self.lower_expr(ast, analysis, children[1], out);
        let dst = self.fresh(result_ty);
        // Comparisons and `&&`/`||` produce `bool` but dispatch on the
        // *operand* type (SPEC §4.4: "one opcode per (operation, primitive
        // type) pair"); arithmetic's operand and result type coincide.
        let dispatch_ty = match op {
            BinOp::And | BinOp::Or => OperandType::Primitive(PrimitiveType::Bool),
            BinOp::Eq | BinOp::Ne if self.is_pointer(operand_ty) => OperandType::Pointer,
            _ => OperandType::Primitive(self.primitive_of(operand_ty)),
        };
        out.push(IrInstruction::Binary { dst, op, lhs, rhs, ty: dispatch_ty });
        dst
    }
}
