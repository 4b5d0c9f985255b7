//! Two-pass semantic analysis (SPEC §4.3).
//!
//! Pass 1 registers every callable name — the eleven hardcoded functions
//! plus every top-level function's signature — into the global scope before
//! any body is examined, so forward references between functions resolve.
//! Pass 2 walks each function body with a fresh nested scope, resolving
//! identifiers, type-checking every statement and expression, and
//! annotating the AST's `type_id` field as it goes.

use glyphc_par::ast::{Ast, BinOp, LiteralValue, NodeIndex, NodeKind, UnOp};
use glyphc_util::{FxHashMap, Span, Symbol};

use crate::hardcoded::HardcodedFunction;
use crate::scope::{ScopeId, ScopeTree, SymbolEntry, SymbolKind};
use crate::types::{PrimitiveType, TypeId, TypeInterner, TypeSignature};

#[derive(Debug, Clone)]
pub struct SemaError {
    pub message: String,
    pub span: Span,
}

/// What a resolved `VarRef`/`Assignment`/`Call` node refers to.
#[derive(Debug, Clone, Copy)]
pub enum SymbolRef {
    Variable { definition_node: NodeIndex },
    Function { index: usize },
    Hardcoded(HardcodedFunction),
}

/// A top-level function's signature, recorded during pass 1 and consulted
/// by every caller (forward or backward) and by the IR generator.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: Symbol,
    pub params: Vec<(Symbol, TypeId)>,
    pub ret: TypeId,
    pub signature_type: TypeId,
    pub def_node: NodeIndex,
    pub body: NodeIndex,
}

pub struct AnalysisOutput {
    pub types: TypeInterner,
    pub scopes: ScopeTree,
    pub functions: Vec<FunctionInfo>,
    pub main_index: Option<usize>,
    pub node_to_symbol: FxHashMap<NodeIndex, SymbolRef>,
    pub node_to_scope: FxHashMap<NodeIndex, ScopeId>,
    pub errors: Vec<SemaError>,
}

pub fn analyze(ast: &mut Ast, root: NodeIndex) -> AnalysisOutput {
    let mut analyzer = Analyzer::new();
    analyzer.register_hardcoded_functions();
    analyzer.register_functions(ast, root);
    for index in 0..analyzer.functions.len() {
        analyzer.analyze_function(ast, index);
    }
    analyzer.into_output()
}

struct Analyzer {
    types: TypeInterner,
    scopes: ScopeTree,
    functions: Vec<FunctionInfo>,
    function_names: FxHashMap<Symbol, usize>,
    main_index: Option<usize>,
    node_to_symbol: FxHashMap<NodeIndex, SymbolRef>,
    node_to_scope: FxHashMap<NodeIndex, ScopeId>,
    errors: Vec<SemaError>,
    loop_depth: u32,
    current_return_type: TypeId,
}

impl Analyzer {
    fn new() -> Self {
        Self {
            types: TypeInterner::new(),
            scopes: ScopeTree::new(),
            functions: Vec::new(),
            function_names: FxHashMap::default(),
            main_index: None,
            node_to_symbol: FxHashMap::default(),
            node_to_scope: FxHashMap::default(),
            errors: Vec::new(),
            loop_depth: 0,
            current_return_type: TypeId(0),
        }
    }

    fn into_output(self) -> AnalysisOutput {
        AnalysisOutput {
            types: self.types,
            scopes: self.scopes,
            functions: self.functions,
            main_index: self.main_index,
            node_to_symbol: self.node_to_symbol,
            node_to_scope: self.node_to_scope,
            errors: self.errors,
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(SemaError { message: message.into(), span });
    }

    fn global_scope(&self) -> ScopeId {
        self.scopes.global()
    }

    // --- pass 1: signature registration ---------------------------------

    fn register_hardcoded_functions(&mut self) {
        let global = self.global_scope();
        for hf in HardcodedFunction::ALL {
            let (params, ret) = hf.signature(&mut self.types);
            let signature_type = self.types.intern_function(params, ret);
            let entry = SymbolEntry {
                kind: SymbolKind::HardcodedFunction,
                name_id: hf.name_symbol(),
                type_id: signature_type,
                definition_node: NodeIndex::NONE,
            };
            self.scopes.declare_in(global, entry);
        }
    }

    fn register_functions(&mut self, ast: &Ast, root: NodeIndex) {
        let program = ast.get(root);
        for &func_node in &program.children {
            let node = ast.get(func_node);
            let NodeKind::Function { ret_type_name } = node.kind else { continue };
            let name = node.name_id.expect("Function node always carries a name");
            let span = node.span;

            let ret = self.resolve_type_name(ret_type_name, span);
            let mut params = Vec::new();
            let mut body = NodeIndex::NONE;
            for &child in &node.children {
                let child_node = ast.get(child);
                match &child_node.kind {
                    NodeKind::Param { type_name } => {
                        let param_name = child_node.name_id.expect("Param node always carries a name");
                        let param_type = self.resolve_type_name(*type_name, child_node.span);
                        params.push((param_name, param_type, child));
                    }
                    NodeKind::Block => body = child,
                    _ => {}
                }
            }

            if name.is_hardcoded_function() {
                self.error(format!("function `{}` shadows a hardcoded function name", name), span);
                continue;
            }

            let param_types: Vec<TypeId> = params.iter().map(|(_, t, _)| *t).collect();
            let signature_type = self.types.intern_function(param_types, ret);

            if self.function_names.contains_key(&name) {
                self.error(format!("function `{}` is defined more than once", name), span);
                continue;
            }

            let global = self.global_scope();
            let entry = SymbolEntry {
                kind: SymbolKind::Function,
                name_id: name,
                type_id: signature_type,
                definition_node: func_node,
            };
            if !self.scopes.declare_in(global, entry) {
                self.error(format!("function `{}` is defined more than once", name), span);
                continue;
            }

            let index = self.functions.len();
            self.function_names.insert(name, index);
            if name == Symbol::ID_MAIN {
                self.main_index = Some(index);
            }

            self.functions.push(FunctionInfo { name, params, ret, signature_type, def_node: func_node, body });
        }
    }

    fn resolve_type_name(&mut self, name: Symbol, span: Span) -> TypeId {
        match PrimitiveType::from_symbol(name) {
            Some(prim) => self.types.primitive(prim),
            None => {
                self.error(format!("unknown type `{}`", name), span);
                self.types.error
            }
        }
    }

    // --- pass 2: body type-checking --------------------------------------

    fn analyze_function(&mut self, ast: &mut Ast, index: usize) {
        let info = self.functions[index].clone();
        self.current_return_type = info.ret;
        self.loop_depth = 0;

        let scope = self.scopes.enter();
        for &(name, type_id) in &info.params {
            let entry = SymbolEntry { kind: SymbolKind::Variable, name_id: name, type_id, definition_node: info.def_node };
            if !self.scopes.declare(entry) {
                self.error(format!("parameter `{}` is declared more than once", name), ast.get(info.def_node).span);
            }
        }
        if !info.body.is_none() {
            self.node_to_scope.insert(info.body, scope);
            let body_children: Vec<NodeIndex> = ast.get(info.body).children.clone();
            for stmt in body_children {
                self.analyze_statement(ast, stmt);
            }
        }
        self.scopes.exit();
    }

    fn analyze_statement(&mut self, ast: &mut Ast, node: NodeIndex) {
        let span = ast.get(node).span;
        match ast.get(node).kind.clone() {
            NodeKind::Block => {
                let scope = self.scopes.enter();
                self.node_to_scope.insert(node, scope);
                let children = ast.get(node).children.clone();
                for child in children {
                    self.analyze_statement(ast, child);
                }
                self.scopes.exit();
            }
            NodeKind::VarDef { declared_type_name } => self.analyze_var_def(ast, node, declared_type_name, span),
            NodeKind::Assignment => self.analyze_assignment(ast, node),
            NodeKind::If => self.analyze_if(ast, node),
            NodeKind::While => self.analyze_while(ast, node),
            NodeKind::Break => {
                if self.loop_depth == 0 {
                    self.error("`break` used outside of a loop", span);
                }
            }
            NodeKind::Continue => {
                if self.loop_depth == 0 {
                    self.error("`continue` used outside of a loop", span);
                }
            }
            NodeKind::Return => {
                let children = ast.get(node).children.clone();
                let actual = match children.first() {
                    Some(&expr) => self.analyze_expr(ast, expr),
                    None => self.types.void,
                };
                if actual != self.types.error && actual != self.current_return_type {
                    self.error("returned value does not match the function's declared return type", span);
                }
            }
            NodeKind::ExprStmt => {
                let children = ast.get(node).children.clone();
                if let Some(&expr) = children.first() {
                    self.analyze_expr(ast, expr);
                }
            }
            other => unreachable!("{:?} is not a statement", other),
        }
    }

    fn analyze_var_def(&mut self, ast: &mut Ast, node: NodeIndex, declared_type_name: Option<Symbol>, span: Span) {
        let name = ast.get(node).name_id.expect("VarDef node always carries a name");
        let init = ast.get(node).children.first().copied();

        let var_type = match (declared_type_name, init) {
            (Some(type_name), Some(init_node)) => {
                let declared = self.resolve_type_name(type_name, span);
                let init_type = self.analyze_expr(ast, init_node);
                if declared != self.types.error && init_type != self.types.error && declared != init_type {
                    let both_numeric = self.is_numeric(declared) && self.is_numeric(init_type);
                    if !both_numeric {
                        self.error("initializer type does not match the declared type", span);
                    }
                }
                declared
            }
            (Some(type_name), None) => self.resolve_type_name(type_name, span),
            (None, Some(init_node)) => self.analyze_expr(ast, init_node),
            (None, None) => {
                self.error("variable declaration requires either a type or an initializer", span);
                self.types.error
            }
        };

        let entry = SymbolEntry { kind: SymbolKind::Variable, name_id: name, type_id: var_type, definition_node: node };
        if !self.scopes.declare(entry) {
            self.error(format!("`{}` is already declared in this scope", name), span);
        }
        ast.set_type(node, var_type);
    }

    fn analyze_assignment(&mut self, ast: &mut Ast, node: NodeIndex) {
        let name = ast.get(node).name_id.expect("Assignment node always carries a name");
        let span = ast.get(node).span;
        let rhs = ast.get(node).children[0];
        let rhs_type = self.analyze_expr(ast, rhs);

        let var_type = match self.scopes.resolve(name) {
            Some((entry, _)) if entry.kind == SymbolKind::Variable => {
                self.node_to_symbol.insert(node, SymbolRef::Variable { definition_node: entry.definition_node });
                if rhs_type != self.types.error && entry.type_id != self.types.error && entry.type_id != rhs_type {
                    self.error(format!("cannot assign this value to `{}`: types do not match", name), span);
                }
                entry.type_id
            }
            Some(_) => {
                self.error(format!("`{}` is not a variable", name), span);
                self.types.error
            }
            None => {
                self.error(format!("undefined identifier `{}`", name), span);
                self.types.error
            }
        };
        ast.set_type(node, var_type);
    }

    fn analyze_if(&mut self, ast: &mut Ast, node: NodeIndex) {
        let children = ast.get(node).children.clone();
        let cond = children[0];
        let cond_type = self.analyze_expr(ast, cond);
        if cond_type != self.types.error && cond_type != self.types.bool_ {
            self.error("`if` condition must be `bool`", ast.get(cond).span);
        }
        self.analyze_statement(ast, children[1]);
        if let Some(&else_branch) = children.get(2) {
            self.analyze_statement(ast, else_branch);
        }
    }

    fn analyze_while(&mut self, ast: &mut Ast, node: NodeIndex) {
        let children = ast.get(node).children.clone();
        let cond = children[0];
        let cond_type = self.analyze_expr(ast, cond);
        if cond_type != self.types.error && cond_type != self.types.bool_ {
            self.error("`while` condition must be `bool`", ast.get(cond).span);
        }
        self.loop_depth += 1;
        self.analyze_statement(ast, children[1]);
        self.loop_depth -= 1;
    }

    fn analyze_expr(&mut self, ast: &mut Ast, node: NodeIndex) -> TypeId {
        let span = ast.get(node).span;
        let result = match ast.get(node).kind.clone() {
            NodeKind::Literal { value } => match value {
                LiteralValue::Int(_) => self.types.i32,
                LiteralValue::Float(_) => self.types.f32,
                LiteralValue::Bool(_) => self.types.bool_,
            },
            NodeKind::VarRef => {
                let name = ast.get(node).name_id.expect("VarRef node always carries a name");
                self.analyze_var_ref(node, name, span)
            }
            NodeKind::Call => self.analyze_call(ast, node, span),
            NodeKind::Binary { op } => self.analyze_binary(ast, node, op, span),
            NodeKind::Unary { op } => self.analyze_unary(ast, node, op, span),
            other => unreachable!("{:?} is not an expression", other),
        };
        ast.set_type(node, result);
        result
    }

    fn analyze_var_ref(&mut self, node: NodeIndex, name: Symbol, span: Span) -> TypeId {
        match self.scopes.resolve(name) {
            Some((entry, _)) if entry.kind == SymbolKind::Variable => {
                self.node_to_symbol.insert(node, SymbolRef::Variable { definition_node: entry.definition_node });
                entry.type_id
            }
            Some(_) => {
                self.error(format!("`{}` is a function, not a variable", name), span);
                self.types.error
            }
            None => {
                self.error(format!("undefined identifier `{}`", name), span);
                self.types.error
            }
        }
    }

    fn is_numeric(&self, type_id: TypeId) -> bool {
        matches!(self.types.get(type_id), TypeSignature::Primitive(p) if p.is_numeric())
    }

    fn is_integer(&self, type_id: TypeId) -> bool {
        matches!(self.types.get(type_id), TypeSignature::Primitive(p) if p.is_integer())
    }

    fn is_primitive(&self, type_id: TypeId) -> bool {
        matches!(self.types.get(type_id), TypeSignature::Primitive(_))
    }

    fn is_pointer(&self, type_id: TypeId) -> bool {
        matches!(self.types.get(type_id), TypeSignature::Pointer { .. })
    }

    fn analyze_call(&mut self, ast: &mut Ast, node: NodeIndex, span: Span) -> TypeId {
        let name = ast.get(node).name_id.expect("Call node always carries a name");
        let args = ast.get(node).children.clone();
        let arg_types: Vec<TypeId> = args.iter().map(|&a| self.analyze_expr(ast, a)).collect();

        let (symbol_ref, params, ret): (SymbolRef, Vec<TypeId>, TypeId) =
            if let Some(hf) = HardcodedFunction::from_symbol(name) {
                let (params, ret) = hf.signature(&mut self.types);
                (SymbolRef::Hardcoded(hf), params, ret)
            } else if let Some(&index) = self.function_names.get(&name) {
                let info = &self.functions[index];
                (SymbolRef::Function { index }, info.params.iter().map(|(_, t)| *t).collect(), info.ret)
            } else {
                self.error(format!("call to undefined function `{}`", name), span);
                return self.types.error;
            };

        self.node_to_symbol.insert(node, symbol_ref);

        if params.len() != arg_types.len() {
            self.error(format!("`{}` expects {} argument(s), found {}", name, params.len(), arg_types.len()), span);
            return ret;
        }
        for (i, (&expected, &actual)) in params.iter().zip(arg_types.iter()).enumerate() {
            if actual != self.types.error && expected != self.types.error && expected != actual {
                self.error(format!("argument {} to `{}` has the wrong type", i + 1, name), span);
            }
        }
        ret
    }

    fn analyze_binary(&mut self, ast: &mut Ast, node: NodeIndex, op: BinOp, span: Span) -> TypeId {
        let children = ast.get(node).children.clone();
        let lhs_type = self.analyze_expr(ast, children[0]);
        let rhs_type = self.analyze_expr(ast, children[1]);
        if lhs_type == self.types.error || rhs_type == self.types.error {
            return self.types.error;
        }

        match op {
            BinOp::And | BinOp::Or => {
                if lhs_type != self.types.bool_ || rhs_type != self.types.bool_ {
                    self.error("`&&`/`||` require `bool` operands", span);
                }
                self.types.bool_
            }
            BinOp::Eq | BinOp::Ne => {
                let compatible = lhs_type == rhs_type && (self.is_primitive(lhs_type) || self.is_pointer(lhs_type));
                if !compatible {
                    self.error("`==`/`!=` require identical primitive or pointer operands", span);
                }
                self.types.bool_
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if lhs_type != rhs_type || !self.is_primitive(lhs_type) {
                    self.error("comparison requires identical primitive operands", span);
                }
                self.types.bool_
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                if lhs_type != rhs_type || !self.is_primitive(lhs_type) {
                    self.error("arithmetic requires identical primitive operands", span);
                    return self.types.error;
                }
                lhs_type
            }
            BinOp::Mod => {
                if lhs_type != rhs_type || !self.is_integer(lhs_type) {
                    self.error("`%` requires identical integer operands", span);
                    return self.types.error;
                }
                lhs_type
            }
        }
    }

    fn analyze_unary(&mut self, ast: &mut Ast, node: NodeIndex, op: UnOp, span: Span) -> TypeId {
        let operand = ast.get(node).children[0];
        let operand_type = self.analyze_expr(ast, operand);
        if operand_type == self.types.error {
            return self.types.error;
        }
        match op {
            UnOp::Neg => {
                let ok = matches!(
                    self.types.get(operand_type),
                    TypeSignature::Primitive(p) if p.is_signed_integer() || p.is_float()
                );
                if !ok {
                    self.error("unary `-` requires a signed integer or float operand", span);
                    return self.types.error;
                }
                operand_type
            }
            UnOp::Not => {
                if operand_type != self.types.bool_ {
                    self.error("unary `!` requires a `bool` operand", span);
                    return self.types.error;
                }
                self.types.bool_
            }
        }
    }
}
