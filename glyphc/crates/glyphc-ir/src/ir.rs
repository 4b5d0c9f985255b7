//! Three-address IR (SPEC §3, §4.4 "IR + Bytecode Generator").
//!
//! `IrProgram` owns `IrFunction`s; each owns an ordered parameter list, a
//! register table (local/temporary slots with type signatures, SPEC §9's
//! "Register-like operands" note — an `IrRegister` only knows its type
//! here, the stack offset is assigned later by `glyphc-bc`), and one
//! top-level `IrCodeBlock`. Control flow stays structured (`If`/`While`
//! carry nested blocks) rather than a flat basic-block graph, so
//! break/continue resolve against the innermost enclosing loop without a
//! separate CFG pass.

use glyphc_par::ast::{BinOp, UnOp};
use glyphc_sem::hardcoded::HardcodedFunction;
use glyphc_sem::types::{PrimitiveType, TypeId};
use glyphc_util::{Idx, IndexVec, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterId(pub u32);

impl Idx for RegisterId {
    fn from_usize(idx: usize) -> Self {
        RegisterId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IrFunctionId(pub u32);

impl Idx for IrFunctionId {
    fn from_usize(idx: usize) -> Self {
        IrFunctionId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A local slot's type. The stack offset it eventually occupies is a
/// `glyphc-bc` concern, not an IR one.
#[derive(Debug, Clone)]
pub struct RegisterInfo {
    pub type_id: TypeId,
    /// `Some` for named source variables and parameters; `None` for
    /// compiler-introduced temporaries holding a subexpression's value.
    pub name: Option<Symbol>,
}

#[derive(Debug, Clone, Copy)]
pub enum Callee {
    Function(IrFunctionId),
    Hardcoded(HardcodedFunction),
}

/// What a `Binary` instruction's `ty` dispatches on. Almost always a
/// primitive, but `==`/`!=` also accept two identical pointer operands
/// (SPEC §4.3), and pointers aren't a `PrimitiveType` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    Primitive(PrimitiveType),
    Pointer,
}

#[derive(Debug, Clone)]
pub enum IrInstruction {
    /// Copy one register's bytes into another (variable declarations,
    /// assignments, and parameter binding all reduce to this).
    Move { dst: RegisterId, src: RegisterId },
    LoadConstInt { dst: RegisterId, value: i64 },
    LoadConstFloat { dst: RegisterId, value: f64 },
    LoadConstBool { dst: RegisterId, value: bool },
    Unary { dst: RegisterId, op: UnOp, src: RegisterId, ty: PrimitiveType },
    Binary { dst: RegisterId, op: BinOp, lhs: RegisterId, rhs: RegisterId, ty: OperandType },
    /// Explicit numeric conversion the analyzer's typing rules require at a
    /// declared-typed initialization (SPEC §4.3: "the IR generator later
    /// inserts [casts] at declared-typed initializations, and only between
    /// primitive-numeric types").
    Cast { dst: RegisterId, src: RegisterId, to: PrimitiveType, from: PrimitiveType },
    Call { dst: Option<RegisterId>, callee: Callee, args: Vec<RegisterId> },
    Return { value: Option<RegisterId> },
    If { cond: RegisterId, then_block: IrCodeBlock, else_block: Option<IrCodeBlock> },
    /// `cond_block` computes `cond` and is re-emitted at the top of every
    /// iteration (including after a `continue`), matching this language's
    /// eager re-evaluation of the loop condition.
    While { cond_block: IrCodeBlock, cond: RegisterId, body: IrCodeBlock },
    Break,
    Continue,
}

#[derive(Debug, Clone, Default)]
pub struct IrCodeBlock {
    pub instructions: Vec<IrInstruction>,
}

#[derive(Debug)]
pub struct IrFunction {
    pub name: Symbol,
    pub params: Vec<RegisterId>,
    pub return_type: TypeId,
    pub registers: IndexVec<RegisterId, RegisterInfo>,
    pub body: IrCodeBlock,
}

#[derive(Debug, Default)]
pub struct IrProgram {
    pub functions: IndexVec<IrFunctionId, IrFunction>,
    pub main: Option<IrFunctionId>,
}
