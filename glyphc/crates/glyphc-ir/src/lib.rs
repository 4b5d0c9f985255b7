//! glyphc-ir — three-address IR, lowered from the type-annotated AST
//! (SPEC §4.4).
//!
//! `glyphc-bc` is the only downstream consumer: it walks an [`IrProgram`]
//! to assign stack offsets and emit bytecode. IR lives only for the
//! duration of that one lowering pass (SPEC §3 "Lifecycle").

pub mod builder;
pub mod ir;

pub use builder::build_program;
pub use ir::{Callee, IrCodeBlock, IrFunction, IrFunctionId, IrInstruction, IrProgram, OperandType, RegisterId, RegisterInfo};

#[cfg(test)]
mod tests;
