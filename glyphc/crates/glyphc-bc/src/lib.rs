//! glyphc-bc — bytecode generation (SPEC §4.4).
//!
//! Lowers an [`glyphc_ir::IrProgram`] into a flat [`BytecodeProgram`]: a
//! stream of fixed-width [`Instruction`]s, a function table, and a constant
//! pool. `glyphc-vm` is the only downstream consumer.

pub mod disasm;
pub mod error;
pub mod generator;
pub mod opcode;
pub mod program;
pub mod stack_frame;

pub use disasm::disassemble;
pub use error::{GeneratorError, Result};
pub use generator::generate;
pub use opcode::Opcode;
pub use program::{BytecodeProgram, CalleeRef, Constant, ConstantPool, FunctionInfo, Instruction};
pub use stack_frame::{assign_offsets, FrameLayout};

#[cfg(test)]
mod tests;
