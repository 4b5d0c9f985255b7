//! glyphc-vm — the stack-based bytecode interpreter (SPEC §4.5).
//!
//! Executes a [`glyphc_bc::BytecodeProgram`] over a pre-allocated byte
//! stack: a flat opcode dispatch loop, a lazily-sized globals segment, a
//! 256-byte return register, and the eleven hardcoded functions. This is
//! the last stage of the pipeline — nothing downstream consumes its
//! output besides the process exit code and whatever the hardcoded
//! `print_*` functions wrote to stdout.

pub mod error;
pub mod hardcoded;
pub mod interpreter;
pub mod memory;

pub use error::{HaltReason, RunOutcome, EXIT_CODE_OUT_OF_BOUNDS, EXIT_CODE_RETURN_VALUE_OVERFLOW, EXIT_CODE_STACK_OVERFLOW};
pub use interpreter::{run, run_with_options, Options};
pub use memory::Heap;
