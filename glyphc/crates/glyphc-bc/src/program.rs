//! The compiled artifact `glyphc-bc` produces and `glyphc-vm` executes
//! (§3 "Lifecycle": "Bytecode + constant pool + function table live for
//! execution").

use glyphc_sem::hardcoded::HardcodedFunction;
use glyphc_sem::types::TypeId;
use glyphc_util::Symbol;

use crate::opcode::Opcode;

/// A single bytecode instruction. Four operands (not three) so the two
/// cast families that need both a destination and a source primitive-type
/// tag fit alongside their register operands; unused operands default to
/// `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub op1: i32,
    pub op2: i32,
    pub op3: i32,
    pub op4: i32,
}

impl Instruction {
    pub fn new(op: Opcode) -> Self {
        Instruction { op, op1: 0, op2: 0, op3: 0, op4: 0 }
    }

    pub fn with1(op: Opcode, op1: i32) -> Self {
        Instruction { op, op1, op2: 0, op3: 0, op4: 0 }
    }

    pub fn with2(op: Opcode, op1: i32, op2: i32) -> Self {
        Instruction { op, op1, op2, op3: 0, op4: 0 }
    }

    pub fn with3(op: Opcode, op1: i32, op2: i32, op3: i32) -> Self {
        Instruction { op, op1, op2, op3, op4: 0 }
    }

    pub fn with4(op: Opcode, op1: i32, op2: i32, op3: i32, op4: i32) -> Self {
        Instruction { op, op1, op2, op3, op4 }
    }
}

/// Per-function layout info the interpreter needs: where the function's
/// code starts, how big its frame grows, and the frame offset at which its
/// parameters begin (so a caller knows where to place arguments).
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: Symbol,
    pub start_instruction: usize,
    pub max_stack_size: u32,
    pub param_types: Vec<TypeId>,
    pub return_type: TypeId,
    /// Offset from this function's own frame base where its 16-byte
    /// return-address-plus-saved-base-pointer header lives (copied straight
    /// from `FrameLayout::frame_header_offset`). `RETURN` uses it to find
    /// the header again; it is unrelated to the `frame_offset` a *caller*
    /// passes to `CALL_FUNCTION`, which is the caller's own high-water mark,
    /// not anything read from this struct.
    pub frame_header_offset: u32,
}

/// A typed constant pool entry. Loaded by `LOAD_CONST_*` instructions,
/// which carry the entry's index as an operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    I32(i32),
    F32(f32),
    U64(u64),
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `value`, reusing an existing entry if one already matches
    /// bit-for-bit.
    pub fn intern(&mut self, value: Constant) -> u32 {
        if let Some(idx) = self.entries.iter().position(|e| e == &value) {
            return idx as u32;
        }
        self.entries.push(value);
        (self.entries.len() - 1) as u32
    }

    pub fn get(&self, index: u32) -> Constant {
        self.entries[index as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A function-pointer table entry, or a reference to one of the eleven
/// hardcoded functions. `CALL_FUNCTION_POINTER` and
/// `LOAD_FUNCTION_LOCATION` index into the same function table as
/// `CALL_FUNCTION`; hardcoded calls are wired separately via
/// `CALL_HARDCODED_FUNCTION` and `HardcodedFunction::index`.
#[derive(Debug, Clone, Copy)]
pub enum CalleeRef {
    Function(u32),
    Hardcoded(HardcodedFunction),
}

/// The full compiled program: instruction stream, function table,
/// constant pool, and global-data layout. Read-only during interpretation
/// (§5 "Shared resources").
#[derive(Debug)]
pub struct BytecodeProgram {
    pub instructions: Vec<Instruction>,
    pub functions: Vec<FunctionInfo>,
    pub constants: ConstantPool,
    /// Size in bytes of the globals segment. §4.3's supplemented entry/exit
    /// mechanics (no. 5) call for lazily allocating exactly this many bytes.
    pub global_data_size: u32,
    pub main_function: u32,
}

impl BytecodeProgram {
    pub fn main_info(&self) -> &FunctionInfo {
        &self.functions[self.main_function as usize]
    }
}
