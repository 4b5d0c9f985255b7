//! The eleven hardcoded functions pre-registered in the global scope
//! (SPEC §4.3). These are the only callable names not defined by the
//! program itself; the bytecode generator wires calls to them into
//! `CALL_HARDCODED_FUNCTION` instead of `CALL_FUNCTION`.

use glyphc_util::Symbol;

use crate::types::TypeInterner;
use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardcodedFunction {
    Malloc,
    Free,
    PrintI32,
    PrintF32,
    PrintBool,
    PrintString,
    PrintLine,
    ReadI32,
    ReadF32,
    ReadBool,
    RandomI32,
}

impl HardcodedFunction {
    pub const ALL: [HardcodedFunction; 11] = [
        HardcodedFunction::Malloc,
        HardcodedFunction::Free,
        HardcodedFunction::PrintI32,
        HardcodedFunction::PrintF32,
        HardcodedFunction::PrintBool,
        HardcodedFunction::PrintString,
        HardcodedFunction::PrintLine,
        HardcodedFunction::ReadI32,
        HardcodedFunction::ReadF32,
        HardcodedFunction::ReadBool,
        HardcodedFunction::RandomI32,
    ];

    pub fn name_symbol(self) -> Symbol {
        match self {
            HardcodedFunction::Malloc => Symbol::FN_MALLOC,
            HardcodedFunction::Free => Symbol::FN_FREE,
            HardcodedFunction::PrintI32 => Symbol::FN_PRINT_I32,
            HardcodedFunction::PrintF32 => Symbol::FN_PRINT_F32,
            HardcodedFunction::PrintBool => Symbol::FN_PRINT_BOOL,
            HardcodedFunction::PrintString => Symbol::FN_PRINT_STRING,
            HardcodedFunction::PrintLine => Symbol::FN_PRINT_LINE,
            HardcodedFunction::ReadI32 => Symbol::FN_READ_I32,
            HardcodedFunction::ReadF32 => Symbol::FN_READ_F32,
            HardcodedFunction::ReadBool => Symbol::FN_READ_BOOL,
            HardcodedFunction::RandomI32 => Symbol::FN_RANDOM_I32,
        }
    }

    pub fn from_symbol(sym: Symbol) -> Option<HardcodedFunction> {
        Self::ALL.into_iter().find(|hf| hf.name_symbol() == sym)
    }

    /// Index into the fixed table the backend wires `CALL_HARDCODED_FUNCTION`
    /// against.
    pub fn index(self) -> u32 {
        Self::ALL.iter().position(|&hf| hf == self).expect("HardcodedFunction::ALL is exhaustive") as u32
    }

    /// `(parameter types, return type)`.
    pub fn signature(self, types: &mut TypeInterner) -> (Vec<TypeId>, TypeId) {
        match self {
            HardcodedFunction::Malloc => (vec![types.i32], types.intern_pointer(types.u8)),
            HardcodedFunction::Free => (vec![types.intern_pointer(types.u8)], types.void),
            HardcodedFunction::PrintI32 => (vec![types.i32], types.void),
            HardcodedFunction::PrintF32 => (vec![types.f32], types.void),
            HardcodedFunction::PrintBool => (vec![types.bool_], types.void),
            HardcodedFunction::PrintString => (vec![types.intern_array_unsized(types.u8)], types.void),
            HardcodedFunction::PrintLine => (vec![], types.void),
            HardcodedFunction::ReadI32 => (vec![], types.i32),
            HardcodedFunction::ReadF32 => (vec![], types.f32),
            HardcodedFunction::ReadBool => (vec![], types.bool_),
            HardcodedFunction::RandomI32 => (vec![], types.i32),
        }
    }
}
