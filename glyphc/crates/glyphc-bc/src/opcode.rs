//! The bytecode instruction set (§4.4). One opcode per (operation,
//! primitive type) pair rather than a single polymorphic opcode plus a
//! type-tag operand, so the interpreter's dispatch switch is branch-free
//! per case.

use glyphc_par::ast::{BinOp, UnOp};
use glyphc_sem::types::PrimitiveType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Stack / memory data movement.
    MoveStackData,
    ReadMemory,
    WriteMemory,
    MemoryCopy,
    ReadGlobal,
    WriteGlobal,

    // Address computation.
    LoadRegisterAddress,
    LoadGlobalAddress,
    LoadFunctionLocation,
    AddConstantI32,
    MultiplyAddI32,

    // Constant loads.
    LoadConstI32,
    LoadConstF32,
    LoadConstU64,
    LoadConstBool,
    LoadNullptr,

    // Casts.
    CastIntegerDifferentSize,
    CastFloatDifferentSize,
    CastFloatInteger,
    CastIntegerFloat,

    // Control flow.
    Jump,
    JumpOnTrue,
    JumpOnFalse,
    CallFunction,
    CallFunctionPointer,
    CallHardcodedFunction,
    Return,
    Exit,
    LoadReturnValue,

    // Integer arithmetic / comparison, one variant per width+signedness.
    AddI8,
    SubI8,
    MulI8,
    DivI8,
    ModI8,
    EqI8,
    NeI8,
    GtI8,
    GeI8,
    LtI8,
    LeI8,
    AddI16,
    SubI16,
    MulI16,
    DivI16,
    ModI16,
    EqI16,
    NeI16,
    GtI16,
    GeI16,
    LtI16,
    LeI16,
    AddI32,
    SubI32,
    MulI32,
    DivI32,
    ModI32,
    EqI32,
    NeI32,
    GtI32,
    GeI32,
    LtI32,
    LeI32,
    AddI64,
    SubI64,
    MulI64,
    DivI64,
    ModI64,
    EqI64,
    NeI64,
    GtI64,
    GeI64,
    LtI64,
    LeI64,
    AddU8,
    SubU8,
    MulU8,
    DivU8,
    ModU8,
    EqU8,
    NeU8,
    GtU8,
    GeU8,
    LtU8,
    LeU8,
    AddU16,
    SubU16,
    MulU16,
    DivU16,
    ModU16,
    EqU16,
    NeU16,
    GtU16,
    GeU16,
    LtU16,
    LeU16,
    AddU32,
    SubU32,
    MulU32,
    DivU32,
    ModU32,
    EqU32,
    NeU32,
    GtU32,
    GeU32,
    LtU32,
    LeU32,
    AddU64,
    SubU64,
    MulU64,
    DivU64,
    ModU64,
    EqU64,
    NeU64,
    GtU64,
    GeU64,
    LtU64,
    LeU64,
    NegI8,
    NegI16,
    NegI32,
    NegI64,

    // Float arithmetic / comparison (no `%`).
    AddF32,
    SubF32,
    MulF32,
    DivF32,
    EqF32,
    NeF32,
    GtF32,
    GeF32,
    LtF32,
    LeF32,
    NegF32,
    AddF64,
    SubF64,
    MulF64,
    DivF64,
    EqF64,
    NeF64,
    GtF64,
    GeF64,
    LtF64,
    LeF64,
    NegF64,

    // Bool and pointer.
    EqBool,
    NeBool,
    AndBool,
    OrBool,
    NotBool,
    EqPointer,
    NePointer,
}

impl Opcode {
    /// Upper-snake mnemonic used by the disassembler (§6: `index: MNEMONIC
    /// op1=… op2=… op3=…`).
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::MoveStackData => "MOVE_STACK_DATA",
            Opcode::ReadMemory => "READ_MEMORY",
            Opcode::WriteMemory => "WRITE_MEMORY",
            Opcode::MemoryCopy => "MEMORY_COPY",
            Opcode::ReadGlobal => "READ_GLOBAL",
            Opcode::WriteGlobal => "WRITE_GLOBAL",
            Opcode::LoadRegisterAddress => "LOAD_REGISTER_ADDRESS",
            Opcode::LoadGlobalAddress => "LOAD_GLOBAL_ADDRESS",
            Opcode::LoadFunctionLocation => "LOAD_FUNCTION_LOCATION",
            Opcode::AddConstantI32 => "U64_ADD_CONSTANT_I32",
            Opcode::MultiplyAddI32 => "U64_MULTIPLY_ADD_I32",
            Opcode::LoadConstI32 => "LOAD_CONST_I32",
            Opcode::LoadConstF32 => "LOAD_CONST_F32",
            Opcode::LoadConstU64 => "LOAD_CONST_U64",
            Opcode::LoadConstBool => "LOAD_CONST_BOOL",
            Opcode::LoadNullptr => "LOAD_NULLPTR",
            Opcode::CastIntegerDifferentSize => "CAST_INTEGER_DIFFERENT_SIZE",
            Opcode::CastFloatDifferentSize => "CAST_FLOAT_DIFFERENT_SIZE",
            Opcode::CastFloatInteger => "CAST_FLOAT_INTEGER",
            Opcode::CastIntegerFloat => "CAST_INTEGER_FLOAT",
            Opcode::Jump => "JUMP",
            Opcode::JumpOnTrue => "JUMP_ON_TRUE",
            Opcode::JumpOnFalse => "JUMP_ON_FALSE",
            Opcode::CallFunction => "CALL_FUNCTION",
            Opcode::CallFunctionPointer => "CALL_FUNCTION_POINTER",
            Opcode::CallHardcodedFunction => "CALL_HARDCODED_FUNCTION",
            Opcode::Return => "RETURN",
            Opcode::Exit => "EXIT",
            Opcode::LoadReturnValue => "LOAD_RETURN_VALUE",
            Opcode::AddI8 => "ADD_I8",
            Opcode::SubI8 => "SUB_I8",
            Opcode::MulI8 => "MUL_I8",
            Opcode::DivI8 => "DIV_I8",
            Opcode::ModI8 => "MOD_I8",
            Opcode::EqI8 => "EQ_I8",
            Opcode::NeI8 => "NE_I8",
            Opcode::GtI8 => "GT_I8",
            Opcode::GeI8 => "GE_I8",
            Opcode::LtI8 => "LT_I8",
            Opcode::LeI8 => "LE_I8",
            Opcode::AddI16 => "ADD_I16",
            Opcode::SubI16 => "SUB_I16",
            Opcode::MulI16 => "MUL_I16",
            Opcode::DivI16 => "DIV_I16",
            Opcode::ModI16 => "MOD_I16",
            Opcode::EqI16 => "EQ_I16",
            Opcode::NeI16 => "NE_I16",
            Opcode::GtI16 => "GT_I16",
            Opcode::GeI16 => "GE_I16",
            Opcode::LtI16 => "LT_I16",
            Opcode::LeI16 => "LE_I16",
            Opcode::AddI32 => "ADD_I32",
            Opcode::SubI32 => "SUB_I32",
            Opcode::MulI32 => "MUL_I32",
            Opcode::DivI32 => "DIV_I32",
            Opcode::ModI32 => "MOD_I32",
            Opcode::EqI32 => "EQ_I32",
            Opcode::NeI32 => "NE_I32",
            Opcode::GtI32 => "GT_I32",
            Opcode::GeI32 => "GE_I32",
            Opcode::LtI32 => "LT_I32",
            Opcode::LeI32 => "LE_I32",
            Opcode::AddI64 => "ADD_I64",
            Opcode::SubI64 => "SUB_I64",
            Opcode::MulI64 => "MUL_I64",
            Opcode::DivI64 => "DIV_I64",
            Opcode::ModI64 => "MOD_I64",
            Opcode::EqI64 => "EQ_I64",
            Opcode::NeI64 => "NE_I64",
            Opcode::GtI64 => "GT_I64",
            Opcode::GeI64 => "GE_I64",
            Opcode::LtI64 => "LT_I64",
            Opcode::LeI64 => "LE_I64",
            Opcode::AddU8 => "ADD_U8",
            Opcode::SubU8 => "SUB_U8",
            Opcode::MulU8 => "MUL_U8",
            Opcode::DivU8 => "DIV_U8",
            Opcode::ModU8 => "MOD_U8",
            Opcode::EqU8 => "EQ_U8",
            Opcode::NeU8 => "NE_U8",
            Opcode::GtU8 => "GT_U8",
            Opcode::GeU8 => "GE_U8",
            Opcode::LtU8 => "LT_U8",
            Opcode::LeU8 => "LE_U8",
            Opcode::AddU16 => "ADD_U16",
            Opcode::SubU16 => "SUB_U16",
            Opcode::MulU16 => "MUL_U16",
            Opcode::DivU16 => "DIV_U16",
            Opcode::ModU16 => "MOD_U16",
            Opcode::EqU16 => "EQ_U16",
            Opcode::NeU16 => "NE_U16",
            Opcode::GtU16 => "GT_U16",
            Opcode::GeU16 => "GE_U16",
            Opcode::LtU16 => "LT_U16",
            Opcode::LeU16 => "LE_U16",
            Opcode::AddU32 => "ADD_U32",
            Opcode::SubU32 => "SUB_U32",
            Opcode::MulU32 => "MUL_U32",
            Opcode::DivU32 => "DIV_U32",
            Opcode::ModU32 => "MOD_U32",
            Opcode::EqU32 => "EQ_U32",
            Opcode::NeU32 => "NE_U32",
            Opcode::GtU32 => "GT_U32",
            Opcode::GeU32 => "GE_U32",
            Opcode::LtU32 => "LT_U32",
            Opcode::LeU32 => "LE_U32",
            Opcode::AddU64 => "ADD_U64",
            Opcode::SubU64 => "SUB_U64",
            Opcode::MulU64 => "MUL_U64",
            Opcode::DivU64 => "DIV_U64",
            Opcode::ModU64 => "MOD_U64",
            Opcode::EqU64 => "EQ_U64",
            Opcode::NeU64 => "NE_U64",
            Opcode::GtU64 => "GT_U64",
            Opcode::GeU64 => "GE_U64",
            Opcode::LtU64 => "LT_U64",
            Opcode::LeU64 => "LE_U64",
            Opcode::NegI8 => "NEGATE_I8",
            Opcode::NegI16 => "NEGATE_I16",
            Opcode::NegI32 => "NEGATE_I32",
            Opcode::NegI64 => "NEGATE_I64",
            Opcode::AddF32 => "ADD_F32",
            Opcode::SubF32 => "SUB_F32",
            Opcode::MulF32 => "MUL_F32",
            Opcode::DivF32 => "DIV_F32",
            Opcode::EqF32 => "EQ_F32",
            Opcode::NeF32 => "NE_F32",
            Opcode::GtF32 => "GT_F32",
            Opcode::GeF32 => "GE_F32",
            Opcode::LtF32 => "LT_F32",
            Opcode::LeF32 => "LE_F32",
            Opcode::NegF32 => "NEGATE_F32",
            Opcode::AddF64 => "ADD_F64",
            Opcode::SubF64 => "SUB_F64",
            Opcode::MulF64 => "MUL_F64",
            Opcode::DivF64 => "DIV_F64",
            Opcode::EqF64 => "EQ_F64",
            Opcode::NeF64 => "NE_F64",
            Opcode::GtF64 => "GT_F64",
            Opcode::GeF64 => "GE_F64",
            Opcode::LtF64 => "LT_F64",
            Opcode::LeF64 => "LE_F64",
            Opcode::NegF64 => "NEGATE_F64",
            Opcode::EqBool => "EQ_BOOL",
            Opcode::NeBool => "NE_BOOL",
            Opcode::AndBool => "AND_BOOL",
            Opcode::OrBool => "OR_BOOL",
            Opcode::NotBool => "NOT_BOOL",
            Opcode::EqPointer => "EQ_POINTER",
            Opcode::NePointer => "NE_POINTER",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Picks the opcode for a binary IR instruction from its operator and
/// `glyphc_ir::OperandType`. `ty` is `glyphc_ir::OperandType` but passed
/// pre-destructured here to keep this crate from depending on `glyphc-ir`'s
/// enum directly in its public signature; callers pattern-match first.
pub fn binary_opcode_for_primitive(op: BinOp, ty: PrimitiveType) -> Opcode {
    match ty {
        PrimitiveType::I8 => match op {
            BinOp::Add => Opcode::AddI8,
            BinOp::Sub => Opcode::SubI8,
            BinOp::Mul => Opcode::MulI8,
            BinOp::Div => Opcode::DivI8,
            BinOp::Mod => Opcode::ModI8,
            BinOp::Eq => Opcode::EqI8,
            BinOp::Ne => Opcode::NeI8,
            BinOp::Gt => Opcode::GtI8,
            BinOp::Ge => Opcode::GeI8,
            BinOp::Lt => Opcode::LtI8,
            BinOp::Le => Opcode::LeI8,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::I16 => match op {
            BinOp::Add => Opcode::AddI16,
            BinOp::Sub => Opcode::SubI16,
            BinOp::Mul => Opcode::MulI16,
            BinOp::Div => Opcode::DivI16,
            BinOp::Mod => Opcode::ModI16,
            BinOp::Eq => Opcode::EqI16,
            BinOp::Ne => Opcode::NeI16,
            BinOp::Gt => Opcode::GtI16,
            BinOp::Ge => Opcode::GeI16,
            BinOp::Lt => Opcode::LtI16,
            BinOp::Le => Opcode::LeI16,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::I32 => match op {
            BinOp::Add => Opcode::AddI32,
            BinOp::Sub => Opcode::SubI32,
            BinOp::Mul => Opcode::MulI32,
            BinOp::Div => Opcode::DivI32,
            BinOp::Mod => Opcode::ModI32,
            BinOp::Eq => Opcode::EqI32,
            BinOp::Ne => Opcode::NeI32,
            BinOp::Gt => Opcode::GtI32,
            BinOp::Ge => Opcode::GeI32,
            BinOp::Lt => Opcode::LtI32,
            BinOp::Le => Opcode::LeI32,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::I64 => match op {
            BinOp::Add => Opcode::AddI64,
            BinOp::Sub => Opcode::SubI64,
            BinOp::Mul => Opcode::MulI64,
            BinOp::Div => Opcode::DivI64,
            BinOp::Mod => Opcode::ModI64,
            BinOp::Eq => Opcode::EqI64,
            BinOp::Ne => Opcode::NeI64,
            BinOp::Gt => Opcode::GtI64,
            BinOp::Ge => Opcode::GeI64,
            BinOp::Lt => Opcode::LtI64,
            BinOp::Le => Opcode::LeI64,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::U8 => match op {
            BinOp::Add => Opcode::AddU8,
            BinOp::Sub => Opcode::SubU8,
            BinOp::Mul => Opcode::MulU8,
            BinOp::Div => Opcode::DivU8,
            BinOp::Mod => Opcode::ModU8,
            BinOp::Eq => Opcode::EqU8,
            BinOp::Ne => Opcode::NeU8,
            BinOp::Gt => Opcode::GtU8,
            BinOp::Ge => Opcode::GeU8,
            BinOp::Lt => Opcode::LtU8,
            BinOp::Le => Opcode::LeU8,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::U16 => match op {
            BinOp::Add => Opcode::AddU16,
            BinOp::Sub => Opcode::SubU16,
            BinOp::Mul => Opcode::MulU16,
            BinOp::Div => Opcode::DivU16,
            BinOp::Mod => Opcode::ModU16,
            BinOp::Eq => Opcode::EqU16,
            BinOp::Ne => Opcode::NeU16,
            BinOp::Gt => Opcode::GtU16,
            BinOp::Ge => Opcode::GeU16,
            BinOp::Lt => Opcode::LtU16,
            BinOp::Le => Opcode::LeU16,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::U32 => match op {
            BinOp::Add => Opcode::AddU32,
            BinOp::Sub => Opcode::SubU32,
            BinOp::Mul => Opcode::MulU32,
            BinOp::Div => Opcode::DivU32,
            BinOp::Mod => Opcode::ModU32,
            BinOp::Eq => Opcode::EqU32,
            BinOp::Ne => Opcode::NeU32,
            BinOp::Gt => Opcode::GtU32,
            BinOp::Ge => Opcode::GeU32,
            BinOp::Lt => Opcode::LtU32,
            BinOp::Le => Opcode::LeU32,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::U64 => match op {
            BinOp::Add => Opcode::AddU64,
            BinOp::Sub => Opcode::SubU64,
            BinOp::Mul => Opcode::MulU64,
            BinOp::Div => Opcode::DivU64,
            BinOp::Mod => Opcode::ModU64,
            BinOp::Eq => Opcode::EqU64,
            BinOp::Ne => Opcode::NeU64,
            BinOp::Gt => Opcode::GtU64,
            BinOp::Ge => Opcode::GeU64,
            BinOp::Lt => Opcode::LtU64,
            BinOp::Le => Opcode::LeU64,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::F32 => match op {
            BinOp::Add => Opcode::AddF32,
            BinOp::Sub => Opcode::SubF32,
            BinOp::Mul => Opcode::MulF32,
            BinOp::Div => Opcode::DivF32,
            BinOp::Mod => unreachable!("% is integer-only"),
            BinOp::Eq => Opcode::EqF32,
            BinOp::Ne => Opcode::NeF32,
            BinOp::Gt => Opcode::GtF32,
            BinOp::Ge => Opcode::GeF32,
            BinOp::Lt => Opcode::LtF32,
            BinOp::Le => Opcode::LeF32,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::F64 => match op {
            BinOp::Add => Opcode::AddF64,
            BinOp::Sub => Opcode::SubF64,
            BinOp::Mul => Opcode::MulF64,
            BinOp::Div => Opcode::DivF64,
            BinOp::Mod => unreachable!("% is integer-only"),
            BinOp::Eq => Opcode::EqF64,
            BinOp::Ne => Opcode::NeF64,
            BinOp::Gt => Opcode::GtF64,
            BinOp::Ge => Opcode::GeF64,
            BinOp::Lt => Opcode::LtF64,
            BinOp::Le => Opcode::LeF64,
            BinOp::And | BinOp::Or => unreachable!("&&/|| only ever dispatch on Bool"),
        },
        PrimitiveType::Bool => match op {
            BinOp::Eq => Opcode::EqBool,
            BinOp::Ne => Opcode::NeBool,
            BinOp::And => Opcode::AndBool,
            BinOp::Or => Opcode::OrBool,
            _ => unreachable!("bool only supports ==, !=, &&, ||"),
        },
    }
}

/// `==`/`!=` between two pointer operands don't go through
/// [`binary_opcode_for_primitive`] since `Pointer` isn't a `PrimitiveType`.
pub fn binary_opcode_for_pointer(op: BinOp) -> Opcode {
    match op {
        BinOp::Eq => Opcode::EqPointer,
        BinOp::Ne => Opcode::NePointer,
        other => unreachable!("pointers only support ==/!=, got {:?}", other),
    }
}

pub fn unary_opcode(op: UnOp, ty: PrimitiveType) -> Opcode {
    match op {
        UnOp::Neg => match ty {
            PrimitiveType::I8 => Opcode::NegI8,
            PrimitiveType::I16 => Opcode::NegI16,
            PrimitiveType::I32 => Opcode::NegI32,
            PrimitiveType::I64 => Opcode::NegI64,
            PrimitiveType::F32 => Opcode::NegF32,
            PrimitiveType::F64 => Opcode::NegF64,
            other => unreachable!("{:?} has no negation opcode", other),
        },
        UnOp::Not => match ty {
            PrimitiveType::Bool => Opcode::NotBool,
            other => unreachable!("{:?} has no logical-not opcode", other),
        },
    }
}

/// Stable small-integer encoding of a [`PrimitiveType`], used as the
/// source/destination tag operands of the four `CAST_*` opcodes (§4.4
/// lists these as "parameterized by source and destination primitive
/// tags").
pub fn primitive_type_tag(ty: PrimitiveType) -> i32 {
    match ty {
        PrimitiveType::I8 => 0,
        PrimitiveType::I16 => 1,
        PrimitiveType::I32 => 2,
        PrimitiveType::I64 => 3,
        PrimitiveType::U8 => 4,
        PrimitiveType::U16 => 5,
        PrimitiveType::U32 => 6,
        PrimitiveType::U64 => 7,
        PrimitiveType::F32 => 8,
        PrimitiveType::F64 => 9,
        PrimitiveType::Bool => 10,
    }
}

pub fn primitive_type_from_tag(tag: i32) -> PrimitiveType {
    match tag {
        0 => PrimitiveType::I8,
        1 => PrimitiveType::I16,
        2 => PrimitiveType::I32,
        3 => PrimitiveType::I64,
        4 => PrimitiveType::U8,
        5 => PrimitiveType::U16,
        6 => PrimitiveType::U32,
        7 => PrimitiveType::U64,
        8 => PrimitiveType::F32,
        9 => PrimitiveType::F64,
        10 => PrimitiveType::Bool,
        other => unreachable!("{other} is not a valid primitive type tag"),
    }
}

/// Which `CAST_*` opcode a `{from -> to}` numeric conversion needs.
pub fn cast_opcode(from: PrimitiveType, to: PrimitiveType) -> Opcode {
    match (from.is_float(), to.is_float()) {
        (false, false) => Opcode::CastIntegerDifferentSize,
        (true, true) => Opcode::CastFloatDifferentSize,
        (true, false) => Opcode::CastFloatInteger,
        (false, true) => Opcode::CastIntegerFloat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_integer_type_has_a_mod_opcode_but_no_float_type_does() {
        assert_eq!(binary_opcode_for_primitive(BinOp::Mod, PrimitiveType::I32), Opcode::ModI32);
        assert_eq!(binary_opcode_for_primitive(BinOp::Mod, PrimitiveType::U64), Opcode::ModU64);
    }

    #[test]
    fn mnemonics_are_unique() {
        use std::collections::HashSet;
        let all = [
            Opcode::AddI8, Opcode::EqPointer, Opcode::NotBool, Opcode::CallFunction, Opcode::Exit, Opcode::LoadNullptr,
        ];
        let set: HashSet<&str> = all.iter().map(|o| o.mnemonic()).collect();
        assert_eq!(set.len(), all.len());
    }

    #[test]
    fn primitive_type_tag_round_trips() {
        for ty in [
            PrimitiveType::I8, PrimitiveType::I16, PrimitiveType::I32, PrimitiveType::I64,
            PrimitiveType::U8, PrimitiveType::U16, PrimitiveType::U32, PrimitiveType::U64,
            PrimitiveType::F32, PrimitiveType::F64, PrimitiveType::Bool,
        ] {
            assert_eq!(primitive_type_from_tag(primitive_type_tag(ty)), ty);
        }
    }

    #[test]
    fn cast_opcode_picks_the_right_family() {
        assert_eq!(cast_opcode(PrimitiveType::I32, PrimitiveType::I8), Opcode::CastIntegerDifferentSize);
        assert_eq!(cast_opcode(PrimitiveType::F32, PrimitiveType::F64), Opcode::CastFloatDifferentSize);
        assert_eq!(cast_opcode(PrimitiveType::F32, PrimitiveType::I32), Opcode::CastFloatInteger);
        assert_eq!(cast_opcode(PrimitiveType::I32, PrimitiveType::F32), Opcode::CastIntegerFloat);
    }
}
