//! Lowers an [`IrProgram`] into a [`BytecodeProgram`] (§4.4).
//!
//! Emission is two-pass only where it has to be: `CALL_FUNCTION` targets
//! are unknown until every function has been emitted (so they're recorded
//! as placeholders and patched once emission finishes), while `if`/`while`
//! jump targets are resolved immediately since the structured block shape
//! already tells us where a block starts and ends as we walk it.

use glyphc_ir::{Callee, IrCodeBlock, IrFunction, IrFunctionId, IrInstruction, IrProgram, OperandType, RegisterId};
use glyphc_sem::hardcoded::HardcodedFunction;
use glyphc_sem::types::{PrimitiveType, TypeInterner, TypeSignature};

use crate::error::{GeneratorError, Result};
use crate::opcode::{binary_opcode_for_pointer, binary_opcode_for_primitive, cast_opcode, primitive_type_tag, unary_opcode, Opcode};
use crate::program::{BytecodeProgram, ConstantPool, Constant, FunctionInfo};
use crate::stack_frame::{assign_offsets, FrameLayout};
use crate::Instruction;

pub fn generate(program: &IrProgram, types: &TypeInterner) -> Result<BytecodeProgram> {
    let main = program.main.ok_or(GeneratorError::MissingMain)?;

    let mut gen = Generator { types, instructions: Vec::new(), constants: ConstantPool::new(), function_starts: vec![usize::MAX; program.functions.len()], call_patches: Vec::new() };

    let mut functions = Vec::with_capacity(program.functions.len());
    for (id, func) in program.functions.iter_enumerated() {
        let start = gen.instructions.len();
        gen.function_starts[id.index()] = start;
        let layout = assign_offsets(func, types);
        gen.emit_function_body(func, id == main, &layout);
        functions.push(FunctionInfo {
            name: func.name,
            start_instruction: start,
            max_stack_size: layout.max_stack_size,
            param_types: func.params.iter().map(|&r| func.registers[r].type_id).collect(),
            return_type: func.return_type,
            frame_header_offset: layout.frame_header_offset,
        });
    }

    for (instr_index, target) in gen.call_patches {
        gen.instructions[instr_index].op1 = gen.function_starts[target.index()] as i32;
    }

    Ok(BytecodeProgram { instructions: gen.instructions, functions, constants: gen.constants, global_data_size: 0, main_function: main.index() as u32 })
}

struct Generator<'a> {
    types: &'a TypeInterner,
    instructions: Vec<Instruction>,
    constants: ConstantPool,
    function_starts: Vec<usize>,
    /// `(instruction index whose op1 is a placeholder, target function)`,
    /// patched once every function's start address is known.
    call_patches: Vec<(usize, IrFunctionId)>,
}

/// Per-loop fill-out state for `break` (§4.4: "break and continue inside a
/// while are collected into per-loop fill-out lists and resolved at loop
/// end"). `continue`'s target — the condition block's start — is already
/// known the moment `continue` is lowered, so only `break` needs deferral.
struct LoopContext {
    cond_start: usize,
    break_patches: Vec<usize>,
}

impl<'a> Generator<'a> {
    fn emit(&mut self, instr: Instruction) -> usize {
        self.instructions.push(instr);
        self.instructions.len() - 1
    }

    fn primitive_size(&self, ty: glyphc_sem::types::TypeId) -> u32 {
        self.types.size_in_bytes(ty)
    }

    fn primitive_of(&self, ty: glyphc_sem::types::TypeId) -> PrimitiveType {
        match self.types.get(ty) {
            TypeSignature::Primitive(p) => *p,
            other => unreachable!("expected a primitive type signature, found {:?}", other),
        }
    }

    fn emit_function_body(&mut self, func: &IrFunction, is_main: bool, layout: &FrameLayout) {
        let mut loops: Vec<LoopContext> = Vec::new();
        self.emit_block(func, &func.body, is_main, layout, &mut loops);
        // A well-typed function's every path returns, but that isn't
        // checked here; a trailing guard instruction prevents execution
        // falling through into whatever function is emitted next if a
        // path somehow doesn't.
        self.emit(if is_main { Instruction::with2(Opcode::Exit, 0, 0) } else { Instruction::with2(Opcode::Return, 0, 0) });
    }

    fn emit_block(&mut self, func: &IrFunction, block: &IrCodeBlock, is_main: bool, layout: &FrameLayout, loops: &mut Vec<LoopContext>) {
        for instr in &block.instructions {
            self.emit_instruction(func, instr, is_main, layout, loops);
        }
    }

    fn offset(&self, layout: &FrameLayout, reg: RegisterId) -> i32 {
        layout.offset_of(reg) as i32
    }

    fn size_of_reg(&self, func: &IrFunction, reg: RegisterId) -> u32 {
        self.primitive_size(func.registers[reg].type_id)
    }

    fn emit_instruction(&mut self, func: &IrFunction, instr: &IrInstruction, is_main: bool, layout: &FrameLayout, loops: &mut Vec<LoopContext>) {
        match instr {
            IrInstruction::Move { dst, src } => {
                let size = self.size_of_reg(func, *dst);
                self.emit(Instruction::with3(Opcode::MoveStackData, self.offset(layout, *dst), self.offset(layout, *src), size as i32));
            }
            IrInstruction::LoadConstInt { dst, value } => {
                let idx = self.constants.intern(Constant::I32(*value as i32));
                self.emit(Instruction::with2(Opcode::LoadConstI32, self.offset(layout, *dst), idx as i32));
            }
            IrInstruction::LoadConstFloat { dst, value } => {
                let idx = self.constants.intern(Constant::F32(*value as f32));
                self.emit(Instruction::with2(Opcode::LoadConstF32, self.offset(layout, *dst), idx as i32));
            }
            IrInstruction::LoadConstBool { dst, value } => {
                self.emit(Instruction::with2(Opcode::LoadConstBool, self.offset(layout, *dst), *value as i32));
            }
            IrInstruction::Unary { dst, op, src, ty } => {
                let opcode = unary_opcode(*op, *ty);
                self.emit(Instruction::with2(opcode, self.offset(layout, *dst), self.offset(layout, *src)));
            }
            IrInstruction::Binary { dst, op, lhs, rhs, ty } => {
                let opcode = match ty {
                    OperandType::Primitive(p) => binary_opcode_for_primitive(*op, *p),
                    OperandType::Pointer => binary_opcode_for_pointer(*op),
                };
                self.emit(Instruction::with3(opcode, self.offset(layout, *dst), self.offset(layout, *lhs), self.offset(layout, *rhs)));
            }
            IrInstruction::Cast { dst, src, to, from } => {
                let opcode = cast_opcode(*from, *to);
                self.emit(Instruction::with4(opcode, self.offset(layout, *dst), self.offset(layout, *src), primitive_type_tag(*to), primitive_type_tag(*from)));
            }
            IrInstruction::Call { dst, callee, args } => self.emit_call(func, *dst, callee, args, layout),
            IrInstruction::Return { value } => self.emit_return(func, *value, is_main, layout),
            IrInstruction::If { cond, then_block, else_block } => self.emit_if(func, *cond, then_block, else_block.as_ref(), is_main, layout, loops),
            IrInstruction::While { cond_block, cond, body } => self.emit_while(func, cond_block, *cond, body, is_main, layout, loops),
            IrInstruction::Break => {
                let idx = self.emit(Instruction::with1(Opcode::Jump, i32::MIN));
                loops.last_mut().expect("break only ever lowered inside a while body").break_patches.push(idx);
            }
            IrInstruction::Continue => {
                let target = loops.last().expect("continue only ever lowered inside a while body").cond_start;
                self.emit(Instruction::with1(Opcode::Jump, target as i32));
            }
        }
    }

    fn emit_call(&mut self, func: &IrFunction, dst: Option<RegisterId>, callee: &Callee, args: &[RegisterId], layout: &FrameLayout) {
        let arg_type_ids: Vec<_> = args.iter().map(|&r| func.registers[r].type_id).collect();

        // The new frame (or, for a hardcoded call, the scratch area the
        // arguments are staged in) starts right past every local/temporary
        // this function itself ever uses, 8-aligned so the strictest
        // primitive (a pointer or 8-byte integer) lands properly aligned
        // regardless of what this function's own high-water mark was.
        let frame_offset = crate::stack_frame::align_up(layout.max_stack_size, 8);

        // Written relative to the CALLEE's frame base (= this frame's base +
        // frame_offset), matching `assign_offsets`' positive-offset layout:
        // the callee's own parameter registers sit at the same offsets
        // `0..frame_offset` within its frame that this fold just computed.
        let mut arg_cursor = 0u32;
        for (&arg_reg, &type_id) in args.iter().zip(arg_type_ids.iter()) {
            let align = self.types.alignment_in_bytes(type_id);
            let size = self.types.size_in_bytes(type_id);
            arg_cursor = crate::stack_frame::align_up(arg_cursor, align);
            self.emit(Instruction::with3(Opcode::MoveStackData, (frame_offset + arg_cursor) as i32, self.offset(layout, arg_reg), size as i32));
            arg_cursor += size;
        }

        match callee {
            Callee::Function(target) => {
                let idx = self.emit(Instruction::with2(Opcode::CallFunction, i32::MIN, frame_offset as i32));
                self.call_patches.push((idx, *target));
            }
            Callee::Hardcoded(hf) => {
                self.emit(Instruction::with2(Opcode::CallHardcodedFunction, hf.index() as i32, frame_offset as i32));
            }
        }

        if let Some(dst) = dst {
            let size = self.size_of_reg(func, dst);
            self.emit(Instruction::with2(Opcode::LoadReturnValue, self.offset(layout, dst), size as i32));
        }
    }

    fn emit_return(&mut self, func: &IrFunction, value: Option<RegisterId>, is_main: bool, layout: &FrameLayout) {
        let Some(value) = value else {
            // A void return still needs to unwind the frame; size 0 copies
            // nothing into the return register / exit read.
            self.emit(if is_main { Instruction::with2(Opcode::Exit, 0, 0) } else { Instruction::with2(Opcode::Return, 0, 0) });
            return;
        };
        let size = self.size_of_reg(func, value);
        let src = self.offset(layout, value);
        self.emit(if is_main { Instruction::with2(Opcode::Exit, src, size as i32) } else { Instruction::with2(Opcode::Return, src, size as i32) });
    }

    fn emit_if(&mut self, func: &IrFunction, cond: RegisterId, then_block: &IrCodeBlock, else_block: Option<&IrCodeBlock>, is_main: bool, layout: &FrameLayout, loops: &mut Vec<LoopContext>) {
        let branch_idx = self.emit(Instruction::with2(Opcode::JumpOnFalse, self.offset(layout, cond), i32::MIN));
        self.emit_block(func, then_block, is_main, layout, loops);
        match else_block {
            None => {
                let after = self.instructions.len() as i32;
                self.instructions[branch_idx].op2 = after;
            }
            Some(else_block) => {
                let skip_else_idx = self.emit(Instruction::with1(Opcode::Jump, i32::MIN));
                let else_start = self.instructions.len() as i32;
                self.instructions[branch_idx].op2 = else_start;
                self.emit_block(func, else_block, is_main, layout, loops);
                let after = self.instructions.len() as i32;
                self.instructions[skip_else_idx].op1 = after;
            }
        }
    }

    fn emit_while(&mut self, func: &IrFunction, cond_block: &IrCodeBlock, cond: RegisterId, body: &IrCodeBlock, is_main: bool, layout: &FrameLayout, loops: &mut Vec<LoopContext>) {
        let cond_start = self.instructions.len();
        self.emit_block(func, cond_block, is_main, layout, loops);
        let branch_idx = self.emit(Instruction::with2(Opcode::JumpOnFalse, self.offset(layout, cond), i32::MIN));

        loops.push(LoopContext { cond_start, break_patches: Vec::new() });
        self.emit_block(func, body, is_main, layout, loops);
        self.emit(Instruction::with1(Opcode::Jump, cond_start as i32));

        let after = self.instructions.len() as i32;
        self.instructions[branch_idx].op2 = after;
        let finished = loops.pop().expect("pushed immediately above");
        for idx in finished.break_patches {
            self.instructions[idx].op1 = after;
        }
    }
}

pub(crate) fn hardcoded_name(hf: HardcodedFunction) -> &'static str {
    match hf {
        HardcodedFunction::Malloc => "malloc",
        HardcodedFunction::Free => "free",
        HardcodedFunction::PrintI32 => "print_i32",
        HardcodedFunction::PrintF32 => "print_f32",
        HardcodedFunction::PrintBool => "print_bool",
        HardcodedFunction::PrintString => "print_string",
        HardcodedFunction::PrintLine => "print_line",
        HardcodedFunction::ReadI32 => "read_i32",
        HardcodedFunction::ReadF32 => "read_f32",
        HardcodedFunction::ReadBool => "read_bool",
        HardcodedFunction::RandomI32 => "random_i32",
    }
}
