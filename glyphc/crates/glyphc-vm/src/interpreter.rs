//! The dispatch loop (§4.5 "Dispatch"): a flat switch over [`Opcode`],
//! each case a raw aligned load/store at `stack[stack_pointer + opN]`.

use glyphc_bc::opcode::{primitive_type_from_tag, Opcode as Op};
use glyphc_bc::{BytecodeProgram, Constant, FunctionInfo, Instruction};
use glyphc_sem::hardcoded::HardcodedFunction;
use glyphc_sem::types::PrimitiveType;

use crate::error::{HaltReason, RunOutcome, EXIT_CODE_OUT_OF_BOUNDS, EXIT_CODE_RETURN_VALUE_OVERFLOW, EXIT_CODE_STACK_OVERFLOW};
use crate::memory::{Heap, DEFAULT_STACK_SIZE, MAX_FUNCTION_STACK_DEPTH, RETURN_REGISTER_SIZE};

/// Knobs that don't change the language's semantics, only this particular
/// run's resource sizing and debug verbosity.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub stack_size: usize,
    /// Supplemented Feature 4: emit a `tracing::trace!` event after every
    /// instruction with the instruction pointer, stack pointer, and the
    /// top bytes of the stack. `glyphc-drv --dump-state` turns this on by
    /// raising its own filter to `trace` for this crate's target; this
    /// flag just decides whether the event is worth the (still
    /// `tracing`-gated) formatting cost at all.
    pub dump_state: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { stack_size: DEFAULT_STACK_SIZE, dump_state: false }
    }
}

/// Runs `program` to completion with default resource sizing.
pub fn run(program: &BytecodeProgram) -> RunOutcome {
    run_with_options(program, Options::default())
}

/// Runs `program` to completion with caller-chosen stack size / debug
/// verbosity.
pub fn run_with_options(program: &BytecodeProgram, options: Options) -> RunOutcome {
    Interpreter::new(program, options).execute()
}

/// What one `step` call did to control flow. Most opcodes fall through to
/// `Continue` (the caller advances `ip` by one); jumps and calls report
/// their new `ip` directly since it isn't simply `ip + 1`; a fault or
/// `EXIT` reports the run is over.
enum Step {
    Continue,
    Jump(usize),
    Halt(RunOutcome),
}

struct Interpreter<'a> {
    program: &'a BytecodeProgram,
    stack: Box<[u8]>,
    /// Byte offset into `stack` — an index, not a raw pointer, since every
    /// address this interpreter hands to a compiled program that might
    /// later dereference it (`LOAD_REGISTER_ADDRESS`) needs to survive
    /// `stack` never moving, which a `Box<[u8]>` guarantees for its
    /// lifetime.
    sp: usize,
    ip: usize,
    globals: Box<[u8]>,
    return_register: [u8; RETURN_REGISTER_SIZE],
    heap: Heap,
    dump_state: bool,
}

impl<'a> Interpreter<'a> {
    fn new(program: &'a BytecodeProgram, options: Options) -> Self {
        let stack = vec![0u8; options.stack_size.max(MAX_FUNCTION_STACK_DEPTH)].into_boxed_slice();
        let globals = vec![0u8; program.global_data_size as usize].into_boxed_slice();
        Interpreter {
            program,
            stack,
            sp: 0,
            ip: program.main_info().start_instruction,
            globals,
            return_register: [0u8; RETURN_REGISTER_SIZE],
            heap: Heap::new(),
            dump_state: options.dump_state,
        }
    }

    fn execute(mut self) -> RunOutcome {
        loop {
            let instr = self.program.instructions[self.ip];
            let outcome = self.step(instr);
            if self.dump_state {
                tracing::trace!(
                    instruction_pointer = self.ip,
                    stack_pointer = self.sp,
                    opcode = %instr.op,
                    top = ?self.top_of_stack(),
                    "vm step"
                );
            }
            match outcome {
                Step::Continue => self.ip += 1,
                Step::Jump(target) => self.ip = target,
                Step::Halt(outcome) => return outcome,
            }
        }
    }

    fn top_of_stack(&self) -> &[u8] {
        let end = (self.sp + 8).min(self.stack.len());
        &self.stack[self.sp..end]
    }

    fn fault(&self, reason: HaltReason) -> RunOutcome {
        let exit_code = match reason {
            HaltReason::OutOfBounds => EXIT_CODE_OUT_OF_BOUNDS,
            HaltReason::StackOverflow => EXIT_CODE_STACK_OVERFLOW,
            HaltReason::ReturnValueOverflow => EXIT_CODE_RETURN_VALUE_OVERFLOW,
            HaltReason::Exited => unreachable!("EXIT builds its own RunOutcome directly"),
        };
        RunOutcome { exit_code, halt_reason: reason }
    }

    /// The function whose body contains instruction `ip` (its
    /// `start_instruction <= ip < next function's start_instruction`).
    /// Functions are pushed in ascending `start_instruction` order by
    /// `glyphc-bc`'s generator, so a partition point finds it in log time.
    fn function_containing(&self, ip: usize) -> &FunctionInfo {
        let idx = self.program.functions.partition_point(|f| f.start_instruction <= ip);
        &self.program.functions[idx - 1]
    }

    fn function_starting_at(&self, ip: usize) -> &FunctionInfo {
        let idx = self.program.functions.binary_search_by_key(&ip, |f| f.start_instruction).expect("CALL_FUNCTION target is always a function's start_instruction");
        &self.program.functions[idx]
    }

    fn addr(&self, offset: i32) -> usize {
        (self.sp as i64 + offset as i64) as usize
    }

    fn bytes<const N: usize>(&self, offset: i32) -> [u8; N] {
        let start = self.addr(offset);
        self.stack[start..start + N].try_into().expect("slice length matches N")
    }

    fn set_bytes(&mut self, offset: i32, value: &[u8]) {
        let start = self.addr(offset);
        self.stack[start..start + value.len()].copy_from_slice(value);
    }

    fn read_i8(&self, offset: i32) -> i8 {
        i8::from_le_bytes(self.bytes(offset))
    }
    fn read_u8(&self, offset: i32) -> u8 {
        u8::from_le_bytes(self.bytes(offset))
    }
    fn read_i16(&self, offset: i32) -> i16 {
        i16::from_le_bytes(self.bytes(offset))
    }
    fn read_u16(&self, offset: i32) -> u16 {
        u16::from_le_bytes(self.bytes(offset))
    }
    fn read_i32(&self, offset: i32) -> i32 {
        i32::from_le_bytes(self.bytes(offset))
    }
    fn read_u32(&self, offset: i32) -> u32 {
        u32::from_le_bytes(self.bytes(offset))
    }
    fn read_i64(&self, offset: i32) -> i64 {
        i64::from_le_bytes(self.bytes(offset))
    }
    fn read_u64(&self, offset: i32) -> u64 {
        u64::from_le_bytes(self.bytes(offset))
    }
    fn read_f32(&self, offset: i32) -> f32 {
        f32::from_le_bytes(self.bytes(offset))
    }
    fn read_f64(&self, offset: i32) -> f64 {
        f64::from_le_bytes(self.bytes(offset))
    }
    fn read_bool(&self, offset: i32) -> bool {
        self.stack[self.addr(offset)] != 0
    }

    fn write_i8(&mut self, offset: i32, v: i8) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_u8(&mut self, offset: i32, v: u8) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_i16(&mut self, offset: i32, v: i16) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_u16(&mut self, offset: i32, v: u16) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_i32(&mut self, offset: i32, v: i32) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_u32(&mut self, offset: i32, v: u32) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_i64(&mut self, offset: i32, v: i64) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_u64(&mut self, offset: i32, v: u64) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_f32(&mut self, offset: i32, v: f32) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_f64(&mut self, offset: i32, v: f64) {
        self.set_bytes(offset, &v.to_le_bytes())
    }
    fn write_bool(&mut self, offset: i32, v: bool) {
        self.stack[self.addr(offset)] = v as u8;
    }

    fn step(&mut self, instr: Instruction) -> Step {
        let (op1, op2, op3, op4) = (instr.op1, instr.op2, instr.op3, instr.op4);
        match instr.op {
            Op::MoveStackData => {
                self.stack.copy_within(self.addr(op2)..self.addr(op2) + op3 as usize, self.addr(op1));
                Step::Continue
            }
            Op::ReadGlobal => {
                let start = op2 as usize;
                let len = op3 as usize;
                let bytes = self.globals[start..start + len].to_vec();
                self.set_bytes(op1, &bytes);
                Step::Continue
            }
            Op::WriteGlobal => {
                let len = op3 as usize;
                let start = self.addr(op2);
                let bytes = self.stack[start..start + len].to_vec();
                self.globals[op1 as usize..op1 as usize + len].copy_from_slice(&bytes);
                Step::Continue
            }
            Op::WriteMemory => {
                let address = self.read_u64(op1);
                let len = op3 as usize;
                let start = self.addr(op2);
                let bytes = &self.stack[start..start + len];
                // SAFETY: `address` was produced by a prior
                // `LOAD_REGISTER_ADDRESS`/`LOAD_GLOBAL_ADDRESS`/`malloc`
                // within this same program, per this crate's raw-memory
                // contract (see `memory::write_raw`).
                unsafe { crate::memory::write_raw(address, bytes) };
                Step::Continue
            }
            Op::ReadMemory => {
                let address = self.read_u64(op2);
                let len = op3 as usize;
                let mut buf = vec![0u8; len];
                // SAFETY: see `WriteMemory` above.
                unsafe { crate::memory::read_raw(address, &mut buf) };
                self.set_bytes(op1, &buf);
                Step::Continue
            }
            Op::MemoryCopy => {
                let dst = self.read_u64(op1);
                let src = self.read_u64(op2);
                // SAFETY: see `WriteMemory` above; `glyphc-bc` never emits
                // a `MEMORY_COPY` whose source and destination alias.
                unsafe { crate::memory::copy_raw(dst, src, op3 as usize) };
                Step::Continue
            }
            Op::LoadRegisterAddress => {
                // SAFETY: pointer arithmetic only, never dereferenced here.
                let address = unsafe { self.stack.as_mut_ptr().add(self.addr(op2)) } as u64;
                self.write_u64(op1, address);
                Step::Continue
            }
            Op::LoadGlobalAddress => {
                // SAFETY: pointer arithmetic only, never dereferenced here.
                let address = unsafe { self.globals.as_mut_ptr().add(op2 as usize) } as u64;
                self.write_u64(op1, address);
                Step::Continue
            }
            Op::LoadFunctionLocation => {
                // Unreachable via this language's grammar (no first-class
                // function values), kept for switch exhaustiveness and
                // parity with `CALL_FUNCTION_POINTER` below.
                let target = &self.program.functions[op2 as usize];
                self.write_u64(op1, target.start_instruction as u64);
                Step::Continue
            }
            Op::AddConstantI32 => {
                let base = self.read_u64(op2);
                self.write_u64(op1, base.wrapping_add(op3 as i64 as u64));
                Step::Continue
            }
            Op::MultiplyAddI32 => {
                let index = self.read_u32(op3) as u64;
                let offset = index.wrapping_mul(op4 as u64);
                if (offset as i32) < 0 {
                    return Step::Halt(self.fault(HaltReason::OutOfBounds));
                }
                let base = self.read_u64(op2);
                self.write_u64(op1, base.wrapping_add(offset));
                Step::Continue
            }
            Op::LoadConstI32 => {
                let Constant::I32(v) = self.program.constants.get(op2 as u32) else { unreachable!("LOAD_CONST_I32 always indexes an I32 constant") };
                self.write_i32(op1, v);
                Step::Continue
            }
            Op::LoadConstF32 => {
                let Constant::F32(v) = self.program.constants.get(op2 as u32) else { unreachable!("LOAD_CONST_F32 always indexes an F32 constant") };
                self.write_f32(op1, v);
                Step::Continue
            }
            Op::LoadConstU64 => {
                let Constant::U64(v) = self.program.constants.get(op2 as u32) else { unreachable!("LOAD_CONST_U64 always indexes a U64 constant") };
                self.write_u64(op1, v);
                Step::Continue
            }
            Op::LoadConstBool => {
                self.write_bool(op1, op2 != 0);
                Step::Continue
            }
            Op::LoadNullptr => {
                self.write_u64(op1, 0);
                Step::Continue
            }
            Op::CastIntegerDifferentSize => {
                self.cast_integer_different_size(op1, op2, primitive_type_from_tag(op3), primitive_type_from_tag(op4));
                Step::Continue
            }
            Op::CastFloatDifferentSize => {
                self.cast_float_different_size(op1, op2, primitive_type_from_tag(op3), primitive_type_from_tag(op4));
                Step::Continue
            }
            Op::CastFloatInteger => {
                self.cast_float_integer(op1, op2, primitive_type_from_tag(op3), primitive_type_from_tag(op4));
                Step::Continue
            }
            Op::CastIntegerFloat => {
                self.cast_integer_float(op1, op2, primitive_type_from_tag(op3), primitive_type_from_tag(op4));
                Step::Continue
            }
            Op::Jump => Step::Jump(op1 as usize),
            Op::JumpOnTrue => {
                // Unreachable: `glyphc-bc` only ever emits `JUMP_ON_FALSE`
                // for both `if` and `while`. Kept for switch exhaustiveness.
                if self.read_bool(op1) {
                    Step::Jump(op2 as usize)
                } else {
                    Step::Continue
                }
            }
            Op::JumpOnFalse => {
                if !self.read_bool(op1) {
                    Step::Jump(op2 as usize)
                } else {
                    Step::Continue
                }
            }
            Op::CallFunction => self.call_function(op1 as usize, op2 as usize),
            Op::CallFunctionPointer => {
                // Unreachable via this language's grammar; see
                // `LOAD_FUNCTION_LOCATION` above.
                let target = self.read_u64(op1) as usize;
                self.call_function(target, op2 as usize)
            }
            Op::CallHardcodedFunction => {
                let hf = HardcodedFunction::ALL[op1 as usize];
                self.call_hardcoded(hf, op2);
                Step::Continue
            }
            Op::Return => self.do_return(op1, op2 as usize),
            Op::Exit => self.do_exit(op1, op2 as usize),
            Op::LoadReturnValue => {
                let size = op2 as usize;
                let mut buf = [0u8; RETURN_REGISTER_SIZE];
                buf[..size].copy_from_slice(&self.return_register[..size]);
                self.set_bytes(op1, &buf[..size]);
                Step::Continue
            }

            Op::AddI8 => { self.write_i8(op1, self.read_i8(op2).wrapping_add(self.read_i8(op3))); Step::Continue }
            Op::SubI8 => { self.write_i8(op1, self.read_i8(op2).wrapping_sub(self.read_i8(op3))); Step::Continue }
            Op::MulI8 => { self.write_i8(op1, self.read_i8(op2).wrapping_mul(self.read_i8(op3))); Step::Continue }
            Op::DivI8 => { self.write_i8(op1, self.read_i8(op2).wrapping_div(self.read_i8(op3))); Step::Continue }
            Op::ModI8 => { self.write_i8(op1, self.read_i8(op2).wrapping_rem(self.read_i8(op3))); Step::Continue }
            Op::EqI8 => { self.write_bool(op1, self.read_i8(op2) == self.read_i8(op3)); Step::Continue }
            Op::NeI8 => { self.write_bool(op1, self.read_i8(op2) != self.read_i8(op3)); Step::Continue }
            Op::GtI8 => { self.write_bool(op1, self.read_i8(op2) > self.read_i8(op3)); Step::Continue }
            Op::GeI8 => { self.write_bool(op1, self.read_i8(op2) >= self.read_i8(op3)); Step::Continue }
            Op::LtI8 => { self.write_bool(op1, self.read_i8(op2) < self.read_i8(op3)); Step::Continue }
            Op::LeI8 => { self.write_bool(op1, self.read_i8(op2) <= self.read_i8(op3)); Step::Continue }

            Op::AddI16 => { self.write_i16(op1, self.read_i16(op2).wrapping_add(self.read_i16(op3))); Step::Continue }
            Op::SubI16 => { self.write_i16(op1, self.read_i16(op2).wrapping_sub(self.read_i16(op3))); Step::Continue }
            Op::MulI16 => { self.write_i16(op1, self.read_i16(op2).wrapping_mul(self.read_i16(op3))); Step::Continue }
            Op::DivI16 => { self.write_i16(op1, self.read_i16(op2).wrapping_div(self.read_i16(op3))); Step::Continue }
            Op::ModI16 => { self.write_i16(op1, self.read_i16(op2).wrapping_rem(self.read_i16(op3))); Step::Continue }
            Op::EqI16 => { self.write_bool(op1, self.read_i16(op2) == self.read_i16(op3)); Step::Continue }
            Op::NeI16 => { self.write_bool(op1, self.read_i16(op2) != self.read_i16(op3)); Step::Continue }
            Op::GtI16 => { self.write_bool(op1, self.read_i16(op2) > self.read_i16(op3)); Step::Continue }
            Op::GeI16 => { self.write_bool(op1, self.read_i16(op2) >= self.read_i16(op3)); Step::Continue }
            Op::LtI16 => { self.write_bool(op1, self.read_i16(op2) < self.read_i16(op3)); Step::Continue }
            Op::LeI16 => { self.write_bool(op1, self.read_i16(op2) <= self.read_i16(op3)); Step::Continue }

            Op::AddI32 => { self.write_i32(op1, self.read_i32(op2).wrapping_add(self.read_i32(op3))); Step::Continue }
            Op::SubI32 => { self.write_i32(op1, self.read_i32(op2).wrapping_sub(self.read_i32(op3))); Step::Continue }
            Op::MulI32 => { self.write_i32(op1, self.read_i32(op2).wrapping_mul(self.read_i32(op3))); Step::Continue }
            Op::DivI32 => { self.write_i32(op1, self.read_i32(op2).wrapping_div(self.read_i32(op3))); Step::Continue }
            Op::ModI32 => { self.write_i32(op1, self.read_i32(op2).wrapping_rem(self.read_i32(op3))); Step::Continue }
            Op::EqI32 => { self.write_bool(op1, self.read_i32(op2) == self.read_i32(op3)); Step::Continue }
            Op::NeI32 => { self.write_bool(op1, self.read_i32(op2) != self.read_i32(op3)); Step::Continue }
            Op::GtI32 => { self.write_bool(op1, self.read_i32(op2) > self.read_i32(op3)); Step::Continue }
            Op::GeI32 => { self.write_bool(op1, self.read_i32(op2) >= self.read_i32(op3)); Step::Continue }
            Op::LtI32 => { self.write_bool(op1, self.read_i32(op2) < self.read_i32(op3)); Step::Continue }
            Op::LeI32 => { self.write_bool(op1, self.read_i32(op2) <= self.read_i32(op3)); Step::Continue }

            Op::AddI64 => { self.write_i64(op1, self.read_i64(op2).wrapping_add(self.read_i64(op3))); Step::Continue }
            Op::SubI64 => { self.write_i64(op1, self.read_i64(op2).wrapping_sub(self.read_i64(op3))); Step::Continue }
            Op::MulI64 => { self.write_i64(op1, self.read_i64(op2).wrapping_mul(self.read_i64(op3))); Step::Continue }
            Op::DivI64 => { self.write_i64(op1, self.read_i64(op2).wrapping_div(self.read_i64(op3))); Step::Continue }
            Op::ModI64 => { self.write_i64(op1, self.read_i64(op2).wrapping_rem(self.read_i64(op3))); Step::Continue }
            Op::EqI64 => { self.write_bool(op1, self.read_i64(op2) == self.read_i64(op3)); Step::Continue }
            Op::NeI64 => { self.write_bool(op1, self.read_i64(op2) != self.read_i64(op3)); Step::Continue }
            Op::GtI64 => { self.write_bool(op1, self.read_i64(op2) > self.read_i64(op3)); Step::Continue }
            Op::GeI64 => { self.write_bool(op1, self.read_i64(op2) >= self.read_i64(op3)); Step::Continue }
            Op::LtI64 => { self.write_bool(op1, self.read_i64(op2) < self.read_i64(op3)); Step::Continue }
            Op::LeI64 => { self.write_bool(op1, self.read_i64(op2) <= self.read_i64(op3)); Step::Continue }

            Op::AddU8 => { self.write_u8(op1, self.read_u8(op2).wrapping_add(self.read_u8(op3))); Step::Continue }
            Op::SubU8 => { self.write_u8(op1, self.read_u8(op2).wrapping_sub(self.read_u8(op3))); Step::Continue }
            Op::MulU8 => { self.write_u8(op1, self.read_u8(op2).wrapping_mul(self.read_u8(op3))); Step::Continue }
            Op::DivU8 => { self.write_u8(op1, self.read_u8(op2).wrapping_div(self.read_u8(op3))); Step::Continue }
            Op::ModU8 => { self.write_u8(op1, self.read_u8(op2).wrapping_rem(self.read_u8(op3))); Step::Continue }
            Op::EqU8 => { self.write_bool(op1, self.read_u8(op2) == self.read_u8(op3)); Step::Continue }
            Op::NeU8 => { self.write_bool(op1, self.read_u8(op2) != self.read_u8(op3)); Step::Continue }
            Op::GtU8 => { self.write_bool(op1, self.read_u8(op2) > self.read_u8(op3)); Step::Continue }
            Op::GeU8 => { self.write_bool(op1, self.read_u8(op2) >= self.read_u8(op3)); Step::Continue }
            Op::LtU8 => { self.write_bool(op1, self.read_u8(op2) < self.read_u8(op3)); Step::Continue }
            Op::LeU8 => { self.write_bool(op1, self.read_u8(op2) <= self.read_u8(op3)); Step::Continue }

            Op::AddU16 => { self.write_u16(op1, self.read_u16(op2).wrapping_add(self.read_u16(op3))); Step::Continue }
            Op::SubU16 => { self.write_u16(op1, self.read_u16(op2).wrapping_sub(self.read_u16(op3))); Step::Continue }
            Op::MulU16 => { self.write_u16(op1, self.read_u16(op2).wrapping_mul(self.read_u16(op3))); Step::Continue }
            Op::DivU16 => { self.write_u16(op1, self.read_u16(op2).wrapping_div(self.read_u16(op3))); Step::Continue }
            Op::ModU16 => { self.write_u16(op1, self.read_u16(op2).wrapping_rem(self.read_u16(op3))); Step::Continue }
            Op::EqU16 => { self.write_bool(op1, self.read_u16(op2) == self.read_u16(op3)); Step::Continue }
            Op::NeU16 => { self.write_bool(op1, self.read_u16(op2) != self.read_u16(op3)); Step::Continue }
            Op::GtU16 => { self.write_bool(op1, self.read_u16(op2) > self.read_u16(op3)); Step::Continue }
            Op::GeU16 => { self.write_bool(op1, self.read_u16(op2) >= self.read_u16(op3)); Step::Continue }
            Op::LtU16 => { self.write_bool(op1, self.read_u16(op2) < self.read_u16(op3)); Step::Continue }
            Op::LeU16 => { self.write_bool(op1, self.read_u16(op2) <= self.read_u16(op3)); Step::Continue }

            Op::AddU32 => { self.write_u32(op1, self.read_u32(op2).wrapping_add(self.read_u32(op3))); Step::Continue }
            Op::SubU32 => { self.write_u32(op1, self.read_u32(op2).wrapping_sub(self.read_u32(op3))); Step::Continue }
            Op::MulU32 => { self.write_u32(op1, self.read_u32(op2).wrapping_mul(self.read_u32(op3))); Step::Continue }
            Op::DivU32 => { self.write_u32(op1, self.read_u32(op2).wrapping_div(self.read_u32(op3))); Step::Continue }
            Op::ModU32 => { self.write_u32(op1, self.read_u32(op2).wrapping_rem(self.read_u32(op3))); Step::Continue }
            Op::EqU32 => { self.write_bool(op1, self.read_u32(op2) == self.read_u32(op3)); Step::Continue }
            Op::NeU32 => { self.write_bool(op1, self.read_u32(op2) != self.read_u32(op3)); Step::Continue }
            Op::GtU32 => { self.write_bool(op1, self.read_u32(op2) > self.read_u32(op3)); Step::Continue }
            Op::GeU32 => { self.write_bool(op1, self.read_u32(op2) >= self.read_u32(op3)); Step::Continue }
            Op::LtU32 => { self.write_bool(op1, self.read_u32(op2) < self.read_u32(op3)); Step::Continue }
            Op::LeU32 => { self.write_bool(op1, self.read_u32(op2) <= self.read_u32(op3)); Step::Continue }

            Op::AddU64 => { self.write_u64(op1, self.read_u64(op2).wrapping_add(self.read_u64(op3))); Step::Continue }
            Op::SubU64 => { self.write_u64(op1, self.read_u64(op2).wrapping_sub(self.read_u64(op3))); Step::Continue }
            Op::MulU64 => { self.write_u64(op1, self.read_u64(op2).wrapping_mul(self.read_u64(op3))); Step::Continue }
            Op::DivU64 => { self.write_u64(op1, self.read_u64(op2).wrapping_div(self.read_u64(op3))); Step::Continue }
            Op::ModU64 => { self.write_u64(op1, self.read_u64(op2).wrapping_rem(self.read_u64(op3))); Step::Continue }
            Op::EqU64 => { self.write_bool(op1, self.read_u64(op2) == self.read_u64(op3)); Step::Continue }
            Op::NeU64 => { self.write_bool(op1, self.read_u64(op2) != self.read_u64(op3)); Step::Continue }
            Op::GtU64 => { self.write_bool(op1, self.read_u64(op2) > self.read_u64(op3)); Step::Continue }
            Op::GeU64 => { self.write_bool(op1, self.read_u64(op2) >= self.read_u64(op3)); Step::Continue }
            Op::LtU64 => { self.write_bool(op1, self.read_u64(op2) < self.read_u64(op3)); Step::Continue }
            Op::LeU64 => { self.write_bool(op1, self.read_u64(op2) <= self.read_u64(op3)); Step::Continue }

            Op::NegI8 => { self.write_i8(op1, self.read_i8(op2).wrapping_neg()); Step::Continue }
            Op::NegI16 => { self.write_i16(op1, self.read_i16(op2).wrapping_neg()); Step::Continue }
            Op::NegI32 => { self.write_i32(op1, self.read_i32(op2).wrapping_neg()); Step::Continue }
            Op::NegI64 => { self.write_i64(op1, self.read_i64(op2).wrapping_neg()); Step::Continue }

            Op::AddF32 => { self.write_f32(op1, self.read_f32(op2) + self.read_f32(op3)); Step::Continue }
            Op::SubF32 => { self.write_f32(op1, self.read_f32(op2) - self.read_f32(op3)); Step::Continue }
            Op::MulF32 => { self.write_f32(op1, self.read_f32(op2) * self.read_f32(op3)); Step::Continue }
            Op::DivF32 => { self.write_f32(op1, self.read_f32(op2) / self.read_f32(op3)); Step::Continue }
            Op::EqF32 => { self.write_bool(op1, self.read_f32(op2) == self.read_f32(op3)); Step::Continue }
            Op::NeF32 => { self.write_bool(op1, self.read_f32(op2) != self.read_f32(op3)); Step::Continue }
            Op::GtF32 => { self.write_bool(op1, self.read_f32(op2) > self.read_f32(op3)); Step::Continue }
            Op::GeF32 => { self.write_bool(op1, self.read_f32(op2) >= self.read_f32(op3)); Step::Continue }
            Op::LtF32 => { self.write_bool(op1, self.read_f32(op2) < self.read_f32(op3)); Step::Continue }
            Op::LeF32 => { self.write_bool(op1, self.read_f32(op2) <= self.read_f32(op3)); Step::Continue }
            Op::NegF32 => { self.write_f32(op1, -self.read_f32(op2)); Step::Continue }

            Op::AddF64 => { self.write_f64(op1, self.read_f64(op2) + self.read_f64(op3)); Step::Continue }
            Op::SubF64 => { self.write_f64(op1, self.read_f64(op2) - self.read_f64(op3)); Step::Continue }
            Op::MulF64 => { self.write_f64(op1, self.read_f64(op2) * self.read_f64(op3)); Step::Continue }
            Op::DivF64 => { self.write_f64(op1, self.read_f64(op2) / self.read_f64(op3)); Step::Continue }
            Op::EqF64 => { self.write_bool(op1, self.read_f64(op2) == self.read_f64(op3)); Step::Continue }
            Op::NeF64 => { self.write_bool(op1, self.read_f64(op2) != self.read_f64(op3)); Step::Continue }
            Op::GtF64 => { self.write_bool(op1, self.read_f64(op2) > self.read_f64(op3)); Step::Continue }
            Op::GeF64 => { self.write_bool(op1, self.read_f64(op2) >= self.read_f64(op3)); Step::Continue }
            Op::LtF64 => { self.write_bool(op1, self.read_f64(op2) < self.read_f64(op3)); Step::Continue }
            Op::LeF64 => { self.write_bool(op1, self.read_f64(op2) <= self.read_f64(op3)); Step::Continue }
            Op::NegF64 => { self.write_f64(op1, -self.read_f64(op2)); Step::Continue }

            Op::EqBool => { self.write_bool(op1, self.read_bool(op2) == self.read_bool(op3)); Step::Continue }
            Op::NeBool => { self.write_bool(op1, self.read_bool(op2) != self.read_bool(op3)); Step::Continue }
            Op::AndBool => { self.write_bool(op1, self.read_bool(op2) && self.read_bool(op3)); Step::Continue }
            Op::OrBool => { self.write_bool(op1, self.read_bool(op2) || self.read_bool(op3)); Step::Continue }
            Op::NotBool => { self.write_bool(op1, !self.read_bool(op2)); Step::Continue }
            Op::EqPointer => { self.write_bool(op1, self.read_u64(op2) == self.read_u64(op3)); Step::Continue }
            Op::NePointer => { self.write_bool(op1, self.read_u64(op2) != self.read_u64(op3)); Step::Continue }
        }
    }

    fn call_function(&mut self, target_ip: usize, frame_offset: usize) -> Step {
        if self.stack.len() - self.sp < MAX_FUNCTION_STACK_DEPTH {
            return Step::Halt(self.fault(HaltReason::StackOverflow));
        }
        let header_offset = self.function_starting_at(target_ip).frame_header_offset as i32;
        let next_ip = self.ip + 1;
        let old_sp = self.sp as u64;
        self.sp += frame_offset;
        self.write_u64(header_offset, next_ip as u64);
        self.write_u64(header_offset + 8, old_sp);
        Step::Jump(target_ip)
    }

    fn do_return(&mut self, src: i32, size: usize) -> Step {
        if size > RETURN_REGISTER_SIZE {
            return Step::Halt(self.fault(HaltReason::ReturnValueOverflow));
        }
        let start = self.addr(src);
        self.return_register[..size].copy_from_slice(&self.stack[start..start + size]);
        let header_offset = self.function_containing(self.ip).frame_header_offset as i32;
        let return_ip = self.read_u64(header_offset) as usize;
        let saved_sp = self.read_u64(header_offset + 8) as usize;
        self.sp = saved_sp;
        Step::Jump(return_ip)
    }

    fn do_exit(&mut self, src: i32, size: usize) -> Step {
        let size = size.min(RETURN_REGISTER_SIZE);
        let start = self.addr(src);
        self.return_register[..size].copy_from_slice(&self.stack[start..start + size]);
        let mut low4 = [0u8; 4];
        let n = size.min(4);
        low4[..n].copy_from_slice(&self.return_register[..n]);
        Step::Halt(RunOutcome { exit_code: i32::from_le_bytes(low4), halt_reason: HaltReason::Exited })
    }

    fn cast_integer_different_size(&mut self, dst: i32, src: i32, to: PrimitiveType, from: PrimitiveType) {
        let bits: u64 = match from {
            PrimitiveType::I8 => self.read_i8(src) as i64 as u64,
            PrimitiveType::I16 => self.read_i16(src) as i64 as u64,
            PrimitiveType::I32 => self.read_i32(src) as i64 as u64,
            PrimitiveType::I64 => self.read_i64(src) as u64,
            PrimitiveType::U8 => self.read_u8(src) as u64,
            PrimitiveType::U16 => self.read_u16(src) as u64,
            PrimitiveType::U32 => self.read_u32(src) as u64,
            PrimitiveType::U64 => self.read_u64(src),
            other => unreachable!("{other:?} is not an integer primitive"),
        };
        match to {
            PrimitiveType::I8 => self.write_i8(dst, bits as i8),
            PrimitiveType::I16 => self.write_i16(dst, bits as i16),
            PrimitiveType::I32 => self.write_i32(dst, bits as i32),
            PrimitiveType::I64 => self.write_i64(dst, bits as i64),
            PrimitiveType::U8 => self.write_u8(dst, bits as u8),
            PrimitiveType::U16 => self.write_u16(dst, bits as u16),
            PrimitiveType::U32 => self.write_u32(dst, bits as u32),
            PrimitiveType::U64 => self.write_u64(dst, bits),
            other => unreachable!("{other:?} is not an integer primitive"),
        }
    }

    fn cast_float_different_size(&mut self, dst: i32, src: i32, to: PrimitiveType, from: PrimitiveType) {
        let value: f64 = match from {
            PrimitiveType::F32 => self.read_f32(src) as f64,
            PrimitiveType::F64 => self.read_f64(src),
            other => unreachable!("{other:?} is not a float primitive"),
        };
        match to {
            PrimitiveType::F32 => self.write_f32(dst, value as f32),
            PrimitiveType::F64 => self.write_f64(dst, value),
            other => unreachable!("{other:?} is not a float primitive"),
        }
    }

    fn cast_float_integer(&mut self, dst: i32, src: i32, to: PrimitiveType, from: PrimitiveType) {
        let value: f64 = match from {
            PrimitiveType::F32 => self.read_f32(src) as f64,
            PrimitiveType::F64 => self.read_f64(src),
            other => unreachable!("{other:?} is not a float primitive"),
        };
        match to {
            PrimitiveType::I8 => self.write_i8(dst, value as i8),
            PrimitiveType::I16 => self.write_i16(dst, value as i16),
            PrimitiveType::I32 => self.write_i32(dst, value as i32),
            PrimitiveType::I64 => self.write_i64(dst, value as i64),
            PrimitiveType::U8 => self.write_u8(dst, value as u8),
            PrimitiveType::U16 => self.write_u16(dst, value as u16),
            PrimitiveType::U32 => self.write_u32(dst, value as u32),
            PrimitiveType::U64 => self.write_u64(dst, value as u64),
            other => unreachable!("{other:?} is not an integer primitive"),
        }
    }

    fn cast_integer_float(&mut self, dst: i32, src: i32, to: PrimitiveType, from: PrimitiveType) {
        let value: f64 = match from {
            PrimitiveType::I8 => self.read_i8(src) as f64,
            PrimitiveType::I16 => self.read_i16(src) as f64,
            PrimitiveType::I32 => self.read_i32(src) as f64,
            PrimitiveType::I64 => self.read_i64(src) as f64,
            PrimitiveType::U8 => self.read_u8(src) as f64,
            PrimitiveType::U16 => self.read_u16(src) as f64,
            PrimitiveType::U32 => self.read_u32(src) as f64,
            PrimitiveType::U64 => self.read_u64(src) as f64,
            other => unreachable!("{other:?} is not an integer primitive"),
        };
        match to {
            PrimitiveType::F32 => self.write_f32(dst, value as f32),
            PrimitiveType::F64 => self.write_f64(dst, value),
            other => unreachable!("{other:?} is not a float primitive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphc_ir::build_program;
    use glyphc_lex::lex;
    use glyphc_par::parse;
    use glyphc_sem::analyze;
    use glyphc_util::FileId;

    fn run_source(src: &str) -> RunOutcome {
        let lexed = lex(src, FileId::DUMMY);
        assert!(!lexed.had_errors, "lex errors in {src:?}");
        let mut parsed = parse(lexed.tokens);
        assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
        let analysis = analyze(&mut parsed.ast, parsed.root);
        assert!(analysis.errors.is_empty(), "sema errors: {:?}", analysis.errors);
        let ir = build_program(&parsed.ast, &analysis);
        let program = glyphc_bc::generate(&ir, &analysis.types).expect("generate");
        run(&program)
    }

    #[test]
    fn arithmetic_precedence() {
        let outcome = run_source("main :: () -> i32 { return 2 + 3 * 4; }");
        assert_eq!(outcome.exit_code, 14);
        assert_eq!(outcome.halt_reason, HaltReason::Exited);
    }

    #[test]
    fn left_associative_subtraction() {
        let outcome = run_source("main :: () -> i32 { return 10 - 3 - 2; }");
        assert_eq!(outcome.exit_code, 5);
    }

    #[test]
    fn while_loop_accumulates() {
        let outcome = run_source("main :: () -> i32 { x : i32 = 0; i : i32 = 0; while i < 5 { x = x + i; i = i + 1; } return x; }");
        assert_eq!(outcome.exit_code, 10);
    }

    #[test]
    fn function_call_passes_arguments() {
        let outcome = run_source("add :: (a: i32, b: i32) -> i32 { return a + b; } main :: () -> i32 { return add(20, 22); }");
        assert_eq!(outcome.exit_code, 42);
    }

    #[test]
    fn break_and_continue() {
        let outcome = run_source(
            "main :: () -> i32 { s : i32 = 0; i : i32 = 0; while i < 10 { i = i + 1; if i == 5 { continue; } if i == 8 { break; } s = s + i; } return s; }",
        );
        assert_eq!(outcome.exit_code, 23);
    }

    #[test]
    fn nested_calls_use_independent_frames() {
        let outcome = run_source(
            "double :: (x: i32) -> i32 { return x * 2; } \
             quadruple :: (x: i32) -> i32 { return double(double(x)); } \
             main :: () -> i32 { return quadruple(5); }",
        );
        assert_eq!(outcome.exit_code, 20);
    }

    #[test]
    fn recursive_call_accumulates_across_frames() {
        let outcome = run_source(
            "sum_to :: (n: i32) -> i32 { if n <= 0 { return 0; } return n + sum_to(n - 1); } \
             main :: () -> i32 { return sum_to(5); }",
        );
        assert_eq!(outcome.exit_code, 15);
    }
}
