//! Textual disassembly (§6: `index: MNEMONIC op1=… op2=… op3=…`), driven by
//! `--disassemble` (SPEC_FULL.md CLI surface).

use std::fmt::Write as _;

use glyphc_sem::hardcoded::HardcodedFunction;

use crate::generator::hardcoded_name;
use crate::opcode::Opcode;
use crate::program::{BytecodeProgram, Constant};

/// Renders every instruction in `program`, one line per index, with
/// function boundaries marked and `CALL_HARDCODED_FUNCTION`'s `op1` operand
/// annotated with the callee's name instead of its bare table index.
pub fn disassemble(program: &BytecodeProgram) -> String {
    let mut out = String::new();

    for (idx, func) in program.functions.iter().enumerate() {
        let marker = if idx as u32 == program.main_function { " (main)" } else { "" };
        let _ = writeln!(out, "function {}{marker}:", func.name.as_str());
        let end = program
            .functions
            .get(idx + 1)
            .map(|next| next.start_instruction)
            .unwrap_or(program.instructions.len());
        for (i, instr) in program.instructions[func.start_instruction..end].iter().enumerate() {
            let index = func.start_instruction + i;
            let _ = writeln!(out, "  {}", format_instruction(index, instr.op, instr.op1, instr.op2, instr.op3, instr.op4));
        }
    }

    if !program.constants.is_empty() {
        let _ = writeln!(out, "constants:");
        for i in 0..program.constants.len() {
            let _ = writeln!(out, "  [{i}] {}", format_constant(program.constants.get(i as u32)));
        }
    }

    out
}

fn format_instruction(index: usize, op: Opcode, op1: i32, op2: i32, op3: i32, op4: i32) -> String {
    let mnemonic = op.mnemonic();
    match op {
        Opcode::CallHardcodedFunction => {
            let name = HardcodedFunction::ALL.get(op1 as usize).map(|&hf| hardcoded_name(hf)).unwrap_or("?");
            format!("{index}: {mnemonic} callee={name} frame_offset={op2}")
        }
        Opcode::Jump => format!("{index}: {mnemonic} target={op1}"),
        Opcode::JumpOnTrue | Opcode::JumpOnFalse => format!("{index}: {mnemonic} cond={op1} target={op2}"),
        Opcode::CallFunction => format!("{index}: {mnemonic} target={op1} frame_offset={op2}"),
        _ => format!("{index}: {mnemonic} op1={op1} op2={op2} op3={op3} op4={op4}"),
    }
}

fn format_constant(c: Constant) -> String {
    match c {
        Constant::I32(v) => format!("i32 {v}"),
        Constant::F32(v) => format!("f32 {v}"),
        Constant::U64(v) => format!("u64 {v}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use glyphc_ir::build_program;
    use glyphc_lex::lex;
    use glyphc_par::parse;
    use glyphc_sem::analyze;
    use glyphc_util::FileId;

    fn disasm_source(src: &str) -> String {
        let lexed = lex(src, FileId::DUMMY);
        assert!(!lexed.had_errors, "lex errors in {src:?}");
        let mut parsed = parse(lexed.tokens);
        assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
        let analysis = analyze(&mut parsed.ast, parsed.root);
        assert!(analysis.errors.is_empty(), "sema errors: {:?}", analysis.errors);
        let ir = build_program(&parsed.ast, &analysis);
        let program = generate(&ir, &analysis.types).expect("generate");
        disassemble(&program)
    }

    #[test]
    fn disassembly_marks_the_main_function() {
        let out = disasm_source("main :: () -> i32 { return 0; }");
        assert!(out.contains("function main (main):"), "{out}");
        assert!(out.contains("EXIT"), "{out}");
    }

    #[test]
    fn hardcoded_calls_show_the_callee_name_not_its_raw_index() {
        let out = disasm_source("main :: () -> i32 { print_i32(1); return 0; }");
        assert!(out.contains("callee=print_i32"), "{out}");
    }
}
