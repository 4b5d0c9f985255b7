use crate::ir::{Callee, IrInstruction, OperandType};
use crate::build_program;
use glyphc_sem::analyze;

fn lower(src: &str) -> (glyphc_par::ast::Ast, crate::IrProgram) {
    let tokens = glyphc_lex::lex(src, glyphc_util::FileId::DUMMY).tokens;
    let mut out = glyphc_par::parse(tokens);
    assert!(out.errors.is_empty(), "parse errors: {:?}", out.errors);
    let analysis = analyze(&mut out.ast, out.root);
    assert!(analysis.errors.is_empty(), "sema errors: {:?}", analysis.errors);
    let program = build_program(&out.ast, &analysis);
    (out.ast, program)
}

#[test]
fn main_function_lowers_to_a_single_ir_function() {
    let (_, program) = lower("main :: () -> i32 { return 0; }");
    assert_eq!(program.functions.len(), 1);
    assert!(program.main.is_some());
    let main_fn = &program.functions[program.main.unwrap()];
    assert!(main_fn.params.is_empty());
    assert!(matches!(main_fn.body.instructions.last(), Some(IrInstruction::Return { value: Some(_) })));
}

#[test]
fn var_def_and_assignment_share_one_register() {
    let (_, program) = lower("main :: () -> i32 { x : i32 = 1; x = 2; return x; }");
    let main_fn = &program.functions[program.main.unwrap()];
    let mut moves = main_fn.body.instructions.iter().filter_map(|i| match i {
        IrInstruction::Move { dst, .. } => Some(*dst),
        _ => None,
    });
    let first = moves.next().unwrap();
    let second = moves.next().unwrap();
    assert_eq!(first, second, "the declaration's init move and the later assignment must target the same register");
}

#[test]
fn call_to_user_function_resolves_to_its_ir_function_id() {
    let (_, program) = lower("add :: (a: i32, b: i32) -> i32 { return a + b; } main :: () -> i32 { return add(20, 22); }");
    let main_fn = &program.functions[program.main.unwrap()];
    let called = main_fn.body.instructions.iter().find_map(|i| match i {
        IrInstruction::Call { callee: Callee::Function(id), args, .. } => Some((*id, args.len())),
        _ => None,
    });
    assert_eq!(called, Some((crate::ir::IrFunctionId(0), 2)));
}

#[test]
fn call_to_hardcoded_function_resolves_as_hardcoded() {
    let (_, program) = lower("main :: () -> i32 { print_line(); return 0; }");
    let main_fn = &program.functions[program.main.unwrap()];
    let found = main_fn.body.instructions.iter().any(|i| matches!(i, IrInstruction::Call { callee: Callee::Hardcoded(_), .. }));
    assert!(found);
}

#[test]
fn while_loop_carries_a_condition_block_reevaluated_each_iteration() {
    let (_, program) = lower("main :: () -> i32 { i : i32 = 0; while i < 5 { i = i + 1; } return i; }");
    let main_fn = &program.functions[program.main.unwrap()];
    let while_instr = main_fn.body.instructions.iter().find(|i| matches!(i, IrInstruction::While { .. })).unwrap();
    let IrInstruction::While { cond_block, body, .. } = while_instr else { unreachable!() };
    assert!(!cond_block.instructions.is_empty());
    assert!(!body.instructions.is_empty());
}

#[test]
fn if_else_lowers_both_branches() {
    let (_, program) = lower("main :: () -> i32 { if 1 < 2 { return 1; } else { return 0; } }");
    let main_fn = &program.functions[program.main.unwrap()];
    let if_instr = main_fn.body.instructions.iter().find(|i| matches!(i, IrInstruction::If { .. })).unwrap();
    let IrInstruction::If { then_block, else_block, .. } = if_instr else { unreachable!() };
    assert!(!then_block.instructions.is_empty());
    assert!(else_block.is_some());
}

#[test]
fn declared_numeric_type_mismatch_inserts_a_cast() {
    let (_, program) = lower("main :: () -> i32 { x : i32 = 2; y : f32 = x; return 0; }");
    let main_fn = &program.functions[program.main.unwrap()];
    let has_cast = main_fn.body.instructions.iter().any(|i| matches!(i, IrInstruction::Cast { .. }));
    assert!(has_cast, "assigning an i32 initializer to a declared f32 must insert a numeric cast");
}

#[test]
fn pointer_equality_dispatches_on_pointer_not_a_primitive() {
    let (_, program) = lower("main :: () -> i32 { p1 := malloc(4); p2 := malloc(4); same := p1 == p2; free(p1); free(p2); return 0; }");
    let main_fn = &program.functions[program.main.unwrap()];
    let found = main_fn.body.instructions.iter().any(|i| matches!(i, IrInstruction::Binary { ty: OperandType::Pointer, .. }));
    assert!(found, "comparing two pointer-typed locals must dispatch as OperandType::Pointer");
}
