//! glyphc-drv — the `glyphc` CLI binary's orchestration layer (SPEC §6,
//! SPEC_FULL.md "CLI SURFACE").
//!
//! Wires the five pipeline crates together in order — lex, parse,
//! analyze, build IR, generate bytecode, run — stopping at the first
//! stage that reports an error and printing every collected diagnostic as
//! `line:col: kind: message` to stderr. A successful compile hands the
//! resulting [`glyphc_bc::BytecodeProgram`] straight to `glyphc-vm`; the
//! interpreter's own exit code becomes the process exit code.

use std::path::{Path, PathBuf};

use thiserror::Error;

use glyphc_util::{FileId, Span};

/// What to print in addition to running the program, selected by the
/// CLI's `--dump-*` flags. These are additive debug views: the pipeline
/// keeps going past whichever stage is dumped (SPEC_FULL.md "CLI SURFACE").
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpFlags {
    pub tokens: bool,
    pub ast: bool,
    pub ir: bool,
    pub disassemble: bool,
}

/// Top-level error enum composing each phase's own error type, matching
/// the donor CLI binary's top-level error enum shape (SPEC_FULL.md
/// "Error handling").
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("could not read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("lexical errors in source")]
    Lex,
    #[error("parse errors in source")]
    Parse,
    #[error("semantic errors in source")]
    Sema,
    #[error(transparent)]
    Generator(#[from] glyphc_bc::GeneratorError),
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// One collected diagnostic, in the `line:col: kind: message` form §6
/// mandates.
pub struct Diagnostic {
    pub span: Span,
    pub kind: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}: {}", self.span.line, self.span.column, self.kind, self.message)
    }
}

/// Everything a successful compile produced, handed to `run_program` (or
/// inspected directly by a `--dump-*` flag) before execution begins.
pub struct CompiledProgram {
    pub bytecode: glyphc_bc::BytecodeProgram,
}

/// Reads `path`, runs every phase through bytecode generation, and prints
/// any `--dump-*` output requested along the way. Returns the compiled
/// program, or every diagnostic collected so far plus the first phase that
/// failed.
pub fn compile_file(path: &Path, dumps: DumpFlags) -> Result<CompiledProgram> {
    let source = std::fs::read_to_string(path).map_err(|e| CompileError::Io(path.to_path_buf(), e))?;
    compile_source(&source, dumps)
}

/// Runs the full lex → parse → analyze → IR → bytecode pipeline over
/// in-memory source text. Split out from [`compile_file`] so tests and
/// the `--dump-*` flags can exercise the pipeline without touching disk.
pub fn compile_source(source: &str, dumps: DumpFlags) -> Result<CompiledProgram> {
    tracing::info!(bytes = source.len(), "compiling");

    let lex_out = glyphc_lex::lex(source, FileId::DUMMY);
    tracing::debug!(tokens = lex_out.tokens.len(), had_errors = lex_out.had_errors, "lexed");
    if dumps.tokens {
        for token in &lex_out.tokens {
            println!("{:?}", token);
        }
    }
    if lex_out.had_errors {
        print_lex_errors(source, &lex_out.tokens);
        return Err(CompileError::Lex);
    }

    let mut parse_out = glyphc_par::parse(lex_out.tokens);
    tracing::debug!(nodes = parse_out.ast.len(), errors = parse_out.errors.len(), "parsed");
    if dumps.ast {
        println!("{:#?}", parse_out.ast);
    }
    if !parse_out.errors.is_empty() {
        print_diagnostics(parse_out.errors.iter().map(|e| Diagnostic { span: e.span, kind: "error", message: e.message.clone() }));
        return Err(CompileError::Parse);
    }

    let analysis = glyphc_sem::analyze(&mut parse_out.ast, parse_out.root);
    tracing::debug!(functions = analysis.functions.len(), errors = analysis.errors.len(), "analyzed");
    if !analysis.errors.is_empty() {
        print_diagnostics(analysis.errors.iter().map(|e| Diagnostic { span: e.span, kind: "error", message: e.message.clone() }));
        return Err(CompileError::Sema);
    }

    let ir_program = glyphc_ir::build_program(&parse_out.ast, &analysis);
    tracing::debug!(functions = ir_program.functions.len(), "lowered to IR");
    if dumps.ir {
        println!("{:#?}", ir_program);
    }

    let bytecode = glyphc_bc::generate(&ir_program, &analysis.types)?;
    tracing::info!(instructions = bytecode.instructions.len(), "generated bytecode");
    if dumps.disassemble {
        println!("{}", glyphc_bc::disassemble(&bytecode));
    }

    Ok(CompiledProgram { bytecode })
}

/// Runs a compiled program to completion and returns the interpreter's
/// exit code. `dump_state` gates `glyphc-vm`'s per-instruction `trace!`
/// event (Supplemented Feature 4); it does nothing unless the caller has
/// also raised `glyphc_vm`'s own tracing filter to `trace`.
pub fn run_program(program: &CompiledProgram, dump_state: bool) -> i32 {
    let options = glyphc_vm::Options { dump_state, ..glyphc_vm::Options::default() };
    let outcome = glyphc_vm::run_with_options(&program.bytecode, options);
    tracing::info!(exit_code = outcome.exit_code, halt_reason = %outcome.halt_reason, "run finished");
    outcome.exit_code
}

/// The lexer reports only a yes/no `had_errors` flag (SPEC §4.1), so this
/// walks the token stream once more to locate every `Error` token and
/// report its position — there is always at least one if `had_errors` is
/// set.
fn print_lex_errors(source: &str, tokens: &[glyphc_lex::Token]) {
    let _ = source;
    print_diagnostics(tokens.iter().filter(|t| t.kind == glyphc_lex::TokenKind::Error).map(|t| Diagnostic {
        span: t.span,
        kind: "error",
        message: "unrecognized character".to_string(),
    }));
}

fn print_diagnostics(diagnostics: impl Iterator<Item = Diagnostic>) {
    for diag in diagnostics {
        eprintln!("{}", diag);
    }
}
