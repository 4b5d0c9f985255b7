//! End-to-end CLI tests (SPEC §8 "Concrete end-to-end scenarios"),
//! exercised against the real `glyphc` binary via `assert_cmd` — each
//! scenario is written to a temp file and compiled-and-run as a real
//! subprocess so the assertion covers the whole pipeline, not just one
//! crate's unit tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn glyphc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_glyphc"))
}

fn source_file(src: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp source file");
    write!(file, "{}", src).expect("failed to write source");
    file
}

#[test]
fn arithmetic_precedence() {
    let file = source_file("main :: () -> i32 { return 2 + 3 * 4; }");
    glyphc().arg(file.path()).assert().code(14);
}

#[test]
fn left_associative_subtraction() {
    let file = source_file("main :: () -> i32 { return 10 - 3 - 2; }");
    glyphc().arg(file.path()).assert().code(5);
}

#[test]
fn while_loop_accumulates() {
    let file = source_file(
        "main :: () -> i32 { x : i32 = 0; i : i32 = 0; while i < 5 { x = x + i; i = i + 1; } return x; }",
    );
    glyphc().arg(file.path()).assert().code(10);
}

#[test]
fn function_call_with_arguments() {
    let file = source_file(
        "add :: (a: i32, b: i32) -> i32 { return a + b; } main :: () -> i32 { return add(20, 22); }",
    );
    glyphc().arg(file.path()).assert().code(42);
}

#[test]
fn break_and_continue() {
    let file = source_file(
        "main :: () -> i32 { s : i32 = 0; i : i32 = 0; \
         while i < 10 { i = i + 1; if i == 5 { continue; } if i == 8 { break; } s = s + i; } \
         return s; }",
    );
    glyphc().arg(file.path()).assert().code(23);
}

#[test]
fn undefined_identifier_reports_diagnostic_and_produces_no_output() {
    let file = source_file("main :: () -> i32 { return x + 1; }");
    glyphc()
        .arg(file.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("undefined").and(predicate::str::contains("x")));
}

#[test]
fn hardcoded_print_functions_reach_stdout() {
    let file = source_file("main :: () -> i32 { print_i32(42); print_line(); return 0; }");
    glyphc().arg(file.path()).assert().success().stdout(predicate::str::contains("42"));
}

#[test]
fn nonzero_main_return_becomes_process_exit_code() {
    let file = source_file("main :: () -> i32 { return 7; }");
    glyphc().arg(file.path()).assert().code(7);
}

#[test]
fn missing_main_is_a_generator_error() {
    let file = source_file("helper :: () -> i32 { return 1; }");
    glyphc().arg(file.path()).assert().failure().code(1).stderr(predicate::str::contains("main"));
}

#[test]
fn missing_source_file_reports_io_error() {
    glyphc().arg("/nonexistent/path/does-not-exist.glyph").assert().failure().stderr(predicate::str::contains("error"));
}

#[test]
fn dump_tokens_prints_to_stdout_and_still_runs() {
    let file = source_file("main :: () -> i32 { return 0; }");
    glyphc().arg(file.path()).arg("--dump-tokens").assert().success().stdout(predicate::str::contains("KwReturn").or(predicate::str::contains("Ident")));
}

#[test]
fn disassemble_prints_function_table() {
    let file = source_file("main :: () -> i32 { return 0; }");
    glyphc().arg(file.path()).arg("--disassemble").assert().success().stdout(predicate::str::contains("main"));
}

#[test]
fn cli_help() {
    glyphc().arg("--help").assert().success().stdout(predicate::str::contains("glyphc"));
}

#[test]
fn cli_version() {
    glyphc().arg("--version").assert().success().stdout(predicate::str::contains("glyphc"));
}
