//! `glyphc` — compile a Glyph source file and run it (SPEC_FULL.md "CLI
//! SURFACE"). A superset of §6's minimal `compiler <source-file>`
//! surface: exit code semantics and diagnostic format are unchanged, the
//! `--dump-*` flags just add opt-in intermediate-representation views.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use glyphc_drv::{compile_file, run_program, DumpFlags};

/// Compile and run a Glyph source file.
#[derive(Parser, Debug)]
#[command(name = "glyphc")]
#[command(author, version, about = "Glyph compiler and virtual machine", long_about = None)]
struct Cli {
    /// Path to the `.glyph` source file to compile and run
    source: PathBuf,

    /// Print the lexer's token stream to stdout and continue
    #[arg(long)]
    dump_tokens: bool,

    /// Print the parser's AST to stdout and continue
    #[arg(long)]
    dump_ast: bool,

    /// Print the generated three-address IR to stdout and continue
    #[arg(long)]
    dump_ir: bool,

    /// Print the generated bytecode's textual disassembly and continue
    #[arg(long)]
    disassemble: bool,

    /// Trace instruction pointer / stack pointer / stack top after every
    /// executed instruction (raises `glyphc_vm`'s own filter to `trace`)
    #[arg(long)]
    dump_state: bool,

    /// Disable ANSI color in diagnostics
    #[arg(long, env = "GLYPHC_NO_COLOR")]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.dump_state, cli.no_color);

    let dumps = DumpFlags { tokens: cli.dump_tokens, ast: cli.dump_ast, ir: cli.dump_ir, disassemble: cli.disassemble };

    let program = match compile_file(&cli.source, dumps) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(1);
        }
    };

    let exit_code = run_program(&program, cli.dump_state);
    ExitCode::from(exit_code.rem_euclid(256) as u8)
}

fn init_logging(dump_state: bool, no_color: bool) {
    let default_filter = if dump_state { "info,glyphc_vm=trace" } else { "info" };
    let filter = EnvFilter::try_from_env("GLYPHC_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = fmt::layer().with_ansi(!no_color).with_target(false).with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry().with(filter).with(subscriber).try_init();
}
