mod common;
mod repl;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use clap::Parser as ClapParser;
use lox_interpreter::{Interpreter, STACK_SIZE};
use lox_lexer::Lexer;
use lox_parser::Parser;
use lox_syntax::diagnostic::Diagnostics;

use crate::common::{init_logging, paint, red, render_diagnostics, render_error};

/// Exit status for malformed input (lexing, parsing, resolution).
const EXIT_DATA_ERR: u8 = 65;
/// Exit status for an unreadable script.
const EXIT_NO_INPUT: u8 = 66;
/// Exit status for a runtime error.
const EXIT_SOFTWARE: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(name = "lox", version, about = "Run a Lox script, or start a REPL without one")]
struct Cli {
    /// Script to run
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    // the parser, resolver and interpreter all recurse on the native stack
    let worker = thread::Builder::new()
        .name("lox".into())
        .stack_size(STACK_SIZE)
        .spawn(move || match cli.script {
            Some(path) => run_file(&path),
            None => {
                repl::start_repl();
                ExitCode::SUCCESS
            }
        });
    match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => ExitCode::from(EXIT_SOFTWARE),
        Err(e) => {
            eprintln!(
                "{}: {}",
                paint("error", red().bold()),
                paint(format!("Failed to start interpreter thread: {}", e), red())
            );
            ExitCode::from(EXIT_SOFTWARE)
        }
    }
}

fn run_file(path: &Path) -> ExitCode {
    let src = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "{}: {}",
                paint("error", red().bold()),
                paint(format!("Failed to read {}: {}", path.display(), e), red())
            );
            return ExitCode::from(EXIT_NO_INPUT);
        }
    };
    tracing::debug!(path = %path.display(), bytes = src.len(), "running script");

    let tokens = match Lexer::new(&src).tokenize() {
        Ok(t) => t,
        Err(e) => {
            render_error("Lex error", &src, &e);
            return ExitCode::from(EXIT_DATA_ERR);
        }
    };

    let mut diagnostics = Diagnostics::new();
    let program = Parser::new(tokens, &mut diagnostics).parse();
    if diagnostics.has_errors() {
        render_diagnostics(&src, &diagnostics);
        return ExitCode::from(EXIT_DATA_ERR);
    }

    let mut interp = Interpreter::new();
    lox_resolver::resolve(&program, &mut interp, &mut diagnostics);
    if diagnostics.has_errors() {
        render_diagnostics(&src, &diagnostics);
        return ExitCode::from(EXIT_DATA_ERR);
    }

    if let Err(e) = interp.interpret(&program) {
        render_error("Runtime error", &src, &e);
        return ExitCode::from(EXIT_SOFTWARE);
    }
    ExitCode::SUCCESS
}
