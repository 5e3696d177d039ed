use std::io::{self, Write};

use owo_colors::Style;

use lox_interpreter::{Interpreter, Value};
use lox_lexer::Lexer;
use lox_parser::Parser;
use lox_resolver::Resolver;
use lox_syntax::diagnostic::Diagnostics;
use lox_syntax::token::{Token, TokenKind};

use crate::common::{dim, paint, red, render_diagnostics, render_error, yellow};

pub fn start_repl() {
    println!(
        "{}",
        paint("Lox REPL. Type :help for help, :quit to exit.", Style::new().bold().green())
    );

    let mut interpreter = Interpreter::new();
    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "lox> " } else { "...> " };
        print!("{}", paint(prompt, Style::new().cyan()));
        let _ = io::stdout().flush();

        let mut line = String::new();
        let n = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => {
                println!("<input error>");
                break;
            }
        };
        if n == 0 {
            println!("\nGoodbye.");
            break;
        }
        let trimmed = line.trim();

        if buffer.is_empty() && trimmed.starts_with(':') {
            match trimmed {
                ":quit" | ":q" | ":exit" => {
                    println!("Goodbye.");
                    break;
                }
                ":help" | ":h" => print_help(),
                ":vars" => print_vars(&interpreter),
                ":reset" => {
                    interpreter.reset();
                    println!("{}", paint("State reset.", yellow()));
                }
                _ => println!("{}", paint("Unknown command. Type :help.", red())),
            }
            continue;
        }

        buffer.push_str(&line);
        if !is_complete(&buffer) {
            continue;
        }
        if !buffer.trim().is_empty() {
            eval_entry(&mut interpreter, &buffer);
        }
        buffer.clear();
    }
}

/// Runs one complete entry. A bare expression has its value echoed.
fn eval_entry(interpreter: &mut Interpreter, source: &str) {
    let tokens = match Lexer::new(source).tokenize() {
        Ok(t) => t,
        Err(e) => {
            render_error("Lex error", source, &e);
            return;
        }
    };

    if let Some(value) = try_expression(interpreter, source, &tokens) {
        if value != Value::Nil {
            println!("{}", paint(value, Style::new().bright_blue()));
        }
        return;
    }

    let mut diagnostics = Diagnostics::new();
    let program = Parser::new(tokens, &mut diagnostics).parse();
    if !diagnostics.has_errors() {
        lox_resolver::resolve(&program, interpreter, &mut diagnostics);
    }
    if diagnostics.has_errors() {
        render_diagnostics(source, &diagnostics);
        return;
    }
    if let Err(e) = interpreter.interpret(&program) {
        render_error("Runtime error", source, &e);
    }
}

/// Evaluates `tokens` as a single expression if they form one.
///
/// `None` means the entry is not a lone expression. Errors are rendered
/// here and come back as `Some(Nil)` so nothing is echoed.
fn try_expression(interpreter: &mut Interpreter, source: &str, tokens: &[Token]) -> Option<Value> {
    let mut diagnostics = Diagnostics::new();
    let expr = Parser::new(tokens.to_vec(), &mut diagnostics).parse_expression()?;
    // some syntax errors are reported without abandoning the tree
    if diagnostics.has_errors() {
        render_diagnostics(source, &diagnostics);
        return Some(Value::Nil);
    }

    let mut resolve_diags = Diagnostics::new();
    Resolver::new(interpreter, &mut resolve_diags).resolve_expression(&expr);
    if resolve_diags.has_errors() {
        render_diagnostics(source, &resolve_diags);
        return Some(Value::Nil);
    }
    match interpreter.evaluate_expression(&expr) {
        Ok(value) => Some(value),
        Err(e) => {
            render_error("Runtime error", source, &e);
            Some(Value::Nil)
        }
    }
}

fn print_help() {
    println!("{}", paint("Commands:", Style::new().bold()));
    println!("  {}  Show this help", paint(":help", yellow()));
    println!("  {}  Exit the REPL", paint(":quit", yellow()));
    println!("  {}  List global variables", paint(":vars", yellow()));
    println!("  {} Clear all state", paint(":reset", yellow()));
    println!("Enter statements or a bare expression. Input continues until braces and parentheses balance.");
}

fn print_vars(interpreter: &Interpreter) {
    let mut vars = interpreter.globals_snapshot();
    vars.retain(|(_, v)| !matches!(v, Value::Native(_)));
    vars.sort_by(|a, b| a.0.cmp(&b.0));
    if vars.is_empty() {
        println!("{}", paint("<no vars>", dim()));
        return;
    }
    for (k, v) in vars {
        println!("{} = {}", paint(k, yellow()), paint(v, Style::new().bright_blue()));
    }
}

/// True once every `(` and `{` has been closed. Unlexable input counts as
/// complete so its error surfaces immediately.
fn is_complete(input: &str) -> bool {
    let tokens = match Lexer::new(input).tokenize() {
        Ok(t) => t,
        Err(e) => return e.msg != "Unterminated string.",
    };
    let mut depth = 0i32;
    for tk in &tokens {
        match tk.kind {
            TokenKind::LParen | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBrace => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

#[cfg(test)]
mod tests {
    use super::is_complete;

    #[test]
    fn test_is_complete_balances_brackets() {
        assert!(is_complete("print 1;\n"));
        assert!(!is_complete("fun f() {\n"));
        assert!(!is_complete("print (1 +\n"));
        assert!(is_complete("fun f() {\n  return 1;\n}\n"));
        assert!(!is_complete("print \"open\n"));
        assert!(is_complete("print @;\n"));
    }
}
