use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

use lox_syntax::diagnostic::{Diagnostic, Diagnostics};
use lox_syntax::error::Error;

/// Installs the stderr log subscriber; `RUST_LOG` overrides the `warn` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
}

/// Applies `style` unless `NO_COLOR` is set.
pub fn paint(text: impl std::fmt::Display, style: Style) -> String {
    if colors_enabled() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

pub fn red() -> Style {
    Style::new().red()
}

pub fn yellow() -> Style {
    Style::new().yellow()
}

pub fn dim() -> Style {
    Style::new().bright_black()
}

fn excerpt(source: &str, line: usize, col: usize) {
    if let Some(src_line) = line.checked_sub(1).and_then(|i| source.lines().nth(i)) {
        let gutter = format!("{:3} | ", line);
        eprintln!("{}{}", paint(&gutter, dim()), src_line);
        let marker = format!("{}^", " ".repeat(gutter.len() + col.saturating_sub(1)));
        eprintln!("{}", paint(marker, red()));
    }
}

/// Prints a lexing or runtime error with a source excerpt and caret.
pub fn render_error(kind: &str, source: &str, err: &Error) {
    eprintln!("{}: {}", paint(kind, red().bold()), paint(&err.msg, red()));
    if let (Some(line), Some(col)) = (err.line, err.col) {
        eprintln!("  --> line {}, column {}", line, col);
        excerpt(source, line, col);
    }
    provide_error_suggestions(&err.msg);
}

fn render_diagnostic(source: &str, diag: &Diagnostic) {
    eprintln!("{}", paint(diag, red()));
    if let Some(col) = diag.col {
        excerpt(source, diag.line, col);
    }
}

pub fn render_diagnostics(source: &str, diagnostics: &Diagnostics) {
    for diag in diagnostics {
        render_diagnostic(source, diag);
    }
    if let Some(first) = diagnostics.iter().next() {
        provide_error_suggestions(&first.message);
    }
}

fn hint(text: &str) {
    eprintln!("{}", paint(format!("Help: {}", text), yellow()));
}

pub fn provide_error_suggestions(msg: &str) {
    if msg.starts_with("Undefined variable") {
        hint("Declare it first with 'var name = value;'.");
    } else if msg.starts_with("Expected") && msg.contains("arguments") {
        hint("Check the number of parameters in the function declaration.");
    } else if msg == "Can only call functions." {
        hint("Only functions declared with 'fun' and built-ins like clock() can be called.");
    } else if msg == "Unused variable." {
        hint("Remove the declaration or read the variable somewhere in its block.");
    } else if msg == "Can't read local variable in its own initializer." {
        hint("Give the new variable a different name than the one it is initialized from.");
    } else if msg == "Unterminated string." {
        hint("Every '\"' needs a matching closing quote.");
    } else if msg.starts_with("Expect ';'") {
        hint("Statements end with a semicolon.");
    }
}
