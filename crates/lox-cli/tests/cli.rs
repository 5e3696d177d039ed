use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap().parent().unwrap().to_path_buf()
}

fn lox() -> Command {
    let mut cmd = Command::cargo_bin("lox").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn runs_closures_demo() {
    let root = workspace_root();
    lox()
        .arg(root.join("demos/closures.lox"))
        .assert()
        .success()
        .stdout("1\n2\n1\nafter\n");
}

#[test]
fn runs_fib_demo() {
    let root = workspace_root();
    lox()
        .arg(root.join("demos/fib.lox"))
        .assert()
        .success()
        .stdout("0\n1\n1\n2\n3\n5\n8\n13\n21\n34\ntrue\n");
}

#[test]
fn runs_scope_demo() {
    let root = workspace_root();
    lox()
        .arg(root.join("demos/scope.lox"))
        .assert()
        .success()
        .stdout("global\nglobal\nblock\n20\n");
}

#[test]
fn unused_variable_exits_65() {
    let root = workspace_root();
    lox()
        .arg(root.join("demos/unused.lox"))
        .assert()
        .code(65)
        .stdout("")
        .stderr(predicate::str::contains(
            "[line 3] Error at 'forgotten': Unused variable.",
        ));
}

#[test]
fn runtime_error_exits_70_after_earlier_output() {
    let root = workspace_root();
    lox()
        .arg(root.join("demos/runtime_error.lox"))
        .assert()
        .code(70)
        .stdout("hello\n")
        .stderr(predicate::str::contains("Operands must be numbers."))
        .stderr(predicate::str::contains("line 3, column 16"));
}

#[test]
fn parse_error_reports_every_statement() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let bad_path = tmp_dir.path().join("bad.lox");
    std::fs::write(&bad_path, "print (1;\nvar = 2;\nprint 3;\n").unwrap();

    lox()
        .arg(&bad_path)
        .assert()
        .code(65)
        .stderr(predicate::str::contains(
            "[line 1] Error at ';': Expect ')' after expression.",
        ))
        .stderr(predicate::str::contains(
            "[line 2] Error at '=': Expect variable name.",
        ));
}

#[test]
fn lex_error_exits_65() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let bad_path = tmp_dir.path().join("bad.lox");
    std::fs::write(&bad_path, "print \"never closed;\n").unwrap();

    lox()
        .arg(&bad_path)
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Unterminated string."));
}

#[test]
fn missing_file_exits_66() {
    let tmp_dir = tempfile::tempdir().unwrap();
    lox()
        .arg(tmp_dir.path().join("absent.lox"))
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn repl_keeps_state_and_survives_errors() {
    lox()
        .write_stdin("var a = 2;\nfun double(x) {\n  return x * 2;\n}\nprint missing;\ndouble(a) + 1\n:vars\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("5"))
        .stdout(predicate::str::contains("a = 2"))
        .stdout(predicate::str::contains("double = <fn double>"))
        .stderr(predicate::str::contains("Undefined variable 'missing'."));
}

#[test]
fn repl_reset_clears_globals() {
    lox()
        .write_stdin("var a = 1;\n:reset\n:vars\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("State reset."))
        .stdout(predicate::str::contains("<no vars>"));
}

#[test]
fn repl_reports_errors_that_keep_the_tree() {
    lox()
        .write_stdin("1 = 2\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("> 1\n").not())
        .stderr(predicate::str::contains(
            "[line 1] Error at '=': Invalid assignment target.",
        ));
}

#[test]
fn deep_recursion_through_nested_blocks_is_a_runtime_error() {
    let depth = 30;
    let source = format!(
        "fun f(n) {{\n{}if (n > 0) return f(n - 1);{}\nreturn 0;\n}}\nprint f(199);\n",
        "{ if (true) ".repeat(depth),
        " }".repeat(depth)
    );
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("deep.lox");
    std::fs::write(&path, source).unwrap();

    lox()
        .arg(&path)
        .assert()
        .code(70)
        .stderr(predicate::str::contains("Stack overflow."));
}

#[test]
fn deeply_nested_prefix_operators_are_a_syntax_error() {
    let source = format!("print {}1;\nprint 2;\n", "-".repeat(200_000));
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("prefix.lox");
    std::fs::write(&path, source).unwrap();

    lox()
        .arg(&path)
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Too deeply nested."));
}
