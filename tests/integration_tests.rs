use oc_lang::config::{EXIT_OK, EXIT_RUNTIME_ERROR, EXIT_STATIC_ERROR, EXIT_USAGE};
use oc_lang::diagnostics::Diagnostics;
use oc_lang::interpreter::value::Value;
use oc_lang::interpreter::Interpreter;
use oc_lang::keywords::load_keywords;
use oc_lang::parser::ast::Stmt;
use oc_lang::runner::{self, Outcome};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::process::Command;

// Mimic what the oc driver is doing, capturing print output
fn eval(source: &str) -> (String, Outcome) {
    let keywords = load_keywords(None).unwrap();
    let mut interpreter = Interpreter::with_output(Vec::new());
    let outcome = runner::run(source, &keywords, &mut interpreter);
    let output = String::from_utf8(interpreter.into_output()).unwrap();
    (output, outcome)
}

fn stdout_of(source: &str) -> String {
    let (output, outcome) = eval(source);
    assert_eq!(outcome, Outcome::Ok, "program failed: {}", source);
    output
}

fn diagnostics_of(source: &str) -> Vec<String> {
    match eval(source) {
        (output, Outcome::StaticErrors(diagnostics)) => {
            assert_eq!(output, "", "nothing may run when static errors occur");
            diagnostics.iter().map(|d| d.to_string()).collect()
        }
        (_, other) => panic!("expected static errors, got {:?}", other),
    }
}

#[test]
fn test_declare_and_print() {
    assert_eq!(stdout_of("var x = 1 + 2; est x;"), "3\n");
}

#[test]
fn test_mixed_plus_is_runtime_error() {
    let (output, outcome) = eval("\nest 1 + \"a\";");
    assert_eq!(output, "");
    match &outcome {
        Outcome::RuntimeError(e) => {
            assert_eq!(e.message, "Operands must be two numbers or two strings.");
            assert_eq!(e.token.line, 2);
            assert_eq!(e.to_string(), "Operands must be two numbers or two strings. [2]");
        }
        other => panic!("expected runtime error, got {:?}", other),
    }
    assert_eq!(outcome.exit_code(), EXIT_RUNTIME_ERROR);
}

#[test]
fn test_if_else() {
    assert_eq!(
        stdout_of("se (true) { est \"yes\"; } senon { est \"no\"; }"),
        "yes\n"
    );
}

#[test]
fn test_while_loop_counts() {
    assert_eq!(
        stdout_of("var i = 0; mentre (i < 3) { est i; i = i + 1; }"),
        "0\n1\n2\n"
    );
}

#[test]
fn test_block_shadowing() {
    assert_eq!(
        stdout_of("var x = 1; { var x = 2; est x; } est x;"),
        "2\n1\n"
    );
}

#[test]
fn test_undefined_variable() {
    let (_, outcome) = eval("est y;");
    match outcome {
        Outcome::RuntimeError(e) => {
            assert_eq!(e.message, "Undefined variable 'y'.");
            assert_eq!(e.token.lexeme, "y");
        }
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_dangling_operator_recovers() {
    let keywords = load_keywords(None).unwrap();
    let mut diagnostics = Diagnostics::new();
    let program = runner::parse("var a = 1 *;\nest 2;", &keywords, &mut diagnostics);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics.iter().next().map(|d| d.to_string()),
        Some("Error at ';': Expect expression [1]".to_string())
    );
    assert_eq!(program.statements.len(), 2);
    assert_eq!(program.statements[0], Stmt::Error);
    assert!(matches!(program.statements[1], Stmt::Print { .. }));
}

#[test]
fn test_static_errors_prevent_execution() {
    let (output, outcome) = eval("est 1;\nest 2 +;");
    assert_eq!(output, "");
    assert_eq!(outcome.exit_code(), EXIT_STATIC_ERROR);
}

#[test]
fn test_scan_errors_reported_before_parse_errors() {
    assert_eq!(
        diagnostics_of("est 1 @;\nvar = 2;\nest \"open"),
        vec![
            "Error : Unexpected character. [1]",
            "Error : Unterminated string. [3]",
            "Error at '=': Expect variable name. [2]",
            "Error at end: Expect expression [3]",
        ]
    );
}

#[test]
fn test_scan_error_alone_blocks_execution() {
    // the stray character is dropped, so the remaining tokens parse fine
    assert_eq!(
        diagnostics_of("est 1 # ;"),
        vec!["Error : Unexpected character. [1]"]
    );
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(
        diagnostics_of("var a = 1;\n(a) = 2;\nest a;"),
        vec!["Error at '=': Invalid assignment target. [2]"]
    );
}

#[test]
fn test_nested_scopes_assign_outward() {
    let source = r#"
    var a = "global a";
    var b = "global b";
    {
        var a = "outer a";
        {
            b = "assigned b";
            var c = "inner c";
            est a;
            est c;
        }
        est a;
    }
    est a;
    est b;
    "#;
    assert_eq!(
        stdout_of(source),
        "outer a\ninner c\nouter a\nglobal a\nassigned b\n"
    );
}

#[test]
fn test_fibonacci_with_while() {
    let source = r#"
    var a = 0;
    var b = 1;
    var n = 0;
    mentre (n < 10) {
        est a;
        var t = a;
        a = b;
        b = t + b;
        n = n + 1;
    }
    "#;
    assert_eq!(stdout_of(source), "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n");
}

#[test]
fn test_short_circuit_skips_side_effects() {
    let source = r#"
    var calls = 0;
    se (true o (calls = calls + 1)) est "or done";
    se (fals e (calls = calls + 1)) est "unreachable";
    est calls;
    "#;
    assert_eq!(stdout_of(source), "or done\n0\n");
}

#[test]
fn test_truthiness_of_zero_and_empty_string() {
    assert_eq!(
        stdout_of("se (0) est \"zero\"; se (\"\") est \"empty\"; se (nul) est \"null\";"),
        "zero\nempty\n"
    );
}

#[test]
fn test_print_formats() {
    assert_eq!(
        stdout_of("est nul; est true; est fals; est 10; est 2.5; est \"raw\\n\";"),
        "nul\ntrue\nfalse\n10\n2.5\nraw\\n\n"
    );
}

#[test]
fn test_precedence_quirk_is_preserved() {
    // term/factor right operands re-enter comparison
    assert_eq!(stdout_of("est 2 * 3 + 4;"), "14\n");
    assert_eq!(stdout_of("est 8 / 2 * 2;"), "2\n");
    assert_eq!(stdout_of("est 1 - 1 - 1;"), "1\n");

    // so a comparison can sit unparenthesized on the right of an operator
    let (_, outcome) = eval("est 1 + 2 < 3;");
    assert!(matches!(outcome, Outcome::RuntimeError(ref e) if e.message == "Operands must be two numbers or two strings."));

    // and unary minus swallows a whole comparison
    let (_, outcome) = eval("est -1 < 2;");
    assert!(matches!(outcome, Outcome::RuntimeError(ref e) if e.message == "Operand must be a number"));
}

#[test]
fn test_runtime_error_aborts_rest_of_program() {
    let (output, outcome) = eval("est \"before\";\nest -nul;\nest \"after\";");
    assert_eq!(output, "before\n");
    assert!(matches!(outcome, Outcome::RuntimeError(ref e) if e.token.line == 2));
}

#[test]
fn test_session_shares_globals_across_runs() {
    let keywords = load_keywords(None).unwrap();
    let mut interpreter = Interpreter::with_output(Vec::new());

    assert!(runner::run("var count = 1;", &keywords, &mut interpreter).is_ok());
    assert!(!runner::run("est oops", &keywords, &mut interpreter).is_ok());
    assert!(!runner::run("{ var count = 100; est missing; }", &keywords, &mut interpreter).is_ok());
    assert!(runner::run("count = count + 1; est count;", &keywords, &mut interpreter).is_ok());

    let output = String::from_utf8(interpreter.output().clone()).unwrap();
    assert_eq!(output, "2\n");
}

#[test]
fn test_globals_are_inspectable() {
    let keywords = load_keywords(None).unwrap();
    let mut interpreter = Interpreter::with_output(Vec::new());
    runner::run("var greeting = \"hi\" + \"!\";", &keywords, &mut interpreter);

    let token = oc_lang::scanner::token::Token::new(
        oc_lang::scanner::token::TokenType::Identifier,
        "greeting",
        1,
    );
    assert_eq!(interpreter.globals().get(&token), Ok(Value::from("hi!")));
}

#[test]
fn test_unsupported_keywords_are_parse_errors() {
    assert_eq!(
        diagnostics_of("foncion f() {}\nest 1;"),
        vec!["Error at 'foncion': Expect expression [1]"]
    );
}

#[test]
fn test_custom_keyword_file() {
    let path = temp_file("keywords.json", r#"{"print": "say", "var": "let", "while": "loop"}"#);
    let keywords = load_keywords(path.to_str()).unwrap();
    let mut interpreter = Interpreter::with_output(Vec::new());

    let outcome = runner::run(
        "let i = 0; loop (i < 2) { say i; i = i + 1; }",
        &keywords,
        &mut interpreter,
    );
    assert_eq!(outcome, Outcome::Ok);
    assert_eq!(
        String::from_utf8(interpreter.into_output()).unwrap(),
        "0\n1\n"
    );
}

// --- DRIVER TESTS ---

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("oc-test-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

fn oc(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_oc"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_driver_runs_file() {
    let path = temp_file("ok.oc", "var x = 1 + 2;\nest x;\n");
    let output = oc(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(EXIT_OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "3\n");
}

#[test]
fn test_driver_static_error_status() {
    let path = temp_file("static.oc", "est 1 +;\n");
    let output = oc(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(EXIT_STATIC_ERROR));
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "Error at ';': Expect expression [1]\n"
    );
}

#[test]
fn test_driver_runtime_error_status() {
    let path = temp_file("runtime.oc", "est \"a\";\nest y;\n");
    let output = oc(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(EXIT_RUNTIME_ERROR));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "a\n");
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "Undefined variable 'y'. [2]\n"
    );
}

#[test]
fn test_driver_usage_error() {
    let output = oc(&["one.oc", "two.oc"]);
    assert_eq!(output.status.code(), Some(EXIT_USAGE));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Usage: oc [script]\n");
}
