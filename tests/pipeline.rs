use smol::bytecode::image;
use smol::driver::{self, Execution};
use smol::error::Error;
use smol::frontend::diagnostic::{CollectingReporter, Diagnostic, DiagnosticKind};
use smol::frontend::parser::{MAX_EXPR_HEIGHT, MAX_NESTING};
use smol::runtime::runtime_error::RuntimeError;
use smol::runtime::vm::{VmConfig, VmState};

// ============================================================
// Helpers
// ============================================================

fn run_with(source: &str, config: VmConfig) -> Result<Execution<Vec<u8>>, Error> {
    let mut reporter = CollectingReporter::new();
    driver::run_source("test.smol", source, &mut reporter, config, Vec::new())
}

fn run(source: &str) -> Execution<Vec<u8>> {
    match run_with(source, VmConfig::default()) {
        Ok(execution) => execution,
        Err(e) => panic!("{:?} failed: {}", source, e),
    }
}

fn output(source: &str) -> String {
    let execution = run(source);
    String::from_utf8(execution.vm.into_output()).unwrap()
}

fn value(source: &str, name: &str) -> i64 {
    run(source)
        .value_of(name)
        .unwrap_or_else(|| panic!("no variable {} in {:?}", name, source))
}

fn compile_err(source: &str) -> Diagnostic {
    let mut reporter = CollectingReporter::new();
    let err = driver::compile("test.smol", source, &mut reporter).unwrap_err();
    assert_eq!(reporter.diagnostics.len(), 1, "exactly one diagnostic");
    err
}

// ============================================================
// Scenarios
// ============================================================

#[test]
fn scenario_precedence() {
    let execution = run("var x = 1 + 2 * 3;");
    assert_eq!(execution.value_of("x"), Some(7));
    assert_eq!(execution.vm.state(), VmState::Halted);
}

#[test]
fn scenario_assignment_updates_in_place() {
    assert_eq!(value("var x = 5; x = x + 1;", "x"), 6);
}

#[test]
fn scenario_infinite_goto_hits_step_budget() {
    let config = VmConfig {
        max_steps: Some(10_000),
    };
    match run_with("L: var x = 5; goto L;", config) {
        Err(Error::Runtime(RuntimeError::StepLimitExceeded(10_000))) => {}
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("program should not halt"),
    }
}

#[test]
fn scenario_duplicate_variable() {
    let err = compile_err("var x; var x = 1;");
    assert_eq!(err.kind, DiagnosticKind::Semantic);
    assert!(err.message.contains("already declared"));
    assert_eq!((err.start.line, err.start.column), (1, 12));
    assert_eq!(err.to_string(), "test.smol:1:12: variable already declared");
}

#[test]
fn scenario_assignment_to_literal() {
    let err = compile_err("1 = 2;");
    assert_eq!(err.kind, DiagnosticKind::Semantic);
    assert!(err.message.contains("lvalue"));
}

// ============================================================
// Expressions
// ============================================================

#[test]
fn test_associativity() {
    assert_eq!(value("var x = 10 - 4 - 3;", "x"), 3);
    assert_eq!(value("var x = 64 / 4 / 2;", "x"), 8);
    assert_eq!(value("var a; var b; a = b = 4;", "a"), 4);
    assert_eq!(value("var x = 1 ? 2 : 0 ? 3 : 4;", "x"), 2);
    assert_eq!(value("var x = 0 ? 2 : 0 ? 3 : 4;", "x"), 4);
}

#[test]
fn test_precedence_ladder() {
    assert_eq!(value("var x = 2 + 3 << 1;", "x"), 10);
    assert_eq!(value("var x = 1 << 2 < 5;", "x"), 1);
    assert_eq!(value("var x = 3 < 4 == 1;", "x"), 1);
    assert_eq!(value("var x = 6 & 3 ^ 1;", "x"), 3);
    assert_eq!(value("var x = 4 | 1 ^ 1;", "x"), 4);
    assert_eq!(value("var x = 1 || 0 && 0;", "x"), 1);
    assert_eq!(value("var x = (2 + 3) * 4;", "x"), 20);
}

#[test]
fn test_truncating_division() {
    assert_eq!(value("var x = -7 / 2;", "x"), -3);
    assert_eq!(value("var x = -7 % 2;", "x"), -1);
    assert_eq!(value("var x = 7 % -2;", "x"), 1);
}

#[test]
fn test_booleans_are_zero_or_one() {
    assert_eq!(value("var x = 5 && 3;", "x"), 1);
    assert_eq!(value("var x = 0 || -2;", "x"), 1);
    assert_eq!(value("var x = !5;", "x"), 0);
    assert_eq!(value("var x = !!9;", "x"), 1);
    assert_eq!(value("var x = ~0;", "x"), -1);
}

#[test]
fn test_prefix_increment_and_decrement() {
    let execution = run("var a = 5; var b = ++a; var c = --a;");
    assert_eq!(execution.value_of("a"), Some(5));
    assert_eq!(execution.value_of("b"), Some(6));
    assert_eq!(execution.value_of("c"), Some(5));
}

#[test]
fn test_operands_evaluate_left_to_right() {
    assert_eq!(value("var a = 1; var b = ++a - ++a;", "b"), -1);
}

#[test]
fn test_ternary_runs_one_branch() {
    let execution = run("var a; var b; var x = 1 ? ++a : ++b;");
    assert_eq!(execution.value_of("a"), Some(1));
    assert_eq!(execution.value_of("b"), Some(0));
    assert_eq!(execution.value_of("x"), Some(1));

    let execution = run("var a; var b; var x = 0 ? ++a : ++b;");
    assert_eq!(execution.value_of("a"), Some(0));
    assert_eq!(execution.value_of("b"), Some(1));
}

#[test]
fn test_uninitialized_variable_is_zero() {
    assert_eq!(value("var x;", "x"), 0);
}

#[test]
fn test_overflow_wraps() {
    assert_eq!(
        value("var x = 9223372036854775807 + 1;", "x"),
        i64::MIN
    );
}

#[test]
fn test_division_by_zero() {
    let result = run_with("var z; print 1 / z;", VmConfig::default());
    assert!(matches!(
        result,
        Err(Error::Runtime(RuntimeError::DivisionByZero))
    ));
}

// ============================================================
// Statements
// ============================================================

#[test]
fn test_print() {
    assert_eq!(output("print 1; print 2 + 2; print -3;"), "1\n4\n-3\n");
}

#[test]
fn test_forward_goto() {
    assert_eq!(output("goto skip; print 1; skip: print 2;"), "2\n");
}

#[test]
fn test_countdown_loop() {
    let source = "
        var n = 3;
        top:
        if n > 0 {
            print n;
            n = n - 1;
            goto top;
        }
        print 0;
    ";
    assert_eq!(output(source), "3\n2\n1\n0\n");
}

#[test]
fn test_if_else_chain() {
    let source = "
        var x = 2;
        if x == 1 {
            print 10;
        } else if x == 2 {
            print 20;
        } else {
            print 30;
        }
    ";
    assert_eq!(output(source), "20\n");
}

#[test]
fn test_block_variables_are_global() {
    assert_eq!(output("if 1 { var inner = 7; } print inner;"), "7\n");
}

#[test]
fn test_expression_statements() {
    assert_eq!(output("var i = 0; ++i; ++i; i + 100; print i;"), "2\n");
}

#[test]
fn test_empty_program() {
    let execution = run("");
    assert_eq!(execution.vm.state(), VmState::Halted);
    assert_eq!(execution.vm.steps(), 1);
}

// ============================================================
// Diagnostics
// ============================================================

#[test]
fn test_lexical_error() {
    let err = compile_err("var x = 1;\nvar y = #;");
    assert_eq!(err.kind, DiagnosticKind::Lexical);
    assert_eq!((err.start.line, err.start.column), (2, 9));
}

#[test]
fn test_syntax_errors() {
    let err = compile_err("var x = 1");
    assert_eq!(err.kind, DiagnosticKind::Syntax);

    let err = compile_err("var 1;");
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    assert!(err.message.contains("identifier"));

    let err = compile_err("if 1 print 1;");
    assert_eq!(err.message, "expected '{' to open block");
}

#[test]
fn test_duplicate_label() {
    let err = compile_err("a: a:");
    assert_eq!(err.message, "label already declared");
    assert_eq!(err.start.column, 4);
}

#[test]
fn test_undefined_names() {
    assert_eq!(compile_err("print y;").message, "variable undefined");
    assert_eq!(compile_err("goto nowhere;").message, "label undefined");
}

#[test]
fn test_increment_of_literal() {
    let err = compile_err("var x = ++1;");
    assert!(err.message.contains("lvalue"));
}

#[test]
fn test_deeply_nested_source_is_a_diagnostic() {
    let parens = format!("var x = {}1{};", "(".repeat(1000), ")".repeat(1000));
    let err = compile_err(&parens);
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    assert_eq!(err.message, "expression nested too deeply");

    let chain = format!("var x = {}; print x;", vec!["1"; 50_000].join(" + "));
    let err = compile_err(&chain);
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    assert_eq!(err.message, "expression nested too deeply");
}

#[test]
fn test_nesting_at_the_limits_runs() {
    let parens = format!(
        "var x = {}7{};",
        "(".repeat(MAX_NESTING),
        ")".repeat(MAX_NESTING)
    );
    assert_eq!(value(&parens, "x"), 7);

    let chain = format!("var x = {};", vec!["1"; MAX_EXPR_HEIGHT].join(" + "));
    assert_eq!(value(&chain, "x"), MAX_EXPR_HEIGHT as i64);
}

// ============================================================
// Images
// ============================================================

#[test]
fn test_image_round_trip_runs_identically() {
    let source = "var a = 6; var b = a * 7; print b; print a ? b : 0;";
    let mut reporter = CollectingReporter::new();
    let compilation = driver::compile("test.smol", source, &mut reporter).unwrap();

    let bytes = image::encode(&compilation.image()).unwrap();
    let decoded = image::decode(&bytes).unwrap();
    let vm = driver::run_image(&decoded, VmConfig::default(), Vec::new()).unwrap();

    assert_eq!(String::from_utf8(vm.into_output()).unwrap(), output(source));
}
