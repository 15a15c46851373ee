//! Integration tests for the full parse-compile-run loop.
//!
//! These tests drive complete interactive sessions through the unit
//! driver backed by the reference evaluator, verifying that definitions,
//! operator overloads, scoping, and error recovery behave across units.

use zest::backend::interp::Interp;
use zest::driver::driver::{Driver, UnitError, UnitOutcome};

fn driver() -> Driver<Interp> {
    Driver::new(Interp::new())
}

fn evaluated(outcome: &UnitOutcome) -> f64 {
    match outcome {
        UnitOutcome::Evaluated(value) => *value,
        other => panic!("expected an evaluated unit, got {:?}", other),
    }
}

#[test]
fn test_define_then_call_across_units() {
    let mut driver = driver();
    let outcomes = driver.run("def add(a b) a+b; add(2,3);");

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(&outcomes[0], UnitOutcome::Defined(name) if name == "add"));
    assert_eq!(evaluated(&outcomes[1]), 5.0);
}

#[test]
fn test_bare_var_in_expression() {
    let mut driver = driver();
    let outcomes = driver.run("var x = 1 in x+1");

    assert_eq!(evaluated(&outcomes[0]), 2.0);

    // The block has been exited; `x` no longer resolves.
    let after = driver.run("x;");
    assert!(matches!(
        &after[0],
        UnitOutcome::Failed(UnitError::Resolution(_))
    ));
}

#[test]
fn test_malformed_unit_recovery() {
    let mut driver = driver();
    let outcomes = driver.run("(1+ ; 40+2;");

    assert!(matches!(&outcomes[0], UnitOutcome::Failed(UnitError::Parse(_))));
    assert_eq!(evaluated(&outcomes[1]), 42.0);
}

#[test]
fn test_user_defined_operator_session() {
    let mut driver = driver();
    let outcomes = driver.run("binary ~ 15 (a b) a-b; 5 ~ 2;");

    assert_eq!(evaluated(&outcomes[1]), 3.0);
}

#[test]
fn test_operator_precedence_interacts_with_builtins() {
    let mut driver = driver();
    // `~` at 15 binds looser than `+` at 20: 1 + 2 ~ 3 + 4 is (1+2) ~ (3+4).
    let outcomes = driver.run("binary ~ 15 (a b) a-b; 1 + 2 ~ 3 + 4;");

    assert_eq!(evaluated(&outcomes[1]), -4.0);
}

#[test]
fn test_fibonacci_session() {
    let mut driver = driver();
    let outcomes = driver.run(
        "def fib(n) if n < 2 then n else fib(n-1) + fib(n-2);\n\
         fib(10);",
    );

    assert_eq!(evaluated(&outcomes[1]), 55.0);
}

#[test]
fn test_iterative_session_with_globals() {
    let mut driver = driver();
    let outcomes = driver.run(
        "var total = 0;\n\
         def bump(n) total + n;\n\
         total = bump(5);\n\
         total;",
    );

    assert_eq!(evaluated(&outcomes[3]), 5.0);
}

#[test]
fn test_loop_expression_session() {
    let mut driver = driver();
    // The loop is an expression and evaluates to 0; the side effects go
    // through an extern.
    let outcomes = driver.run("extern putchard(c); for i = 65, i < 70 in putchard(i);");

    assert_eq!(evaluated(&outcomes[1]), 0.0);
}

#[test]
fn test_block_bodied_function_session() {
    let mut driver = driver();
    let outcomes = driver.run(
        "def clamp(x lo hi) {\n\
             if x < lo { return lo; }\n\
             if hi < x { return hi; }\n\
             return x;\n\
         }\n\
         clamp(5, 1, 3); clamp(0, 1, 3); clamp(2, 1, 3);",
    );

    assert_eq!(evaluated(&outcomes[1]), 3.0);
    assert_eq!(evaluated(&outcomes[2]), 1.0);
    assert_eq!(evaluated(&outcomes[3]), 2.0);
}

#[test]
fn test_shadowing_session() {
    let mut driver = driver();
    let outcomes = driver.run(
        "var x = 10;\n\
         def peek() x;\n\
         var x = 1 in x + peek();",
    );

    // Inside the binding `x` is 1, while the function body still reads
    // the global.
    assert_eq!(evaluated(&outcomes[2]), 11.0);
}

#[test]
fn test_comments_are_skipped() {
    let mut driver = driver();
    let outcomes = driver.run("# a comment line\n1 + 1; # trailing comment");

    assert_eq!(outcomes.len(), 1);
    assert_eq!(evaluated(&outcomes[0]), 2.0);
}

#[test]
fn test_session_survives_many_error_kinds() {
    let mut driver = driver();

    let outcomes = driver.run("def broken(a) a + b;");
    assert!(matches!(&outcomes[0], UnitOutcome::Failed(UnitError::Resolution(_))));

    let outcomes = driver.run("missing(1);");
    assert!(matches!(&outcomes[0], UnitOutcome::Failed(UnitError::Resolution(_))));

    let outcomes = driver.run("def binary% 200 (a b) a;");
    assert!(matches!(&outcomes[0], UnitOutcome::Failed(UnitError::Parse(_))));

    let outcomes = driver.run("2 + 2;");
    assert_eq!(evaluated(&outcomes[0]), 4.0);
}
