//! The builtin registry as seen from scripts.

mod common;

use common::*;
use trio::interpreter::builtins::{lookup, registry};
use trio::interpreter::{evaluate, EvalError, ExecError, InterpreterError};
use trio::{Dialect, Environment, Value};

fn eval(source: &str) -> Result<Value, InterpreterError> {
    evaluate(source, &Environment::new())
}

fn eval_number(source: &str) -> f64 {
    match eval(source) {
        Ok(Value::Number(n)) => n,
        other => panic!("{} gave {:?}", source, other),
    }
}

fn is_builtin_failure(result: Result<Value, InterpreterError>, name: &str) -> bool {
    matches!(result, Err(InterpreterError::Eval(EvalError::BuiltinFailure { name: ref failed, .. })) if failed == name)
}

#[test]
fn test_registry_contents() {
    let names: Vec<&str> = registry().iter().map(|builtin| builtin.name).collect();
    for expected in [
        "len", "range", "abs", "min", "max", "floor", "ceil", "sqrt", "exp", "log", "sin", "cos", "tan", "sigmoid",
        "mean", "dot", "rand",
    ] {
        assert!(names.contains(&expected), "missing builtin {}", expected);
    }
    assert!(lookup("open").is_none());
    assert!(lookup("eval").is_none());
}

#[test]
fn test_log_domain() {
    assert!(is_builtin_failure(eval("log(-1)"), "log"));
    assert!(is_builtin_failure(eval("log(0)"), "log"));
    assert!(is_builtin_failure(eval("log(8, 1)"), "log"));
    assert!((eval_number("log(8, 2)") - 3.0).abs() < 1e-12);
    assert_eq!(eval_number("log(1)"), 0.0);
}

#[test]
fn test_sqrt_and_exp() {
    assert_eq!(eval_number("sqrt(16)"), 4.0);
    assert!(is_builtin_failure(eval("sqrt(-4)"), "sqrt"));
    assert_eq!(eval_number("exp(0)"), 1.0);
    assert!(is_builtin_failure(eval("exp(1000)"), "exp"));
}

#[test]
fn test_math_constants() {
    assert_eq!(eval_number("pi"), std::f64::consts::PI);
    assert!((eval_number("log(e)") - 1.0).abs() < 1e-12);
    assert!((eval_number("cos(tau)") - 1.0).abs() < 1e-12);

    let env = env_of(Dialect::Anna, "e := 2\n");
    assert_eq!(evaluate("e + 1", &env), Ok(num(3.0)));
    assert!(!env_of(Dialect::Anna, "x := pi\n").contains("pi"));
}

#[test]
fn test_non_finite_arguments_fail() {
    let huge = "9".repeat(400);
    let env = env_of(Dialect::Anna, &format!("big := {huge}\nnan := big - big\n"));
    assert_eq!(env.get("big"), Some(num(f64::INFINITY)));

    for source in ["log(nan)", "sqrt(nan)", "log(big)", "sqrt(big)", "floor(nan)", "log(8, nan)"] {
        let name = &source[..source.find('(').unwrap()];
        assert!(is_builtin_failure(evaluate(source, &env), name), "{} should fail", source);
    }
    assert!(is_builtin_failure(evaluate("mean([1, nan])", &env), "mean"));
    assert!(is_builtin_failure(evaluate("max(1, big)", &env), "max"));
}

#[test]
fn test_rounding_and_trig() {
    assert_eq!(eval_number("floor(-2.5)"), -3.0);
    assert_eq!(eval_number("ceil(2.1)"), 3.0);
    assert_eq!(eval_number("abs(-7)"), 7.0);
    assert_eq!(eval_number("sin(0)"), 0.0);
    assert_eq!(eval_number("cos(0)"), 1.0);
    assert_eq!(eval_number("tan(0)"), 0.0);
}

#[test]
fn test_sigmoid() {
    assert_eq!(eval_number("sigmoid(0)"), 0.5);
    assert!(eval_number("sigmoid(-1000)") >= 0.0);
    assert!(eval_number("sigmoid(1000)") <= 1.0);
}

#[test]
fn test_rand_in_unit_interval() {
    for _ in 0..20 {
        let n = eval_number("rand()");
        assert!((0.0..1.0).contains(&n));
    }
}

#[test]
fn test_range_forms() {
    assert_eq!(eval("range(4)"), Ok(numbers(&[0.0, 1.0, 2.0, 3.0])));
    assert_eq!(eval("range(2, 5)"), Ok(numbers(&[2.0, 3.0, 4.0])));
    assert_eq!(eval("range(10, 0, -3)"), Ok(numbers(&[10.0, 7.0, 4.0, 1.0])));
    assert_eq!(eval("range(-2)"), Ok(numbers(&[])));
    assert!(is_builtin_failure(eval("range(0, 5, 0)"), "range"));
}

#[test]
fn test_min_max() {
    assert_eq!(eval_number("min([4, 2, 8])"), 2.0);
    assert_eq!(eval_number("max(4, 2, 8)"), 8.0);
    assert!(is_builtin_failure(eval("max([])"), "max"));
    assert!(matches!(eval("min([1, \"a\"])"), Err(InterpreterError::Eval(EvalError::TypeMismatch(_)))));
}

#[test]
fn test_mean_and_dot() {
    assert_eq!(eval_number("mean([1, 2, 3, 4])"), 2.5);
    assert_eq!(eval_number("mean([])"), 0.0);
    assert_eq!(eval_number("dot([1, 2, 3], [4, 5, 6])"), 32.0);
    assert!(is_builtin_failure(eval("dot([1], [1, 2])"), "dot"));
}

#[test]
fn test_len() {
    assert_eq!(eval_number("len([1, 2, 3])"), 3.0);
    assert_eq!(eval_number("len(\"\")"), 0.0);
    assert!(matches!(eval("len(3)"), Err(InterpreterError::Eval(EvalError::TypeMismatch(_)))));
}

#[test]
fn test_wrong_argument_count() {
    assert!(matches!(
        eval("abs()"),
        Err(InterpreterError::Exec(ExecError::ArityMismatch { found: 0, .. }))
    ));
    assert!(matches!(
        eval("range(1, 2, 3, 4)"),
        Err(InterpreterError::Exec(ExecError::ArityMismatch { found: 4, .. }))
    ));
}

#[test]
fn test_builtins_are_first_class() {
    let source = "set apply = lambda f, x: f(x)\nprint apply(sqrt, 81)\n";
    assert_eq!(output_of(Dialect::Alex, source), vec!["9"]);
}

#[test]
fn test_shadowing_is_per_session() {
    let shadowed = env_of(Dialect::Anna, "len := 3\n");
    assert_eq!(shadowed.get("len"), Some(num(3.0)));
    assert_eq!(output_of(Dialect::Anna, "print len([1])\n"), vec!["1"]);
}
