#![allow(dead_code)]

use trio::interpreter::InterpreterError;
use trio::{run_program, Dialect, Environment, Error, Value};

/// Run `source` and return what it printed.
pub fn output_of(dialect: Dialect, source: &str) -> Vec<String> {
    match run_program(dialect, source) {
        Ok(transcript) => transcript.output,
        Err(err) => panic!("program failed: {}\n{}", err, source),
    }
}

/// Run `source` and return its final environment.
pub fn env_of(dialect: Dialect, source: &str) -> Environment {
    match run_program(dialect, source) {
        Ok(transcript) => transcript.environment,
        Err(err) => panic!("program failed: {}\n{}", err, source),
    }
}

/// Run `source`, expecting it to fail.
pub fn error_of(dialect: Dialect, source: &str) -> Error {
    match run_program(dialect, source) {
        Ok(transcript) => panic!("program succeeded with output {:?}\n{}", transcript.output, source),
        Err(err) => err,
    }
}

pub fn error_kind(dialect: Dialect, source: &str) -> InterpreterError {
    error_of(dialect, source).kind
}

pub fn num(n: f64) -> Value {
    Value::Number(n)
}

pub fn numbers(items: &[f64]) -> Value {
    Value::list(items.iter().copied().map(Value::Number).collect())
}

/// Evaluate a single expression through Anna's print rule.
pub fn show(expr: &str) -> String {
    let mut output = output_of(Dialect::Anna, &format!("print {}\n", expr));
    assert_eq!(output.len(), 1, "expected exactly one printed line for {}", expr);
    output.remove(0)
}
