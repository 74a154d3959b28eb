//! Sessions and the interactive loop.

mod common;

use std::io::Cursor;

use common::*;
use trio::interpreter::{EvalError, ExecError, ExecutionBudget};
use trio::repl::Repl;
use trio::{run_interactive_line, run_program, Dialect, Session, Value};

fn repl_transcript(dialect: Dialect, input: &str) -> String {
    let mut out = Vec::new();
    Repl::new(Session::new(dialect), Cursor::new(input.to_string()), &mut out)
        .run()
        .unwrap();
    String::from_utf8(out).unwrap()
}

// =============================================================================
// SESSION API
// =============================================================================

#[test]
fn test_interactive_lines_share_environment() {
    let first = run_interactive_line(Dialect::Anna, "x := 5", Dialect::Anna.new_environment()).unwrap();
    let second = run_interactive_line(Dialect::Anna, "print x + 1", first.environment).unwrap();
    assert_eq!(second.output, vec!["6"]);
}

#[test]
fn test_failed_line_rolls_back() {
    let mut session = Session::new(Dialect::Anna);
    session.run_interactive_line("x := 1").unwrap();
    let err = session.run_interactive_line("x := missing").unwrap_err();
    assert_eq!(err.kind, EvalError::UndefinedName("missing".to_string()).into());
    assert_eq!(session.environment().get("x"), Some(num(1.0)));
}

#[test]
fn test_failed_block_rolls_back_every_binding() {
    let mut session = Session::new(Dialect::Alex);
    session.run_interactive_line("total = 0").unwrap();
    assert!(session
        .run_interactive_line("for n in [1, 2, \"three\"]: total = total + n")
        .is_err());
    assert_eq!(session.environment().get("total"), Some(num(0.0)));
    assert!(!session.environment().contains("n"));
}

#[test]
fn test_blank_and_comment_lines_are_no_ops() {
    let mut session = Session::new(Dialect::Rosa);
    session.run_interactive_line("").unwrap();
    session.run_interactive_line("   # nothing").unwrap();
    assert_eq!(session.bindings().len(), 1);
}

#[test]
fn test_run_program_accumulates_into_session() {
    let mut session = Session::new(Dialect::Anna);
    session.run_program("a := 1\n").unwrap();
    session.run_program("b := a + 1\n").unwrap();
    assert_eq!(session.environment().get("b"), Some(num(2.0)));
}

#[test]
fn test_program_budget_covers_whole_run() {
    let budget = ExecutionBudget::default().with_max_steps(50);
    let mut session = Session::with_budget(Dialect::Alex, budget);
    let source = "for i in range(10): pass\nfor i in range(10): pass\nfor i in range(10): pass\n";
    let err = session.run_program(source).unwrap_err();
    assert_eq!(err.kind, ExecError::BudgetExhausted(50).into());
    assert_eq!(err.line, 3);
}

#[test]
fn test_bindings_are_in_definition_order() {
    let transcript = run_program(Dialect::Anna, "b := 2\na := 1\nb := 3\n").unwrap();
    let bindings = transcript.environment.bindings();
    let names: Vec<&str> = bindings.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
    assert_eq!(bindings[0].1, Value::Number(3.0));
}

// =============================================================================
// INTERACTIVE LOOP
// =============================================================================

#[test]
fn test_repl_banner_prompt_and_output() {
    let out = repl_transcript(Dialect::Anna, "x := 5\nprint x + 1\n:q\n");
    assert!(out.starts_with("Anna REPL"));
    assert!(out.contains("anna> anna> 6\nanna> "));
}

#[test]
fn test_repl_help_lists_commands() {
    let out = repl_transcript(Dialect::Alex, ":help\n");
    assert!(out.contains("Commands: :help, :examples, :env, :load <file>, :reset, :quit"));
    assert!(out.contains(Dialect::Alex.syntax()));
}

#[test]
fn test_repl_examples_run() {
    for dialect in Dialect::ALL {
        let example: String = dialect
            .example()
            .lines()
            .skip(1)
            .map(|line| format!("{}\n", line.trim()))
            .filter(|line| !line.starts_with(':'))
            .collect();
        let out = repl_transcript(dialect, &example);
        assert!(!out.contains("Error:"), "{} example failed:\n{}", dialect, out);
    }
}

#[test]
fn test_repl_reports_errors_and_continues() {
    let out = repl_transcript(Dialect::Alex, "set x = 1 / 0\nprint \"after\"\n");
    assert!(out.contains("Error: eval error: division by zero"));
    assert!(out.contains("after\n"));
}

#[test]
fn test_repl_load_runs_file_into_environment() {
    let path = std::env::temp_dir().join(format!("trio-load-{}.anna", std::process::id()));
    std::fs::write(&path, "loaded := 41\nprint \"loading\"\n").unwrap();

    let input = format!(":load {}\nprint loaded + 1\n", path.display());
    let out = repl_transcript(Dialect::Anna, &input);
    std::fs::remove_file(&path).ok();

    assert!(out.contains("loading\n"));
    assert!(out.contains(&format!("Loaded {}", path.display())));
    assert!(out.contains("42\n"));
}

#[test]
fn test_repl_load_reports_program_errors() {
    let path = std::env::temp_dir().join(format!("trio-bad-{}.anna", std::process::id()));
    std::fs::write(&path, "print nope\n").unwrap();

    let out = repl_transcript(Dialect::Anna, &format!(":load {}\n", path.display()));
    std::fs::remove_file(&path).ok();

    assert!(out.contains("Load error: line 1: eval error: undefined name `nope`"));
}

#[test]
fn test_repl_rosa_facts_and_reset() {
    let out = repl_transcript(Dialect::Rosa, "fact a\nfact a\n:facts\n:reset\n:facts\n");
    assert!(out.contains("[\"a\"]\n"));
    assert!(out.contains("reset\n"));
    assert!(out.contains("rosa> []\n"));
}

#[test]
fn test_repl_eof_ends_with_newline() {
    let out = repl_transcript(Dialect::Rosa, "");
    assert!(out.ends_with("rosa> \n"));
}
