//! The three line-oriented dialects and their classification rules.
//!
//! | Dialect | Rules, tried in order |
//! |---------|-----------------------|
//! | Anna    | `name := expr`, `print expr`, bare expression |
//! | Alex    | `set name = expr`, `print expr`, statement, bare expression |
//! | Rosa    | `fact text`, `name := expr`, lenient `print expr`, silent bare expression |
//!
//! Blank lines and `#` comment lines are skipped for every dialect.

use std::fmt;
use std::rc::Rc;

use crate::diagnostic::Span;
use crate::interpreter::error::{EvalError, InterpreterError, ParseError};
use crate::interpreter::parser::{self, LogicalLine};
use crate::interpreter::{Environment, Interpreter};
use crate::value::Value;

/// Reserved Rosa binding holding the fact set as a list of strings.
pub const FACTS_BINDING: &str = "facts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Dialect {
    Anna,
    Alex,
    Rosa,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Anna, Dialect::Alex, Dialect::Rosa];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Anna => "anna",
            Dialect::Alex => "alex",
            Dialect::Rosa => "rosa",
        }
    }

    pub fn prompt(self) -> String {
        format!("{}> ", self.name())
    }

    pub fn banner(self) -> &'static str {
        match self {
            Dialect::Anna => "Anna REPL - :help for commands. Use `name := expr` and `print expr`.",
            Dialect::Alex => {
                "Alex REPL - :help for commands. Use `set name = expr`, `print expr`. Statements like `while`, `if` and `def` work too."
            }
            Dialect::Rosa => "Rosa REPL - :help for commands. `fact <text>` records a fact. `print <expr>` prints.",
        }
    }

    pub fn syntax(self) -> &'static str {
        match self {
            Dialect::Anna => "Anna syntax: name := expr  |  print expr",
            Dialect::Alex => "Alex syntax: set name = expr  |  print expr  |  if / while / for / def statements",
            Dialect::Rosa => "Rosa syntax: fact some_text  |  name := expr  |  print expr",
        }
    }

    pub fn example(self) -> &'static str {
        match self {
            Dialect::Anna => "Example:\n  message := \"Hello from Anna!\"\n  print message",
            Dialect::Alex => "Example:\n  set add = lambda x, y: x + y\n  set total = add(2, 3)\n  print total",
            Dialect::Rosa => "Example:\n  fact sky_is_blue\n  print \"Hello from Rosa!\"\n  :env",
        }
    }

    /// A fresh environment with this dialect's seed bindings.
    pub fn new_environment(self) -> Environment {
        let env = Environment::new();
        if self == Dialect::Rosa {
            env.define(FACTS_BINDING, Value::list(Vec::new()));
        }
        env
    }

    /// Split source into the lines this dialect dispatches. Alex nests
    /// indented blocks under their headers; the others are flat.
    pub fn logical_lines(self, source: &str) -> Result<Vec<LogicalLine>, ParseError> {
        match self {
            Dialect::Alex => group_lines(source),
            Dialect::Anna | Dialect::Rosa => Ok(source_lines(source)
                .map(|(number, raw)| LogicalLine::new(number, raw))
                .collect()),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anna" => Ok(Dialect::Anna),
            "alex" => Ok(Dialect::Alex),
            "rosa" => Ok(Dialect::Rosa),
            _ => Err(format!("Unknown dialect: {}. Must be 'anna', 'alex' or 'rosa'", s)),
        }
    }
}

pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Numbered (1-based) lines that are neither blank nor comments.
fn source_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| (i + 1, raw))
        .filter(|(_, raw)| !is_skippable(raw))
}

fn first_word(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}

/// Group Alex source by indentation: lines indented deeper than the line
/// above become its body, and `elif`/`else` lines attach to the `if` before
/// them.
pub fn group_lines(source: &str) -> Result<Vec<LogicalLine>, ParseError> {
    let lines: Vec<LogicalLine> = source_lines(source)
        .map(|(number, raw)| LogicalLine::new(number, raw))
        .collect();
    let mut pos = 0;
    let base = lines.first().map_or(0, |line| line.indent);
    let grouped = group_level(&lines, &mut pos, base)?;

    if let Some(stray) = lines.get(pos) {
        return Err(indentation_error("unindent does not match any outer indentation level", stray));
    }
    Ok(grouped)
}

fn group_level(lines: &[LogicalLine], pos: &mut usize, indent: usize) -> Result<Vec<LogicalLine>, ParseError> {
    let mut grouped: Vec<LogicalLine> = Vec::new();

    while let Some(line) = lines.get(*pos) {
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(indentation_error("unexpected indentation", line));
        }
        *pos += 1;

        let mut line = line.clone();
        if let Some(next) = lines.get(*pos) {
            if next.indent > indent {
                line.body = group_level(lines, pos, next.indent)?;
            }
        }

        match first_word(&line.text) {
            "elif" | "else" => match grouped.last_mut() {
                Some(previous) if accepts_alternative(previous) => previous.alternatives.push(line),
                _ => return Err(indentation_error("`elif`/`else` without a matching `if`", &line)),
            },
            _ => grouped.push(line),
        }
    }

    Ok(grouped)
}

fn accepts_alternative(line: &LogicalLine) -> bool {
    first_word(&line.text) == "if"
        && line
            .alternatives
            .last()
            .map_or(true, |alt| first_word(&alt.text) != "else")
}

fn indentation_error(message: &str, line: &LogicalLine) -> ParseError {
    ParseError::new(message, Span::new(0, line.text.len()))
        .offset_by(line.offset)
        .at_line(line.number)
}

/// `text` minus a leading keyword, when the keyword stands alone as a word.
/// Returns the remainder and its byte offset within `text`.
fn strip_keyword<'t>(text: &'t str, keyword: &str) -> Option<(&'t str, usize)> {
    let rest = text.strip_prefix(keyword)?;
    if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let trimmed = rest.trim_start();
    Some((trimmed, text.len() - trimmed.len()))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `name := expr` split at the first `:=`, provided the left side is a name.
fn split_binding(text: &str) -> Option<(&str, &str, usize)> {
    let at = text.find(":=")?;
    let name = text[..at].trim();
    if !is_identifier(name) {
        return None;
    }
    let rest = &text[at + 2..];
    let expr = rest.trim_start();
    Some((name, expr, text.len() - expr.len()))
}

fn evaluate_at(
    interp: &mut Interpreter,
    source: &str,
    offset: usize,
    env: &Environment,
) -> Result<Value, InterpreterError> {
    let expr = parser::parse_expression(source).map_err(|err| err.offset_by(offset))?;
    interp.evaluate(&expr, env)
}

/// Run one logical line under `dialect`'s rules. Spans in returned parse
/// errors are relative to the trimmed line text unless the error names a
/// nested line.
pub fn dispatch(
    dialect: Dialect,
    line: &LogicalLine,
    interp: &mut Interpreter,
    env: &Environment,
) -> Result<(), InterpreterError> {
    match dialect {
        Dialect::Anna => dispatch_anna(line, interp, env),
        Dialect::Alex => dispatch_alex(line, interp, env),
        Dialect::Rosa => dispatch_rosa(line, interp, env),
    }
}

fn print_rule(
    text: &str,
    interp: &mut Interpreter,
    env: &Environment,
) -> Option<Result<(), InterpreterError>> {
    let (expr, offset) = strip_keyword(text, "print")?;
    if expr.starts_with('=') && !expr.starts_with("==") {
        return None;
    }
    Some(evaluate_at(interp, expr, offset, env).map(|value| interp.emit(value.to_string())))
}

fn dispatch_anna(line: &LogicalLine, interp: &mut Interpreter, env: &Environment) -> Result<(), InterpreterError> {
    let text = line.text.as_str();

    if let Some((name, expr, offset)) = split_binding(text) {
        tracing::debug!(line = line.number, rule = "bind", name, "anna");
        let value = evaluate_at(interp, expr, offset, env)?;
        env.assign(name, value);
        return Ok(());
    }

    if let Some(result) = print_rule(text, interp, env) {
        tracing::debug!(line = line.number, rule = "print", "anna");
        return result;
    }

    tracing::debug!(line = line.number, rule = "expr", "anna");
    evaluate_at(interp, text, 0, env).map(drop)
}

fn dispatch_alex(line: &LogicalLine, interp: &mut Interpreter, env: &Environment) -> Result<(), InterpreterError> {
    let text = line.text.as_str();

    if !line.has_block() {
        if let Some((rest, offset)) = strip_keyword(text, "set") {
            if let Some(at) = rest.find('=').filter(|&at| !rest[at + 1..].starts_with('=')) {
                tracing::debug!(line = line.number, rule = "set", "alex");
                let name = rest[..at].trim();
                if !is_identifier(name) {
                    return Err(ParseError::new("expected a name after `set`", Span::new(offset, offset + at))
                        .with_expected(vec!["identifier".to_string()])
                        .into());
                }
                let expr = rest[at + 1..].trim_start();
                let value = evaluate_at(interp, expr, text.len() - expr.len(), env)?;
                env.assign(name, value);
                return Ok(());
            }
        }

        if let Some(result) = print_rule(text, interp, env) {
            tracing::debug!(line = line.number, rule = "print", "alex");
            return result;
        }
    }

    match parser::parse_statement(line) {
        Ok(stmt) => {
            tracing::debug!(line = line.number, rule = "statement", kind = stmt.kind_name(), "alex");
            interp.execute_top_level(&stmt, env)
        }
        Err(stmt_err) if !line.has_block() => match parser::parse_expression(text) {
            Ok(expr) => {
                tracing::debug!(line = line.number, rule = "expr", "alex");
                interp.evaluate(&expr, env).map(drop)
            }
            Err(_) => Err(stmt_err.into()),
        },
        Err(stmt_err) => Err(stmt_err.into()),
    }
}

fn dispatch_rosa(line: &LogicalLine, interp: &mut Interpreter, env: &Environment) -> Result<(), InterpreterError> {
    let text = line.text.as_str();

    if let Some((fact, _)) = strip_keyword(text, "fact").filter(|(fact, _)| !fact.is_empty()) {
        tracing::debug!(line = line.number, rule = "fact", fact, "rosa");
        return record_fact(env, fact);
    }

    if let Some((name, expr, offset)) = split_binding(text) {
        tracing::debug!(line = line.number, rule = "bind", name, "rosa");
        let value = evaluate_at(interp, expr, offset, env)?;
        env.assign(name, value);
        return Ok(());
    }

    if let Some((expr, offset)) = strip_keyword(text, "print") {
        tracing::debug!(line = line.number, rule = "print", "rosa");
        let shown = match evaluate_at(interp, expr, offset, env) {
            Ok(value) => value.to_string(),
            Err(err) if err.is_budget() => return Err(err),
            Err(err) => {
                tracing::debug!(line = line.number, error = %err, "printing raw text");
                expr.to_string()
            }
        };
        interp.emit(shown);
        return Ok(());
    }

    tracing::debug!(line = line.number, rule = "expr", "rosa");
    match evaluate_at(interp, text, 0, env) {
        Err(err) if err.is_budget() => Err(err),
        Err(err) => {
            tracing::debug!(line = line.number, error = %err, "ignored");
            Ok(())
        }
        Ok(_) => Ok(()),
    }
}

/// Add `fact` to the fact set unless it is already there.
fn record_fact(env: &Environment, fact: &str) -> Result<(), InterpreterError> {
    let mut facts = match env.get(FACTS_BINDING) {
        None => Rc::new(Vec::new()),
        Some(Value::List(items)) => items,
        Some(other) => {
            return Err(EvalError::type_mismatch(format!(
                "`{}` holds a {}, not a list",
                FACTS_BINDING,
                other.type_name()
            ))
            .into())
        }
    };

    if facts.iter().any(|existing| existing.as_string() == Some(fact)) {
        return Ok(());
    }
    // Release the scope's handle so the push below happens in place.
    env.assign(FACTS_BINDING, Value::None);
    Rc::make_mut(&mut facts).push(Value::string(fact));
    env.assign(FACTS_BINDING, Value::List(facts));
    Ok(())
}

/// Facts recorded in `env`, in insertion order.
pub fn facts(env: &Environment) -> Vec<String> {
    env.get(FACTS_BINDING)
        .and_then(|value| {
            value
                .as_list()
                .map(|items| items.iter().filter_map(|item| item.as_string().map(str::to_string)).collect())
        })
        .unwrap_or_default()
}
