//! Sessions own one environment across program runs and REPL lines.

use crate::dialect::{self, is_skippable, Dialect};
use crate::interpreter::error::{Error, InterpreterError};
use crate::interpreter::parser::LogicalLine;
use crate::interpreter::{Environment, ExecutionBudget, Interpreter};
use crate::value::Value;

#[derive(Debug)]
pub struct Session {
    dialect: Dialect,
    env: Environment,
    interpreter: Interpreter,
}

impl Session {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_budget(dialect, ExecutionBudget::default())
    }

    pub fn with_budget(dialect: Dialect, budget: ExecutionBudget) -> Self {
        Self {
            dialect,
            env: dialect.new_environment(),
            interpreter: Interpreter::new(budget),
        }
    }

    /// Continue from an existing environment instead of a fresh one.
    pub fn with_environment(dialect: Dialect, env: Environment, budget: ExecutionBudget) -> Self {
        Self {
            dialect,
            env,
            interpreter: Interpreter::new(budget),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Read-only view of the current bindings.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn into_environment(self) -> Environment {
        self.env
    }

    pub fn bindings(&self) -> Vec<(String, Value)> {
        self.env.bindings()
    }

    pub fn facts(&self) -> Vec<String> {
        dialect::facts(&self.env)
    }

    pub fn budget(&self) -> &ExecutionBudget {
        self.interpreter.budget()
    }

    /// Lines printed since the last call.
    pub fn take_output(&mut self) -> Vec<String> {
        self.interpreter.take_output()
    }

    /// Drop every binding and start over with the dialect's seed environment.
    pub fn reset(&mut self) {
        tracing::debug!(dialect = %self.dialect, "session reset");
        self.env.clear();
        self.env = self.dialect.new_environment();
    }

    /// Run a whole program against this session's environment, stopping at
    /// the first failing line.
    #[tracing::instrument(level = "debug", skip_all, fields(dialect = %self.dialect))]
    pub fn run_program(&mut self, source: &str) -> Result<&Environment, Error> {
        self.interpreter.begin_run();
        let lines = self
            .dialect
            .logical_lines(source)
            .map_err(|err| locate(InterpreterError::Parse(err), 1))?;

        for line in &lines {
            tracing::debug!(line = line.number, text = %line.text, "dispatch");
            dialect::dispatch(self.dialect, line, &mut self.interpreter, &self.env)
                .map_err(|err| locate(shift(err, line), line.number))?;
        }

        tracing::debug!(steps = self.interpreter.steps(), "program finished");
        Ok(&self.env)
    }

    /// Apply one REPL line. On failure the environment is left exactly as it
    /// was before the line ran.
    #[tracing::instrument(level = "debug", skip_all, fields(dialect = %self.dialect))]
    pub fn run_interactive_line(&mut self, input: &str) -> Result<&Environment, Error> {
        if is_skippable(input) {
            return Ok(&self.env);
        }

        self.interpreter.begin_run();
        let line = LogicalLine::new(1, input);
        let saved = self.env.snapshot();

        if let Err(err) = dialect::dispatch(self.dialect, &line, &mut self.interpreter, &self.env) {
            tracing::debug!(error = %err, "line failed, restoring environment");
            self.env.restore(saved);
            return Err(locate(shift(err, &line), 1));
        }
        Ok(&self.env)
    }
}

/// Make parse spans relative to the untrimmed source line.
fn shift(err: InterpreterError, line: &LogicalLine) -> InterpreterError {
    match err {
        InterpreterError::Parse(parse) if parse.line.is_none() => {
            InterpreterError::Parse(parse.offset_by(line.offset).at_line(line.number))
        }
        other => other,
    }
}

fn locate(kind: InterpreterError, fallback: usize) -> Error {
    let line = match &kind {
        InterpreterError::Parse(parse) => parse.line.unwrap_or(fallback),
        _ => fallback,
    };
    Error::new(line, kind)
}

/// Final environment and printed lines of a finished run.
#[derive(Debug)]
pub struct Transcript {
    pub environment: Environment,
    pub output: Vec<String>,
}

/// Run `source` in a fresh environment with the default budget.
pub fn run_program(dialect: Dialect, source: &str) -> Result<Transcript, Error> {
    let mut session = Session::new(dialect);
    session.run_program(source)?;
    let output = session.take_output();
    Ok(Transcript {
        environment: session.into_environment(),
        output,
    })
}

/// Apply one interactive line to `env`. The environment handed back is the
/// same one, mutated by the line.
pub fn run_interactive_line(dialect: Dialect, line: &str, env: Environment) -> Result<Transcript, Error> {
    let mut session = Session::with_environment(dialect, env, ExecutionBudget::default());
    session.run_interactive_line(line)?;
    let output = session.take_output();
    Ok(Transcript {
        environment: session.into_environment(),
        output,
    })
}
