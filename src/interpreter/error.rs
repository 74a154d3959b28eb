use thiserror::Error;

use crate::diagnostic::{line_start, Diagnostic, Label, Span};

/// Malformed expression or statement syntax.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", self.describe())]
pub struct ParseError {
    pub message: String,
    /// Byte range inside the parsed line.
    pub span: Span,
    /// Set when the error belongs to a nested line of an indented block.
    pub line: Option<usize>,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            line: None,
            expected: Vec::new(),
            found: None,
        }
    }

    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    /// Attach a source line unless a nested block already set one.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }

    /// Re-anchor the span when the parsed text was a slice of a longer line.
    pub fn offset_by(mut self, offset: usize) -> Self {
        self.span = self.span.shift(offset);
        self
    }

    fn describe(&self) -> String {
        if self.expected.is_empty() {
            return self.message.clone();
        }
        let mut msg = format!("expected {}", self.expected.join(" or "));
        if let Some(found) = &self.found {
            msg.push_str(&format!(", found {}", found));
        }
        msg
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.describe())
            .with_code("E0101")
            .with_label(Label::primary(self.span, ""));

        if self.expected.len() == 1 {
            diag = diag.with_help(format!("expected {} here", self.expected[0]));
        }

        diag
    }
}

/// Failures while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined name `{0}`")]
    UndefinedName(String),
    #[error("value of type {0} is not callable")]
    NotCallable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of range for length {length}")]
    IndexOutOfRange { index: i64, length: usize },
    #[error("{name}: {message}")]
    BuiltinFailure { name: String, message: String },
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

impl EvalError {
    pub fn builtin(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BuiltinFailure {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    fn code(&self) -> &'static str {
        match self {
            Self::UndefinedName(_) => "E0201",
            Self::NotCallable(_) => "E0202",
            Self::DivisionByZero => "E0203",
            Self::IndexOutOfRange { .. } => "E0204",
            Self::BuiltinFailure { .. } => "E0205",
            Self::TypeMismatch(_) => "E0206",
        }
    }
}

/// Failures raised by the statement interpreter and the execution budget.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("`return` outside of a function")]
    ReturnOutsideFunction,
    #[error("`break` or `continue` outside of a loop")]
    BreakOutsideLoop,
    #[error("{name} expects {expected} argument(s), got {found}")]
    ArityMismatch { name: String, expected: String, found: usize },
    #[error("execution budget of {0} steps exhausted")]
    BudgetExhausted(u64),
    #[error("execution timed out after {0} ms")]
    Timeout(u128),
    #[error("execution cancelled")]
    Cancelled,
    #[error("maximum call depth of {0} exceeded")]
    RecursionLimit(usize),
}

impl ExecError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReturnOutsideFunction => "E0301",
            Self::BreakOutsideLoop => "E0302",
            Self::ArityMismatch { .. } => "E0303",
            Self::BudgetExhausted(_) => "E0304",
            Self::Timeout(_) => "E0305",
            Self::Cancelled => "E0306",
            Self::RecursionLimit(_) => "E0307",
        }
    }

    /// Budget outcomes come from the host, not from the script.
    pub fn is_budget(&self) -> bool {
        matches!(self, Self::BudgetExhausted(_) | Self::Timeout(_) | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpreterError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("exec error: {0}")]
    Exec(#[from] ExecError),
}

impl InterpreterError {
    pub fn is_budget(&self) -> bool {
        matches!(self, Self::Exec(err) if err.is_budget())
    }

    /// Convert to a diagnostic; `line_span` marks the failing line for
    /// errors that carry no span of their own.
    pub fn to_diagnostic(&self, line_span: Span) -> Diagnostic {
        match self {
            Self::Parse(err) => err.to_diagnostic(),
            Self::Eval(err) => Diagnostic::error(err.to_string())
                .with_code(err.code())
                .with_label(Label::primary(line_span, "while evaluating this line")),
            Self::Exec(err) => {
                let diag = Diagnostic::error(err.to_string())
                    .with_code(err.code())
                    .with_label(Label::primary(line_span, "while executing this line"));
                if err.is_budget() {
                    diag.with_note("raise the limit with --max-steps or --timeout-ms")
                } else {
                    diag
                }
            }
        }
    }
}

/// An interpreter error tagged with the 1-based source line it came from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind}")]
pub struct Error {
    pub line: usize,
    #[source]
    pub kind: InterpreterError,
}

impl Error {
    pub fn new(line: usize, kind: InterpreterError) -> Self {
        Self { line, kind }
    }

    /// Diagnostic with spans placed in the full program text `source`.
    pub fn to_diagnostic(&self, source: &str) -> Diagnostic {
        let start = line_start(source, self.line);
        let raw_line = source[start..].lines().next().unwrap_or("");
        let line_span = Span::new(start, start + raw_line.len());

        let mut diagnostic = self.kind.to_diagnostic(line_span);
        if let InterpreterError::Parse(_) = self.kind {
            for label in &mut diagnostic.labels {
                label.span = label.span.shift(start);
            }
        }
        diagnostic
    }
}
