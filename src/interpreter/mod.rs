pub mod budget;
pub mod builtins;
pub mod control_flow;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use budget::{BudgetMeter, ExecutionBudget};
pub use control_flow::ControlFlow;
pub use environment::Environment;
pub use error::{Error, EvalError, ExecError, InterpreterError, ParseError};
pub use evaluator::{evaluate, Interpreter};
pub use parser::{parse_expression, parse_statement, LogicalLine, TokenParser};
