pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod dialect;
pub mod format;
pub mod interpreter;
pub mod lexer;
pub mod repl;
pub mod session;
pub mod token;
pub mod value;

pub use ast::{Expr, ExprKind, Stmt};
pub use dialect::Dialect;
pub use interpreter::{Environment, Error, ExecutionBudget};
pub use session::{run_interactive_line, run_program, Session, Transcript};
pub use token::Token;
pub use value::Value;
