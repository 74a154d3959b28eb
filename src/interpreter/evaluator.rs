use std::cmp::Ordering;
use std::rc::Rc;

use super::budget::{BudgetMeter, ExecutionBudget};
use super::builtins;
use super::control_flow::ControlFlow;
use super::environment::Environment;
use super::error::{EvalError, ExecError, InterpreterError};
use super::parser;
use crate::ast::{BinaryOp, Expr, ExprKind, Stmt, UnaryOp};
use crate::value::{Callable, Closure, ClosureBody, Value};

/// Evaluates expressions and executes Alex statements against an
/// [`Environment`], collecting printed lines and charging every step to the
/// execution budget.
#[derive(Debug)]
pub struct Interpreter {
    meter: BudgetMeter,
    output: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(ExecutionBudget::default())
    }
}

impl Interpreter {
    pub fn new(budget: ExecutionBudget) -> Self {
        Self {
            meter: BudgetMeter::new(budget),
            output: Vec::new(),
        }
    }

    pub fn budget(&self) -> &ExecutionBudget {
        self.meter.budget()
    }

    /// Restart step counting and the clock for a new top-level run.
    pub fn begin_run(&mut self) {
        self.meter.reset();
    }

    pub fn steps(&self) -> u64 {
        self.meter.steps()
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn emit(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::trace!(%text, "print");
        self.output.push(text);
    }

    /// Execute a statement outside any function or loop. Stray `return`,
    /// `break` and `continue` become errors here.
    pub fn execute_top_level(&mut self, stmt: &Stmt, env: &Environment) -> Result<(), InterpreterError> {
        match self.execute(stmt, env)? {
            ControlFlow::Next => Ok(()),
            ControlFlow::Return(_) => Err(ExecError::ReturnOutsideFunction.into()),
            ControlFlow::Break | ControlFlow::Continue => Err(ExecError::BreakOutsideLoop.into()),
        }
    }

    pub fn execute(&mut self, stmt: &Stmt, env: &Environment) -> Result<ControlFlow, InterpreterError> {
        self.meter.tick()?;
        tracing::trace!(stmt = stmt.kind_name(), "execute");

        match stmt {
            Stmt::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                env.assign(name, value);
                Ok(ControlFlow::Next)
            }
            Stmt::Expr(expr) => {
                self.evaluate(expr, env)?;
                Ok(ControlFlow::Next)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr, env)?;
                self.emit(value.to_string());
                Ok(ControlFlow::Next)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute_block(then_branch, env)
                } else if let Some(else_stmts) = else_branch {
                    self.execute_block(else_stmts, env)
                } else {
                    Ok(ControlFlow::Next)
                }
            }
            Stmt::While { condition, body } => {
                loop {
                    self.meter.tick()?;
                    if !self.evaluate(condition, env)?.is_truthy() {
                        break;
                    }
                    match self.execute_block(body, env)? {
                        ControlFlow::Break => break,
                        ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                        ControlFlow::Continue | ControlFlow::Next => {}
                    }
                }
                Ok(ControlFlow::Next)
            }
            Stmt::For { var, iterable, body } => {
                let items = match self.evaluate(iterable, env)? {
                    Value::List(items) => items,
                    other => {
                        return Err(EvalError::type_mismatch(format!(
                            "`for` expects a list, got {}",
                            other.type_name()
                        ))
                        .into())
                    }
                };

                for item in items.iter() {
                    self.meter.tick()?;
                    env.assign(var, item.clone());
                    match self.execute_block(body, env)? {
                        ControlFlow::Break => break,
                        ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                        ControlFlow::Continue | ControlFlow::Next => {}
                    }
                }
                Ok(ControlFlow::Next)
            }
            Stmt::Function { name, params, body } => {
                let closure = Closure {
                    name: Some(name.clone()),
                    params: params.clone(),
                    body: ClosureBody::Block(body.clone()),
                    env: env.clone(),
                };
                env.assign(name, Value::Function(Callable::Closure(Rc::new(closure))));
                Ok(ControlFlow::Next)
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::None,
                };
                Ok(ControlFlow::Return(value))
            }
            Stmt::Pass => Ok(ControlFlow::Next),
            Stmt::Break => Ok(ControlFlow::Break),
            Stmt::Continue => Ok(ControlFlow::Continue),
        }
    }

    /// Run `stmts` in a fresh block scope nested in `env`.
    fn execute_block(&mut self, stmts: &[Stmt], env: &Environment) -> Result<ControlFlow, InterpreterError> {
        let scope = env.child_block();
        self.execute_sequence(stmts, &scope)
    }

    fn execute_sequence(&mut self, stmts: &[Stmt], env: &Environment) -> Result<ControlFlow, InterpreterError> {
        for stmt in stmts {
            match self.execute(stmt, env)? {
                ControlFlow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(ControlFlow::Next)
    }

    pub fn evaluate(&mut self, expr: &Expr, env: &Environment) -> Result<Value, InterpreterError> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Identifier(name) => resolve(name, env),
            ExprKind::Grouped(inner) => self.evaluate(inner, env),
            ExprKind::List { elements } => {
                let items = elements
                    .iter()
                    .map(|element| self.evaluate(element, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(items))
            }
            ExprKind::Index { target, index } => {
                let target = self.evaluate(target, env)?;
                let index = self.evaluate(index, env)?;
                Ok(get_index(&target, &index)?)
            }
            ExprKind::Call { callee, args } => {
                let callee = self.evaluate(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, env))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(&callee, args)
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.evaluate(left, env)?;
                match op {
                    BinaryOp::And if !left.is_truthy() => Ok(left),
                    BinaryOp::Or if left.is_truthy() => Ok(left),
                    BinaryOp::And | BinaryOp::Or => self.evaluate(right, env),
                    _ => {
                        let right = self.evaluate(right, env)?;
                        Ok(eval_binary_op(&left, *op, &right)?)
                    }
                }
            }
            ExprKind::Unary { op, expr } => {
                let value = self.evaluate(expr, env)?;
                Ok(eval_unary_op(*op, &value)?)
            }
            ExprKind::Lambda { params, body } => Ok(Value::Function(Callable::Closure(Rc::new(Closure {
                name: None,
                params: params.clone(),
                body: ClosureBody::Expr(body.clone()),
                env: env.clone(),
            })))),
        }
    }

    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, InterpreterError> {
        match callee {
            Value::Function(Callable::Builtin(builtin)) => {
                if !builtin.arity.accepts(args.len()) {
                    return Err(ExecError::ArityMismatch {
                        name: builtin.name.to_string(),
                        expected: builtin.arity.to_string(),
                        found: args.len(),
                    }
                    .into());
                }
                self.meter.tick()?;
                Ok((builtin.func)(&args)?)
            }
            Value::Function(Callable::Closure(closure)) => {
                if closure.params.len() != args.len() {
                    return Err(ExecError::ArityMismatch {
                        name: closure.name.as_deref().unwrap_or("<lambda>").to_string(),
                        expected: closure.params.len().to_string(),
                        found: args.len(),
                    }
                    .into());
                }
                self.meter.tick()?;
                self.meter.enter_call()?;
                let result = self.invoke(closure, args);
                self.meter.exit_call();
                result
            }
            other => Err(EvalError::NotCallable(other.type_name().to_string()).into()),
        }
    }

    fn invoke(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value, InterpreterError> {
        let frame = closure.env.child_frame();
        for (param, arg) in closure.params.iter().zip(args) {
            frame.define(param.as_ref(), arg);
        }

        match &closure.body {
            ClosureBody::Expr(body) => self.evaluate(body, &frame),
            ClosureBody::Block(body) => match self.execute_sequence(body, &frame)? {
                ControlFlow::Return(value) => Ok(value),
                ControlFlow::Next => Ok(Value::None),
                ControlFlow::Break | ControlFlow::Continue => Err(ExecError::BreakOutsideLoop.into()),
            },
        }
    }
}

/// Environment chain first, then the builtin registry and its constants.
fn resolve(name: &str, env: &Environment) -> Result<Value, InterpreterError> {
    if let Some(value) = env.get(name) {
        return Ok(value);
    }
    builtins::lookup(name)
        .map(|builtin| Value::Function(Callable::Builtin(builtin)))
        .or_else(|| builtins::constant(name).map(Value::Number))
        .ok_or_else(|| EvalError::UndefinedName(name.to_string()).into())
}

fn get_index(target: &Value, index: &Value) -> Result<Value, EvalError> {
    let position = match index {
        Value::Number(n) if n.fract() == 0.0 && n.is_finite() => *n as i64,
        Value::Number(n) => return Err(EvalError::type_mismatch(format!("index {} is not an integer", n))),
        other => {
            return Err(EvalError::type_mismatch(format!(
                "index must be a number, got {}",
                other.type_name()
            )))
        }
    };

    let resolve_position = |length: usize| -> Result<usize, EvalError> {
        let adjusted = if position < 0 { position + length as i64 } else { position };
        if adjusted < 0 || adjusted >= length as i64 {
            Err(EvalError::IndexOutOfRange { index: position, length })
        } else {
            Ok(adjusted as usize)
        }
    };

    match target {
        Value::List(items) => Ok(items[resolve_position(items.len())?].clone()),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let at = resolve_position(chars.len())?;
            Ok(Value::string(chars[at].to_string()))
        }
        other => Err(EvalError::type_mismatch(format!("cannot index into {}", other.type_name()))),
    }
}

fn eval_binary_op(left: &Value, op: BinaryOp, right: &Value) -> Result<Value, EvalError> {
    match (left, op, right) {
        (Value::Number(a), BinaryOp::Add, Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Number(a), BinaryOp::Sub, Value::Number(b)) => Ok(Value::Number(a - b)),
        (Value::Number(a), BinaryOp::Mul, Value::Number(b)) => Ok(Value::Number(a * b)),
        (Value::Number(_), BinaryOp::Div | BinaryOp::Mod, Value::Number(b)) if *b == 0.0 => {
            Err(EvalError::DivisionByZero)
        }
        (Value::Number(a), BinaryOp::Div, Value::Number(b)) => Ok(Value::Number(a / b)),
        (Value::Number(a), BinaryOp::Mod, Value::Number(b)) => Ok(Value::Number(a - b * (a / b).floor())),
        (Value::String(a), BinaryOp::Add, Value::String(b)) => {
            let mut combined = String::with_capacity(a.len() + b.len());
            combined.push_str(a);
            combined.push_str(b);
            Ok(Value::string(combined))
        }
        (Value::List(a), BinaryOp::Add, Value::List(b)) => {
            let mut result = a.to_vec();
            result.extend(b.iter().cloned());
            Ok(Value::list(result))
        }
        (a, BinaryOp::Eq, b) => Ok(Value::Bool(a == b)),
        (a, BinaryOp::NotEq, b) => Ok(Value::Bool(a != b)),
        (a, BinaryOp::Greater | BinaryOp::Less | BinaryOp::GreaterEq | BinaryOp::LessEq, b) => {
            let ordering = compare_values(a, b)?;
            let result = match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Greater, Some(ord)) => ord == Ordering::Greater,
                (BinaryOp::Less, Some(ord)) => ord == Ordering::Less,
                (BinaryOp::GreaterEq, Some(ord)) => ord != Ordering::Less,
                (_, Some(ord)) => ord != Ordering::Greater,
            };
            Ok(Value::Bool(result))
        }
        _ => Err(EvalError::type_mismatch(format!(
            "unsupported operand types for {}: {} and {}",
            operator_symbol(op),
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// `None` when the operands are unordered (NaN).
fn compare_values(left: &Value, right: &Value) -> Result<Option<Ordering>, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        _ => Err(EvalError::type_mismatch(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn eval_unary_op(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Neg, other) => Err(EvalError::type_mismatch(format!("cannot negate {}", other.type_name()))),
    }
}

fn operator_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Greater => ">",
        BinaryOp::Less => "<",
        BinaryOp::GreaterEq => ">=",
        BinaryOp::LessEq => "<=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

/// Parse and evaluate one expression with the default budget. Evaluation
/// never binds names; `env` is only read.
pub fn evaluate(source: &str, env: &Environment) -> Result<Value, InterpreterError> {
    let expr = parser::parse_expression(source)?;
    Interpreter::default().evaluate(&expr, env)
}
