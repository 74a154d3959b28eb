use std::fmt;
use std::rc::Rc;

use crate::ast::{Expr, Stmt};
use crate::interpreter::builtins::Builtin;
use crate::interpreter::environment::Environment;

/// A runtime value. Everything is immutable once built; lists are shared
/// behind an `Rc` and never mutated in place.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    List(Rc<Vec<Value>>),
    Function(Callable),
}

#[derive(Debug, Clone)]
pub enum Callable {
    Builtin(&'static Builtin),
    Closure(Rc<Closure>),
}

/// A user function together with the environment it was defined in.
/// The environment is shared, so later rebinding of outer names is visible
/// when the closure runs.
pub struct Closure {
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub body: ClosureBody,
    pub env: Environment,
}

#[derive(Debug, Clone)]
pub enum ClosureBody {
    Expr(Rc<Expr>),
    Block(Rc<[Stmt]>),
}

// Closures usually sit inside the environment they capture, so Debug must not
// walk into `env`.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Callable::Builtin(builtin) => builtin.name,
            Callable::Closure(closure) => closure.name.as_deref().unwrap_or("<lambda>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(left_bool), Value::Bool(right_bool)) => left_bool == right_bool,
            (Value::Number(left_num), Value::Number(right_num)) => left_num == right_num,
            (Value::String(left_str), Value::String(right_str)) => left_str == right_str,
            (Value::List(left_list), Value::List(right_list)) => left_list == right_list,
            (Value::Function(Callable::Builtin(left_fn)), Value::Function(Callable::Builtin(right_fn))) => {
                std::ptr::eq(*left_fn, *right_fn)
            }
            (Value::Function(Callable::Closure(left_fn)), Value::Function(Callable::Closure(right_fn))) => {
                Rc::ptr_eq(left_fn, right_fn)
            }
            _ => false,
        }
    }
}

impl Value {
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Rc::from(text.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(numeric_value) = self {
            Some(*numeric_value)
        } else {
            None
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(string_ref) = self {
            Some(string_ref.as_ref())
        } else {
            None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(bool_value) = self {
            Some(*bool_value)
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        if let Value::List(items) = self {
            Some(items.as_slice())
        } else {
            None
        }
    }

    /// Zero, the empty string, the empty list, `false` and `none` are falsey.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Function(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) => "function",
        }
    }
}

/// Canonical textual form: integral numbers without `.0`, strings unquoted,
/// lists bracketed and comma-joined.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("none"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Function(Callable::Builtin(builtin)) => write!(f, "<builtin {}>", builtin.name),
            Value::Function(callable) => write!(f, "<fn {}>", callable.name()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_numbers_print_without_fraction() {
        assert_eq!(Value::Number(14.0).to_string(), "14");
        assert_eq!(Value::Number(-3.0).to_string(), "-3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::None.to_string(), "none");
        let nested = Value::list(vec![
            Value::Number(1.0),
            Value::string("a"),
            Value::list(vec![Value::Bool(false)]),
        ]);
        assert_eq!(nested.to_string(), "[1, a, [false]]");
        assert_eq!(Value::list(vec![]).to_string(), "[]");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::None.is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(Value::list(vec![Value::None]).is_truthy());
    }

    #[test]
    fn test_booleans_are_not_numbers() {
        assert_ne!(Value::Bool(true), Value::Number(1.0));
        assert_ne!(Value::Bool(false), Value::Number(0.0));
        assert_eq!(
            Value::list(vec![Value::Number(1.0)]),
            Value::list(vec![Value::Number(1.0)])
        );
    }
}
