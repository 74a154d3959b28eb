//! Built-in functions shared by every dialect.
//!
//! Functions are organized into categories:
//! - **Math**: numeric helpers (abs, floor, ceil, sqrt, exp, log, trig, sigmoid, rand)
//! - **List**: sequence helpers (len, range, min, max, mean, dot)
//!
//! The registry is built once per process and never changes afterwards.
//! Scripts may shadow a builtin name in their own environment, which leaves
//! the registry (and every other session) untouched. No builtin can reach the
//! filesystem, the network or other processes.

mod list;
mod math;

use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;

use super::error::EvalError;
use crate::value::Value;

pub use list::*;
pub use math::*;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, EvalError>;

/// Accepted argument counts for a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
            Arity::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub summary: &'static str,
    pub func: BuiltinFn,
}

pub struct Registry {
    functions: IndexMap<&'static str, Builtin>,
}

impl Registry {
    fn standard() -> Self {
        let mut functions = IndexMap::new();
        let mut add = |name: &'static str, arity: Arity, summary: &'static str, func: BuiltinFn| {
            functions.insert(name, Builtin { name, arity, summary, func });
        };

        add("len", Arity::Exact(1), "length of a list or string", builtin_len);
        add("range", Arity::Range(1, 3), "range(n) / range(a, b) / range(a, b, step)", builtin_range);
        add("abs", Arity::Exact(1), "absolute value", builtin_abs);
        add("min", Arity::AtLeast(1), "smallest of a list or of the arguments", builtin_min);
        add("max", Arity::AtLeast(1), "largest of a list or of the arguments", builtin_max);
        add("floor", Arity::Exact(1), "round down", builtin_floor);
        add("ceil", Arity::Exact(1), "round up", builtin_ceil);
        add("sqrt", Arity::Exact(1), "square root of a non-negative number", builtin_sqrt);
        add("exp", Arity::Exact(1), "e raised to x", builtin_exp);
        add("log", Arity::Range(1, 2), "natural log, or log(x, base)", builtin_log);
        add("sin", Arity::Exact(1), "sine (radians)", builtin_sin);
        add("cos", Arity::Exact(1), "cosine (radians)", builtin_cos);
        add("tan", Arity::Exact(1), "tangent (radians)", builtin_tan);
        add("sigmoid", Arity::Exact(1), "logistic function 1 / (1 + e^-x)", builtin_sigmoid);
        add("mean", Arity::Exact(1), "arithmetic mean of a list (0 when empty)", builtin_mean);
        add("dot", Arity::Exact(2), "dot product of two equal-length lists", builtin_dot);
        add("rand", Arity::Exact(0), "uniform random number in [0, 1)", builtin_rand);

        Self { functions }
    }

    pub fn get(&'static self, name: &str) -> Option<&'static Builtin> {
        self.functions.get(name)
    }

    pub fn iter(&'static self) -> impl Iterator<Item = &'static Builtin> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// The process-wide, read-only builtin table.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::standard)
}

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    registry().get(name)
}

/// Named numeric constants, resolved after the environment and the builtin
/// functions.
pub const CONSTANTS: [(&str, f64); 3] = [
    ("pi", std::f64::consts::PI),
    ("e", std::f64::consts::E),
    ("tau", std::f64::consts::TAU),
];

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS.iter().find(|(constant, _)| *constant == name).map(|(_, value)| *value)
}

pub(crate) fn number_arg(args: &[Value], index: usize, name: &str) -> Result<f64, EvalError> {
    match args.get(index) {
        Some(Value::Number(n)) if n.is_finite() => Ok(*n),
        Some(Value::Number(n)) => Err(EvalError::builtin(name, format!("non-finite argument {}", n))),
        Some(other) => Err(EvalError::type_mismatch(format!(
            "{} expects a number, got {}",
            name,
            other.type_name()
        ))),
        None => Err(EvalError::builtin(name, format!("missing argument {}", index + 1))),
    }
}

pub(crate) fn list_arg<'v>(args: &'v [Value], index: usize, name: &str) -> Result<&'v [Value], EvalError> {
    match args.get(index) {
        Some(Value::List(items)) => Ok(items.as_slice()),
        Some(other) => Err(EvalError::type_mismatch(format!(
            "{} expects a list, got {}",
            name,
            other.type_name()
        ))),
        None => Err(EvalError::builtin(name, format!("missing argument {}", index + 1))),
    }
}

/// Every element of `items` as a number.
pub(crate) fn numbers(items: &[Value], name: &str) -> Result<Vec<f64>, EvalError> {
    items
        .iter()
        .map(|item| match item.as_number() {
            Some(n) if n.is_finite() => Ok(n),
            Some(n) => Err(EvalError::builtin(name, format!("non-finite element {}", n))),
            None => Err(EvalError::type_mismatch(format!(
                "{} expects numbers, found {}",
                name,
                item.type_name()
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contents() {
        let names: Vec<&str> = registry().iter().map(|b| b.name).collect();
        for expected in [
            "len", "range", "abs", "min", "max", "floor", "ceil", "sqrt", "exp", "log", "sin", "cos",
            "tan", "sigmoid", "mean", "dot", "rand",
        ] {
            assert!(names.contains(&expected), "missing builtin {}", expected);
        }
        assert_eq!(registry().len(), 17);
    }

    #[test]
    fn test_lookup_is_stable() {
        let first = lookup("sqrt").expect("sqrt registered");
        let second = lookup("sqrt").expect("sqrt registered");
        assert!(std::ptr::eq(first, second));
        assert!(lookup("open").is_none());
        assert!(lookup("exec").is_none());
    }

    #[test]
    fn test_constants() {
        assert_eq!(constant("pi"), Some(std::f64::consts::PI));
        assert_eq!(constant("e"), Some(std::f64::consts::E));
        assert!(constant("phi").is_none());
        assert!(CONSTANTS.iter().all(|(name, _)| lookup(name).is_none()));
    }

    #[test]
    fn test_arity() {
        assert!(Arity::Exact(1).accepts(1));
        assert!(!Arity::Exact(1).accepts(2));
        assert!(Arity::Range(1, 3).accepts(3));
        assert!(!Arity::Range(1, 3).accepts(0));
        assert!(Arity::AtLeast(1).accepts(7));
        assert_eq!(Arity::Range(1, 2).to_string(), "1 to 2");
    }
}
