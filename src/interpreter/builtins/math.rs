//! Mathematical built-in functions.

use super::number_arg;
use crate::interpreter::error::EvalError;
use crate::value::Value;

macro_rules! unary_math {
    ($name:ident, $op:ident) => {
        pub fn $name(args: &[Value]) -> Result<Value, EvalError> {
            let n = number_arg(args, 0, stringify!($op))?;
            Ok(Value::Number(n.$op()))
        }
    };
}

unary_math!(builtin_floor, floor);
unary_math!(builtin_ceil, ceil);
unary_math!(builtin_abs, abs);
unary_math!(builtin_sin, sin);
unary_math!(builtin_cos, cos);
unary_math!(builtin_tan, tan);

pub fn builtin_sqrt(args: &[Value]) -> Result<Value, EvalError> {
    let n = number_arg(args, 0, "sqrt")?;
    if n.is_nan() || n < 0.0 {
        return Err(EvalError::builtin("sqrt", format!("math domain error: sqrt({})", n)));
    }
    Ok(Value::Number(n.sqrt()))
}

pub fn builtin_exp(args: &[Value]) -> Result<Value, EvalError> {
    let n = number_arg(args, 0, "exp")?;
    let result = n.exp();
    if result.is_infinite() {
        return Err(EvalError::builtin("exp", format!("math range error: exp({})", n)));
    }
    Ok(Value::Number(result))
}

pub fn builtin_log(args: &[Value]) -> Result<Value, EvalError> {
    let n = number_arg(args, 0, "log")?;
    if n.is_nan() || n <= 0.0 {
        return Err(EvalError::builtin("log", format!("math domain error: log({})", n)));
    }
    if args.len() < 2 {
        return Ok(Value::Number(n.ln()));
    }

    let base = number_arg(args, 1, "log")?;
    if base.is_nan() || base <= 0.0 || base == 1.0 {
        return Err(EvalError::builtin("log", format!("invalid base {}", base)));
    }
    Ok(Value::Number(n.ln() / base.ln()))
}

/// Written in two halves so neither branch calls `exp` on a large positive
/// argument.
pub fn builtin_sigmoid(args: &[Value]) -> Result<Value, EvalError> {
    let x = number_arg(args, 0, "sigmoid")?;
    let result = if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    };
    Ok(Value::Number(result))
}

pub fn builtin_rand(_args: &[Value]) -> Result<Value, EvalError> {
    use rand::Rng;
    Ok(Value::Number(rand::thread_rng().r#gen::<f64>()))
}
