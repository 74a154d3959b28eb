//! Sequence built-in functions.

use super::{list_arg, number_arg, numbers};
use crate::interpreter::error::EvalError;
use crate::value::Value;

/// Refuse to materialize absurdly large ranges.
const MAX_RANGE_LEN: f64 = 10_000_000.0;

pub fn builtin_len(args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::List(items) => Ok(Value::Number(items.len() as f64)),
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        other => Err(EvalError::type_mismatch(format!(
            "len expects a list or string, got {}",
            other.type_name()
        ))),
    }
}

/// Arguments are truncated toward zero, like `int()`.
pub fn builtin_range(args: &[Value]) -> Result<Value, EvalError> {
    let (start, end, step) = match args.len() {
        1 => (0.0, number_arg(args, 0, "range")?.trunc(), 1.0),
        2 => (
            number_arg(args, 0, "range")?.trunc(),
            number_arg(args, 1, "range")?.trunc(),
            1.0,
        ),
        _ => (
            number_arg(args, 0, "range")?.trunc(),
            number_arg(args, 1, "range")?.trunc(),
            number_arg(args, 2, "range")?.trunc(),
        ),
    };

    if step == 0.0 {
        return Err(EvalError::builtin("range", "step must not be zero"));
    }

    let count = ((end - start) / step).ceil().max(0.0);
    if !count.is_finite() || count > MAX_RANGE_LEN {
        return Err(EvalError::builtin("range", format!("range of {} elements is too large", count)));
    }

    let items = (0..count as usize)
        .map(|i| Value::Number(start + step * i as f64))
        .collect();
    Ok(Value::list(items))
}

fn extremum(args: &[Value], name: &str, pick_left: fn(f64, f64) -> bool) -> Result<Value, EvalError> {
    let candidates = if args.len() == 1 {
        numbers(list_arg(args, 0, name)?, name)?
    } else {
        numbers(args, name)?
    };

    candidates
        .into_iter()
        .reduce(|best, n| if pick_left(best, n) { best } else { n })
        .map(Value::Number)
        .ok_or_else(|| EvalError::builtin(name, "arg is an empty sequence"))
}

pub fn builtin_min(args: &[Value]) -> Result<Value, EvalError> {
    extremum(args, "min", |best, n| best <= n)
}

pub fn builtin_max(args: &[Value]) -> Result<Value, EvalError> {
    extremum(args, "max", |best, n| best >= n)
}

pub fn builtin_mean(args: &[Value]) -> Result<Value, EvalError> {
    let values = numbers(list_arg(args, 0, "mean")?, "mean")?;
    if values.is_empty() {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(values.iter().sum::<f64>() / values.len() as f64))
}

pub fn builtin_dot(args: &[Value]) -> Result<Value, EvalError> {
    let left = numbers(list_arg(args, 0, "dot")?, "dot")?;
    let right = numbers(list_arg(args, 1, "dot")?, "dot")?;
    if left.len() != right.len() {
        return Err(EvalError::builtin(
            "dot",
            format!("lists differ in length ({} vs {})", left.len(), right.len()),
        ));
    }
    Ok(Value::Number(left.iter().zip(&right).map(|(a, b)| a * b).sum()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Value {
        Value::list(values.iter().copied().map(Value::Number).collect())
    }

    #[test]
    fn test_len() {
        assert_eq!(builtin_len(&[nums(&[1.0, 2.0])]), Ok(Value::Number(2.0)));
        assert_eq!(builtin_len(&[Value::string("héllo")]), Ok(Value::Number(5.0)));
        assert!(matches!(
            builtin_len(&[Value::Number(3.0)]),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_range_forms() {
        assert_eq!(builtin_range(&[Value::Number(3.0)]), Ok(nums(&[0.0, 1.0, 2.0])));
        assert_eq!(builtin_range(&[Value::Number(3.9)]), Ok(nums(&[0.0, 1.0, 2.0])));
        assert_eq!(
            builtin_range(&[Value::Number(2.0), Value::Number(5.0)]),
            Ok(nums(&[2.0, 3.0, 4.0]))
        );
        assert_eq!(
            builtin_range(&[Value::Number(5.0), Value::Number(0.0), Value::Number(-2.0)]),
            Ok(nums(&[5.0, 3.0, 1.0]))
        );
        assert_eq!(builtin_range(&[Value::Number(-2.0)]), Ok(nums(&[])));
    }

    #[test]
    fn test_range_rejects_zero_step_and_huge_sizes() {
        assert!(matches!(
            builtin_range(&[Value::Number(0.0), Value::Number(5.0), Value::Number(0.0)]),
            Err(EvalError::BuiltinFailure { .. })
        ));
        assert!(matches!(
            builtin_range(&[Value::Number(1e12)]),
            Err(EvalError::BuiltinFailure { .. })
        ));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(builtin_min(&[nums(&[3.0, 1.0, 2.0])]), Ok(Value::Number(1.0)));
        assert_eq!(
            builtin_max(&[Value::Number(3.0), Value::Number(7.0), Value::Number(5.0)]),
            Ok(Value::Number(7.0))
        );
        assert!(matches!(builtin_min(&[nums(&[])]), Err(EvalError::BuiltinFailure { .. })));
        assert!(matches!(builtin_max(&[Value::Number(1.0)]), Err(EvalError::TypeMismatch(_))));
    }

    #[test]
    fn test_mean() {
        assert_eq!(builtin_mean(&[nums(&[1.0, 2.0, 3.0, 4.0])]), Ok(Value::Number(2.5)));
        assert_eq!(builtin_mean(&[nums(&[])]), Ok(Value::Number(0.0)));
    }

    #[test]
    fn test_dot() {
        assert_eq!(
            builtin_dot(&[nums(&[1.0, 2.0, 3.0]), nums(&[4.0, 5.0, 6.0])]),
            Ok(Value::Number(32.0))
        );
        assert!(matches!(
            builtin_dot(&[nums(&[1.0, 2.0]), nums(&[1.0])]),
            Err(EvalError::BuiltinFailure { .. })
        ));
    }
}
