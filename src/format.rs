use serde_json::{json, Map, Number};

use crate::interpreter::Environment;
use crate::value::Value;

/// `name = value` per binding, in definition order.
pub fn environment_to_text(env: &Environment) -> String {
    env.bindings()
        .iter()
        .map(|(name, value)| format!("{} = {}\n", name, describe(value)))
        .collect()
}

/// Like the canonical form, but strings are quoted so `x = "1"` and `x = 1`
/// stay distinguishable.
pub fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s.as_ref()),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(describe).collect();
            format!("[{}]", parts.join(", "))
        }
        other => other.to_string(),
    }
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => json!(*n as i64),
        Value::Number(n) => Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => json!(s.as_ref()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Function(_) => json!(value.to_string()),
    }
}

pub fn environment_to_json(env: &Environment, compact: bool) -> String {
    let object: Map<String, serde_json::Value> = env
        .bindings()
        .iter()
        .map(|(name, value)| (name.clone(), value_to_json(value)))
        .collect();
    let object = serde_json::Value::Object(object);

    let rendered = if compact {
        serde_json::to_string(&object)
    } else {
        serde_json::to_string_pretty(&object)
    };
    rendered.unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_env() -> Environment {
        let env = Environment::new();
        env.define("n", Value::Number(3.0));
        env.define("half", Value::Number(0.5));
        env.define("name", Value::string("rosa"));
        env.define("items", Value::list(vec![Value::Number(1.0), Value::None, Value::Bool(true)]));
        env.define("f", Value::Function(crate::value::Callable::Builtin(
            crate::interpreter::builtins::lookup("abs").unwrap(),
        )));
        env
    }

    #[test]
    fn test_text_dump() {
        let text = environment_to_text(&sample_env());
        assert_eq!(
            text,
            "n = 3\nhalf = 0.5\nname = \"rosa\"\nitems = [1, none, true]\nf = <builtin abs>\n"
        );
    }

    #[test]
    fn test_json_dump() {
        let rendered = environment_to_json(&sample_env(), true);
        assert_eq!(
            rendered,
            r#"{"n":3,"half":0.5,"name":"rosa","items":[1,null,true],"f":"<builtin abs>"}"#
        );
    }

    #[test]
    fn test_non_finite_numbers_become_null() {
        assert_eq!(value_to_json(&Value::Number(f64::NAN)), serde_json::Value::Null);
    }
}
