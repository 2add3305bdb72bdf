use super::Function;
use crate::{
    log::{error_arity, error_kind, Error},
    scope::Scope,
    value,
};
use serde_json::Value;

/// String functions.
pub(crate) fn functions() -> Vec<(&'static str, Function)> {
    vec![
        ("lowercase", lowercase),
        ("uppercase", uppercase),
        ("strip", strip),
        ("lstrip", lstrip),
        ("rstrip", rstrip),
        ("split", split),
        ("join", join),
    ]
}

fn lowercase(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("lowercase", arguments, |s| s.to_lowercase())
}

fn uppercase(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("uppercase", arguments, |s| s.to_uppercase())
}

fn strip(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("strip", arguments, |s| s.trim().to_string())
}

fn lstrip(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("lstrip", arguments, |s| s.trim_start().to_string())
}

fn rstrip(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("rstrip", arguments, |s| s.trim_end().to_string())
}

/// Split a string on a delimiter, producing an array of strings.
///
/// An empty delimiter does not split.
fn split(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    let [haystack, delimiter] = arguments else {
        return Err(error_arity("split", "exactly two arguments"));
    };
    let haystack = require_string("split", haystack)?;
    let delimiter = require_string("split", delimiter)?;

    if delimiter.is_empty() {
        return Ok(Value::Array(vec![Value::String(haystack.to_string())]));
    }

    let parts = haystack
        .split(delimiter)
        .map(|part| Value::String(part.to_string()))
        .collect();

    Ok(Value::Array(parts))
}

/// Join an array into a string with a separator.
///
/// Elements are stringified the same way interpolation stringifies them.
fn join(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    let [items, separator] = arguments else {
        return Err(error_arity("join", "exactly two arguments"));
    };
    let Value::Array(items) = items else {
        return Err(error_kind("function `join`", "array", value::kind(items)));
    };
    let separator = require_string("join", separator)?;

    let joined = items
        .iter()
        .map(value::stringify)
        .collect::<Vec<_>>()
        .join(separator);

    Ok(Value::String(joined))
}

/// Apply a one argument string function.
fn apply_unary(
    name: &str,
    arguments: &[Value],
    apply: impl Fn(&str) -> String,
) -> Result<Value, Error> {
    let [argument] = arguments else {
        return Err(error_arity(name, "exactly one argument"));
    };

    Ok(Value::String(apply(require_string(name, argument)?)))
}

fn require_string<'a>(name: &str, argument: &'a Value) -> Result<&'a str, Error> {
    match argument {
        Value::String(string) => Ok(string),
        other => Err(error_kind(
            format!("function `{name}`"),
            "string",
            value::kind(other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::{log::Code, Engine, Error, Store};
    use serde_json::{json, Value};

    #[test]
    fn test_casing_and_trimming() {
        assert_eq!(helper_eval("lowercase('AbC')"), Ok(json!("abc")));
        assert_eq!(helper_eval("uppercase('AbC')"), Ok(json!("ABC")));
        assert_eq!(helper_eval("strip('  a  ')"), Ok(json!("a")));
        assert_eq!(helper_eval("lstrip('  a  ')"), Ok(json!("a  ")));
        assert_eq!(helper_eval("rstrip('  a  ')"), Ok(json!("  a")));
    }

    #[test]
    fn test_split() {
        assert_eq!(helper_eval("split('a,b,c', ',')"), Ok(json!(["a", "b", "c"])));
        assert_eq!(helper_eval("split('a', ',')"), Ok(json!(["a"])));
        assert_eq!(helper_eval("split('ab', '')"), Ok(json!(["ab"])));
    }

    #[test]
    fn test_join() {
        assert_eq!(helper_eval("join([1, 'a', true], '-')"), Ok(json!("1-a-true")));
        assert_eq!(helper_eval("join([], ',')"), Ok(json!("")));
    }

    #[test]
    fn test_kind_errors() {
        for source in ["lowercase(1)", "join('a', ',')", "split('a', 1)"] {
            let error = helper_eval(source).unwrap_err();
            assert_eq!(error.code(), Code::TypeMismatch, "`{source}`");
        }
    }

    fn helper_eval(source: &str) -> Result<Value, Error> {
        Engine::default().render(&json!({ "$eval": source }), &Store::new())
    }
}
