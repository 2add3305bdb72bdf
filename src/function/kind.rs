use super::Function;
use crate::{
    log::{error_arity, error_kind, Code, Error},
    scope::Scope,
    value,
};
use serde_json::Value;

/// Type inspection and conversion functions.
pub(crate) fn functions() -> Vec<(&'static str, Function)> {
    vec![
        ("typeof", kind_of),
        ("str", to_text),
        ("number", to_number),
        ("len", length),
    ]
}

fn kind_of(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    let [argument] = arguments else {
        return Err(error_arity("typeof", "exactly one argument"));
    };

    Ok(Value::String(value::kind(argument).to_string()))
}

fn to_text(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    let [argument] = arguments else {
        return Err(error_arity("str", "exactly one argument"));
    };

    Ok(Value::String(value::stringify(argument)))
}

/// Convert a number, numeric string, or boolean to a number.
fn to_number(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    let [argument] = arguments else {
        return Err(error_arity("number", "exactly one argument"));
    };

    match argument {
        Value::Number(_) => Ok(argument.clone()),
        Value::String(text) => {
            let parsed: f64 = text.trim().parse().map_err(|_| {
                Error::new(
                    Code::TypeMismatch,
                    format!("cannot convert string `{text}` to number"),
                )
            })?;
            value::number(parsed).map_err(|_| {
                Error::new(
                    Code::TypeMismatch,
                    format!("cannot convert string `{text}` to number"),
                )
            })
        }
        Value::Bool(true) => Ok(Value::from(1)),
        Value::Bool(false) => Ok(Value::from(0)),
        other => Err(error_kind(
            "function `number`",
            "number, string or boolean",
            value::kind(other),
        )),
    }
}

/// The length of a string in characters, an array in elements, or an
/// object in keys.
fn length(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    let [argument] = arguments else {
        return Err(error_arity("len", "exactly one argument"));
    };

    let length = match argument {
        Value::String(string) => string.chars().count(),
        Value::Array(array) => array.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(error_kind(
                "function `len`",
                "string, array or object",
                value::kind(other),
            ));
        }
    };

    Ok(Value::from(length as i64))
}

#[cfg(test)]
mod tests {
    use crate::{log::Code, Engine, Error, Store};
    use serde_json::{json, Value};

    #[test]
    fn test_kind_of() {
        assert_eq!(helper_eval("typeof(null)"), Ok(json!("null")));
        assert_eq!(helper_eval("typeof(1.5)"), Ok(json!("number")));
        assert_eq!(helper_eval("typeof([1])"), Ok(json!("array")));
        assert_eq!(helper_eval("typeof({})"), Ok(json!("object")));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(helper_eval("str(2)"), Ok(json!("2")));
        assert_eq!(helper_eval("str(2.5)"), Ok(json!("2.5")));
        assert_eq!(helper_eval("str(true)"), Ok(json!("true")));
        assert_eq!(helper_eval("str(null)"), Ok(json!("null")));
        assert_eq!(helper_eval("str('x')"), Ok(json!("x")));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(helper_eval("number('2.5')"), Ok(json!(2.5)));
        assert_eq!(helper_eval("number('12')"), Ok(json!(12)));
        assert_eq!(helper_eval("number(true)"), Ok(json!(1)));
        assert_eq!(helper_eval("number(7)"), Ok(json!(7)));

        let error = helper_eval("number('seven')").unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
        let error = helper_eval("number(null)").unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    #[test]
    fn test_length() {
        assert_eq!(helper_eval("len('hello')"), Ok(json!(5)));
        assert_eq!(helper_eval("len([1, 2])"), Ok(json!(2)));
        assert_eq!(helper_eval("len({a: 1})"), Ok(json!(1)));

        let error = helper_eval("len(5)").unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    fn helper_eval(source: &str) -> Result<Value, Error> {
        Engine::default().render(&json!({ "$eval": source }), &Store::new())
    }
}
