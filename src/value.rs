use crate::log::{Code, Error};
use serde_json::Value;
use std::cmp::Ordering;

/// Return the name of the given [`Value`] kind.
///
/// These names appear in `TypeMismatch` errors and are returned by the
/// `typeof` built-in.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Return true if the given [`Value`] is truthy.
///
/// `false`, `null`, `0`, `""` and `[]` are falsy, everything else,
/// including an empty object, is truthy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(boolean) => *boolean,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(string) => !string.is_empty(),
        Value::Array(array) => !array.is_empty(),
        Value::Object(_) => true,
    }
}

/// Return the given [`Value`] as a double precision number, if it is
/// a number.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

/// Create a number [`Value`] from the given double.
///
/// Integral values within `i64` range become integer numbers, so arithmetic
/// results serialize without a trailing `.0`.
///
/// # Errors
///
/// Returns an [`Error`] when the double is not finite, because JSON cannot
/// represent it.
pub(crate) fn number(value: f64) -> Result<Value, Error> {
    if !value.is_finite() {
        return Err(Error::new(
            Code::InvalidArgument,
            "result is not a finite number",
        ));
    }
    if value == value.trunc() && value.abs() < i64::MAX as f64 {
        return Ok(Value::from(value as i64));
    }

    Ok(Value::from(value))
}

/// Return true if the two [`Value`] instances are structurally equal.
///
/// Numbers compare as doubles regardless of representation, arrays compare
/// element-wise, objects key-wise. Values of different kinds are unequal.
pub(crate) fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| equals(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, a)| r.get(key).is_some_and(|b| equals(a, b)))
        }
        _ => false,
    }
}

/// Compare two [`Value`] instances.
///
/// Only number/number and string/string pairings are ordered, strings by
/// ordinal comparison. Returns `None` for any other pairing.
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => {
            let l = as_number(left)?;
            let r = as_number(right)?;

            Some(l.total_cmp(&r))
        }
        (Value::String(l), Value::String(r)) => Some(l.as_str().cmp(r.as_str())),
        _ => None,
    }
}

/// Return the display form of the given [`Value`].
///
/// Strings are returned verbatim, numbers through [`format_number`],
/// booleans and null as their literal names, and composites as compact
/// JSON text.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(string) => string.clone(),
        Value::Number(number) => format_number(number.as_f64().unwrap_or(0.0)),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Null => "null".to_string(),
        composite => serde_json::to_string(composite).unwrap_or_default(),
    }
}

/// Format a double without a trailing `.0` when it is integral.
pub(crate) fn format_number(value: f64) -> String {
    if value == value.trunc() && value.is_finite() && value.abs() < i64::MAX as f64 {
        return (value as i64).to_string();
    }

    value.to_string()
}
