use super::Function;
use crate::{
    datetime,
    log::{error_arity, error_kind, Code, Error},
    scope::Scope,
    value,
};
use chrono::Utc;
use serde_json::Value;

/// Utility functions.
pub(crate) fn functions() -> Vec<(&'static str, Function)> {
    vec![
        ("range", range),
        ("defined", defined),
        ("fromNow", from_now),
    ]
}

/// Produce an integer array.
///
/// `range(end)`, `range(begin, end)` or `range(begin, end, step)`. The
/// sign of the step decides the direction of iteration.
fn range(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    let (begin, end, step) = match arguments {
        [end] => (0, require_integer(end)?, 1),
        [begin, end] => (require_integer(begin)?, require_integer(end)?, 1),
        [begin, end, step] => (
            require_integer(begin)?,
            require_integer(end)?,
            require_integer(step)?,
        ),
        _ => return Err(error_arity("range", "one to three arguments")),
    };

    if step == 0 {
        return Err(Error::new(
            Code::InvalidArgument,
            "`range` step cannot be zero",
        ));
    }

    let mut result = vec![];
    let mut current = begin;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        result.push(Value::from(current));
        current += step;
    }

    Ok(Value::Array(result))
}

/// Return true if the given name resolves in the current scope chain.
fn defined(arguments: &[Value], scope: &Scope) -> Result<Value, Error> {
    let [argument] = arguments else {
        return Err(error_arity("defined", "exactly one argument"));
    };

    match argument {
        Value::String(name) => Ok(Value::Bool(scope.has(name))),
        other => Err(error_kind(
            "function `defined`",
            "string",
            value::kind(other),
        )),
    }
}

/// Offset a timestamp by a duration.
///
/// `fromNow(duration)` offsets the current time, `fromNow(duration, from)`
/// offsets the given ISO 8601 timestamp.
fn from_now(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    let (duration, from) = match arguments {
        [duration] => (duration, None),
        [duration, from] => (duration, Some(from)),
        _ => return Err(error_arity("fromNow", "one or two arguments")),
    };

    let Value::String(duration) = duration else {
        return Err(error_kind(
            "function `fromNow`",
            "string",
            value::kind(duration),
        ));
    };

    let base = match from {
        Some(Value::String(text)) => datetime::parse_timestamp(text)?,
        Some(other) => {
            return Err(error_kind(
                "function `fromNow`",
                "string",
                value::kind(other),
            ));
        }
        None => Utc::now(),
    };

    let result = datetime::add_duration(base, duration)?;

    Ok(Value::String(datetime::format_timestamp(&result)))
}

fn require_integer(argument: &Value) -> Result<i64, Error> {
    value::as_number(argument)
        .map(|number| number as i64)
        .ok_or_else(|| error_kind("function `range`", "number", value::kind(argument)))
}

#[cfg(test)]
mod tests {
    use crate::{log::Code, Engine, Error, Store};
    use serde_json::{json, Value};

    #[test]
    fn test_range() {
        assert_eq!(helper_eval("range(3)"), Ok(json!([0, 1, 2])));
        assert_eq!(helper_eval("range(2, 5)"), Ok(json!([2, 3, 4])));
        assert_eq!(helper_eval("range(0, 10, 3)"), Ok(json!([0, 3, 6, 9])));
        assert_eq!(helper_eval("range(3, 0, -1)"), Ok(json!([3, 2, 1])));
        assert_eq!(helper_eval("range(3, 3)"), Ok(json!([])));
    }

    #[test]
    fn test_range_rejects_zero_step() {
        let error = helper_eval("range(0, 3, 0)").unwrap_err();
        assert_eq!(error.code(), Code::InvalidArgument);
    }

    #[test]
    fn test_defined() {
        let store = Store::new().with_must("name", "taylor");
        let engine = Engine::default();

        assert_eq!(
            engine.render(&json!({"$eval": "defined('name')"}), &store),
            Ok(json!(true))
        );
        assert_eq!(
            engine.render(&json!({"$eval": "defined('ghost')"}), &store),
            Ok(json!(false))
        );
        assert_eq!(
            engine.render(
                &json!({"$let": {"inner": 1}, "in": {"$eval": "defined('inner')"}}),
                &store
            ),
            Ok(json!(true))
        );
    }

    #[test]
    fn test_from_now_with_base() {
        assert_eq!(
            helper_eval("fromNow('2 hours', '2017-01-19T16:27:20.974Z')"),
            Ok(json!("2017-01-19T18:27:20.974Z"))
        );
        assert_eq!(
            helper_eval("fromNow('-1 day', '2017-01-19T16:27:20Z')"),
            Ok(json!("2017-01-18T16:27:20.000Z"))
        );

        let error = helper_eval("fromNow('eventually', '2017-01-19T16:27:20Z')").unwrap_err();
        assert_eq!(error.code(), Code::InvalidDateTime);
    }

    fn helper_eval(source: &str) -> Result<Value, Error> {
        Engine::default().render(&json!({ "$eval": source }), &Store::new())
    }
}
