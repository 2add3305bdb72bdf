use super::Operator;
use crate::{
    datetime,
    log::{error_kind, error_missing_property, Error},
    render::Renderer,
    scope::Scope,
    value,
};
use chrono::Utc;
use serde_json::{Map, Value};

/// Date and time operators.
pub(crate) fn operators() -> Vec<(&'static str, Operator)> {
    vec![("$fromNow", from_now)]
}

/// `$fromNow` renders its duration and offsets a base timestamp by it,
/// producing an ISO 8601 UTC string. The base is a rendered `from` field
/// when present, or the current time.
fn from_now(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let duration = template
        .get("$fromNow")
        .ok_or_else(|| error_missing_property("$fromNow", "$fromNow"))?;

    let duration = match renderer.render_or_null(duration, scope)? {
        Value::String(duration) => duration,
        other => {
            return Err(error_kind(
                "`$fromNow` duration",
                "string",
                value::kind(&other),
            ));
        }
    };

    let base = match template.get("from") {
        Some(from) => {
            let text = match renderer.render_or_null(from, scope)? {
                Value::String(text) => text,
                other => {
                    return Err(error_kind(
                        "`$fromNow` from",
                        "string",
                        value::kind(&other),
                    ));
                }
            };
            datetime::parse_timestamp(&text)?
        }
        None => Utc::now(),
    };

    let result = datetime::add_duration(base, &duration)?;

    Ok(Some(Value::String(datetime::format_timestamp(&result))))
}

#[cfg(test)]
mod tests {
    use crate::{log::Code, Engine, Error, Store};
    use serde_json::{json, Value};

    #[test]
    fn test_from_now_with_base() {
        assert_eq!(
            helper_render(json!({
                "$fromNow": "1 day 2 hours",
                "from": "2017-01-19T16:27:20.974Z"
            })),
            Ok(json!("2017-01-20T18:27:20.974Z"))
        );
    }

    #[test]
    fn test_from_now_renders_sub_templates() {
        let template = json!({
            "$fromNow": "${amount} hours",
            "from": {"$eval": "start"}
        });
        let store = Store::new()
            .with_must("amount", 2)
            .with_must("start", "2017-01-19T16:00:00Z");

        assert_eq!(
            Engine::default().render(&template, &store),
            Ok(json!("2017-01-19T18:00:00.000Z"))
        );
    }

    #[test]
    fn test_from_now_errors() {
        let error = helper_render(json!({"$fromNow": 5})).unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);

        let error = helper_render(json!({
            "$fromNow": "1 fortnight",
            "from": "2017-01-19T16:00:00Z"
        }))
        .unwrap_err();
        assert_eq!(error.code(), Code::InvalidDateTime);

        let error = helper_render(json!({
            "$fromNow": "1h",
            "from": "not a time"
        }))
        .unwrap_err();
        assert_eq!(error.code(), Code::InvalidDateTime);
    }

    fn helper_render(template: Value) -> Result<Value, Error> {
        Engine::default().render(&template, &Store::new())
    }
}
