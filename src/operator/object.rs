use super::Operator;
use crate::{
    log::{error_kind, error_missing_property, Error},
    render::Renderer,
    scope::Scope,
    value,
};
use serde_json::{Map, Value};

/// Object combination operators.
pub(crate) fn operators() -> Vec<(&'static str, Operator)> {
    vec![
        ("$merge", merge),
        ("$mergeDeep", merge_deep),
        ("$json", json),
    ]
}

/// `$merge` combines an array of objects left to right, later keys
/// replacing earlier ones. Values are taken whole, nested objects are not
/// merged.
fn merge(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$merge")
        .ok_or_else(|| error_missing_property("$merge", "$merge"))?;

    let items = match renderer.render_or_null(source, scope)? {
        Value::Array(items) => items,
        other => {
            return Err(error_kind("`$merge` source", "array", value::kind(&other)));
        }
    };

    let mut result = Map::new();
    for item in items {
        let entries = match item {
            Value::Object(entries) => entries,
            other => {
                return Err(error_kind(
                    "`$merge` source",
                    "an array of objects",
                    value::kind(&other),
                ));
            }
        };
        for (key, entry) in entries {
            result.insert(key, entry);
        }
    }

    Ok(Some(Value::Object(result)))
}

/// `$mergeDeep` combines an array of objects left to right, merging
/// nested object values recursively instead of replacing them.
fn merge_deep(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$mergeDeep")
        .ok_or_else(|| error_missing_property("$mergeDeep", "$mergeDeep"))?;

    let items = match renderer.render_or_null(source, scope)? {
        Value::Array(items) => items,
        other => {
            return Err(error_kind(
                "`$mergeDeep` source",
                "array",
                value::kind(&other),
            ));
        }
    };

    let mut result = Map::new();
    for item in items {
        let entries = match item {
            Value::Object(entries) => entries,
            other => {
                return Err(error_kind(
                    "`$mergeDeep` source",
                    "an array of objects",
                    value::kind(&other),
                ));
            }
        };
        combine(&mut result, entries);
    }

    Ok(Some(Value::Object(result)))
}

/// Merge `source` into `target`, recursing where both sides hold objects
/// under the same key.
fn combine(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, incoming) in source {
        match incoming {
            Value::Object(nested) => {
                if let Some(Value::Object(existing)) = target.get_mut(&key) {
                    combine(existing, nested);
                } else {
                    target.insert(key, Value::Object(nested));
                }
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}

/// `$json` renders its value and serializes it to a compact JSON string.
fn json(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$json")
        .ok_or_else(|| error_missing_property("$json", "$json"))?;

    let rendered = renderer.render_or_null(source, scope)?;
    let serialized = serde_json::to_string(&rendered)
        .expect("a rendered value always serializes");

    Ok(Some(Value::String(serialized)))
}
