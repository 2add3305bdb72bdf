use super::{find_binder, Operator};
use crate::{
    log::{error_kind, error_missing_property, Code, Error},
    render::Renderer,
    scope::Scope,
    value,
};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Sequence transformation operators.
pub(crate) fn operators() -> Vec<(&'static str, Operator)> {
    vec![
        ("$map", map),
        ("$reduce", reduce),
        ("$find", find),
        ("$sort", sort),
        ("$reverse", reverse),
        ("$flatten", flatten),
        ("$flattenDeep", flatten_deep),
    ]
}

/// `$map` renders its body once per element of the source, binding the
/// element under the `each(item)` name and, when named, the index.
///
/// An object source is walked as `{key, val}` entries, with the key bound
/// as the index variable. Deleted results are dropped.
fn map(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$map")
        .ok_or_else(|| error_missing_property("$map", "$map"))?;
    let (names, body) = find_binder(template, "each").ok_or_else(|| {
        Error::new(
            Code::InvalidTemplate,
            "`$map` requires an `each(item)` or `each(item, index)` property",
        )
    })?;
    if names.len() > 2 {
        return Err(Error::new(
            Code::InvalidTemplate,
            "`$map` requires an `each(item)` or `each(item, index)` property",
        ));
    }

    let mut results = vec![];
    match renderer.render_or_null(source, scope)? {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let mut bound = Map::new();
                bound.insert(names[0].to_string(), item.clone());
                if let Some(index_name) = names.get(1) {
                    bound.insert(index_name.to_string(), Value::from(index as i64));
                }

                let child = scope.child(bound);
                if let Some(rendered) = renderer.render(body, &child)? {
                    results.push(rendered);
                }
            }
        }
        Value::Object(entries) => {
            for (key, val) in &entries {
                let mut entry = Map::new();
                entry.insert("key".to_string(), Value::String(key.clone()));
                entry.insert("val".to_string(), val.clone());

                let mut bound = Map::new();
                bound.insert(names[0].to_string(), Value::Object(entry));
                if let Some(index_name) = names.get(1) {
                    bound.insert(index_name.to_string(), Value::String(key.clone()));
                }

                let child = scope.child(bound);
                if let Some(rendered) = renderer.render(body, &child)? {
                    results.push(rendered);
                }
            }
        }
        other => {
            return Err(error_kind(
                "`$map` source",
                "array or object",
                value::kind(&other),
            ));
        }
    }

    Ok(Some(Value::Array(results)))
}

/// `$reduce` folds the source array left to right, rebinding the
/// accumulator and element names of `each(accumulator, item)` on every
/// iteration, beginning from `initial`.
fn reduce(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$reduce")
        .ok_or_else(|| error_missing_property("$reduce", "$reduce"))?;
    let (names, body) = find_binder(template, "each").ok_or_else(|| {
        Error::new(
            Code::InvalidTemplate,
            "`$reduce` requires an `each(accumulator, item)` or \
            `each(accumulator, item, index)` property",
        )
    })?;
    if names.len() < 2 || names.len() > 3 {
        return Err(Error::new(
            Code::InvalidTemplate,
            "`$reduce` requires an `each(accumulator, item)` or \
            `each(accumulator, item, index)` property",
        ));
    }
    let initial = template
        .get("initial")
        .ok_or_else(|| error_missing_property("$reduce", "initial"))?;

    let items = match renderer.render_or_null(source, scope)? {
        Value::Array(items) => items,
        other => {
            return Err(error_kind("`$reduce` source", "array", value::kind(&other)));
        }
    };

    let mut accumulator = renderer.render_or_null(initial, scope)?;
    for (index, item) in items.iter().enumerate() {
        let mut bound = Map::new();
        bound.insert(names[0].to_string(), accumulator);
        bound.insert(names[1].to_string(), item.clone());
        if let Some(index_name) = names.get(2) {
            bound.insert(index_name.to_string(), Value::from(index as i64));
        }

        let child = scope.child(bound);
        accumulator = renderer.render_or_null(body, &child)?;
    }

    Ok(Some(accumulator))
}

/// `$find` returns the first source element whose condition holds, or
/// null when none match.
///
/// A string condition is evaluated as an expression with the element
/// bound, anything else is rendered as a sub-template and read for truth.
fn find(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$find")
        .ok_or_else(|| error_missing_property("$find", "$find"))?;
    let (names, condition) = find_binder(template, "each").ok_or_else(|| {
        Error::new(
            Code::InvalidTemplate,
            "`$find` requires an `each(item)` property with a condition",
        )
    })?;
    if names.len() != 1 {
        return Err(Error::new(
            Code::InvalidTemplate,
            "`$find` requires an `each(item)` property with a condition",
        ));
    }

    let items = match renderer.render_or_null(source, scope)? {
        Value::Array(items) => items,
        other => {
            return Err(error_kind("`$find` source", "array", value::kind(&other)));
        }
    };

    for item in items {
        let mut bound = Map::new();
        bound.insert(names[0].to_string(), item.clone());
        let child = scope.child(bound);

        let matches = match condition {
            Value::String(expression) => {
                value::is_truthy(&renderer.eval_expression(expression, &child)?)
            }
            other => value::is_truthy(&renderer.render_or_null(other, &child)?),
        };
        if matches {
            return Ok(Some(item));
        }
    }

    Ok(Some(Value::Null))
}

/// `$sort` stably sorts the source array ascending, by natural order of
/// the elements or by a `by(item)` key computed per element.
fn sort(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$sort")
        .ok_or_else(|| error_missing_property("$sort", "$sort"))?;

    let items = match renderer.render_or_null(source, scope)? {
        Value::Array(items) => items,
        other => {
            return Err(error_kind("`$sort` source", "array", value::kind(&other)));
        }
    };

    let mut keyed = Vec::with_capacity(items.len());
    match find_binder(template, "by") {
        Some((names, key_template)) => {
            if names.len() != 1 {
                return Err(Error::new(
                    Code::InvalidTemplate,
                    "`$sort` takes a `by(item)` property naming one variable",
                ));
            }
            for item in items {
                let mut bound = Map::new();
                bound.insert(names[0].to_string(), item.clone());
                let child = scope.child(bound);

                let key = match key_template {
                    Value::String(expression) => renderer.eval_expression(expression, &child)?,
                    other => renderer.render_or_null(other, &child)?,
                };
                keyed.push((SortKey::from(&key), item));
            }
        }
        None => {
            for item in items {
                keyed.push((SortKey::from(&item), item));
            }
        }
    }

    keyed.sort_by(|(a, _), (b, _)| a.compare(b));

    Ok(Some(Value::Array(
        keyed.into_iter().map(|(_, item)| item).collect(),
    )))
}

/// `$reverse` reverses an array, or the characters of a string.
fn reverse(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$reverse")
        .ok_or_else(|| error_missing_property("$reverse", "$reverse"))?;

    match renderer.render_or_null(source, scope)? {
        Value::Array(mut items) => {
            items.reverse();

            Ok(Some(Value::Array(items)))
        }
        Value::String(string) => Ok(Some(Value::String(string.chars().rev().collect()))),
        other => Err(error_kind(
            "`$reverse` source",
            "array or string",
            value::kind(&other),
        )),
    }
}

/// `$flatten` concatenates one level of nested arrays.
fn flatten(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$flatten")
        .ok_or_else(|| error_missing_property("$flatten", "$flatten"))?;

    let items = match renderer.render_or_null(source, scope)? {
        Value::Array(items) => items,
        other => {
            return Err(error_kind("`$flatten` source", "array", value::kind(&other)));
        }
    };

    let mut results = vec![];
    for item in items {
        match item {
            Value::Array(nested) => results.extend(nested),
            other => results.push(other),
        }
    }

    Ok(Some(Value::Array(results)))
}

/// `$flattenDeep` recursively flattens all levels of nested arrays.
fn flatten_deep(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$flattenDeep")
        .ok_or_else(|| error_missing_property("$flattenDeep", "$flattenDeep"))?;

    let items = match renderer.render_or_null(source, scope)? {
        Value::Array(items) => items,
        other => {
            return Err(error_kind(
                "`$flattenDeep` source",
                "array",
                value::kind(&other),
            ));
        }
    };

    let mut results = vec![];
    flatten_into(items, &mut results);

    Ok(Some(Value::Array(results)))
}

fn flatten_into(items: Vec<Value>, results: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(nested) => flatten_into(nested, results),
            other => results.push(other),
        }
    }
}

/// A sort key with a total order over every value kind.
///
/// Numbers and strings order naturally. Null and booleans are opaque,
/// equal among themselves, and everything else compares by its JSON
/// text. Kinds rank null, booleans, numbers, strings, other, so a mixed
/// key set sorts without aborting and equal keys keep their source order
/// under the stable sort.
enum SortKey {
    Null,
    Bool,
    Number(f64),
    Text(String),
    Other(String),
}

impl SortKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SortKey::Null,
            Value::Bool(_) => SortKey::Bool,
            Value::Number(number) => SortKey::Number(number.as_f64().unwrap_or(0.0)),
            Value::String(string) => SortKey::Text(string.clone()),
            composite => SortKey::Other(serde_json::to_string(composite).unwrap_or_default()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Bool => 1,
            SortKey::Number(_) => 2,
            SortKey::Text(_) => 3,
            SortKey::Other(_) => 4,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(l), SortKey::Number(r)) => l.total_cmp(r),
            (SortKey::Text(l), SortKey::Text(r)) => l.cmp(r),
            (SortKey::Other(l), SortKey::Other(r)) => l.cmp(r),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}
