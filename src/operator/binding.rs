use super::Operator;
use crate::{
    log::{error_kind, error_missing_property, Error},
    render::Renderer,
    scope::Scope,
    value,
};
use serde_json::{Map, Value};

/// Scope binding operators.
pub(crate) fn operators() -> Vec<(&'static str, Operator)> {
    vec![("$let", let_in)]
}

/// `$let` renders each binding in the outer scope, then renders the `in`
/// body against one new child scope holding them all.
fn let_in(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let bindings = template
        .get("$let")
        .ok_or_else(|| error_missing_property("$let", "$let"))?;
    let body = template
        .get("in")
        .ok_or_else(|| error_missing_property("$let", "in"))?;

    let Value::Object(bindings) = bindings else {
        return Err(error_kind(
            "`$let` bindings",
            "object",
            value::kind(bindings),
        ));
    };

    let mut bound = Map::new();
    for (name, template) in bindings {
        if let Some(rendered) = renderer.render(template, scope)? {
            bound.insert(name.clone(), rendered);
        }
    }

    let child = scope.child(bound);
    renderer.render(body, &child)
}
