use super::Operator;
use crate::{
    log::{error_kind, error_missing_property, Code, Error},
    render::Renderer,
    scope::Scope,
    value,
};
use serde_json::{Map, Value};

/// Evaluation and branching operators.
pub(crate) fn operators() -> Vec<(&'static str, Operator)> {
    vec![
        ("$eval", eval),
        ("$if", if_then_else),
        ("$switch", switch),
        ("$match", match_all),
    ]
}

/// `$eval` evaluates a string expression into a value.
fn eval(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let source = template
        .get("$eval")
        .ok_or_else(|| error_missing_property("$eval", "$eval"))?;

    let Value::String(expression) = source else {
        return Err(error_kind("`$eval` expression", "string", value::kind(source)));
    };

    Ok(Some(renderer.eval_expression(expression, scope)?))
}

/// `$if` renders the `then` or `else` branch of the node, by the truth of
/// its condition. An absent taken branch deletes the node.
fn if_then_else(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let condition = template
        .get("$if")
        .ok_or_else(|| error_missing_property("$if", "$if"))?;

    let branch = if renderer.truthy(condition, scope)? {
        template.get("then")
    } else {
        template.get("else")
    };

    match branch {
        Some(branch) => renderer.render(branch, scope),
        None => Ok(None),
    }
}

/// `$switch` renders the value of the first case whose key expression is
/// truthy, falling back to `$default`.
fn switch(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let cases = template
        .get("$switch")
        .ok_or_else(|| error_missing_property("$switch", "$switch"))?;

    let Value::Object(cases) = cases else {
        return Err(error_kind("`$switch` cases", "object", value::kind(cases)));
    };

    let mut default = None;
    for (case, outcome) in cases {
        if case == "$default" {
            default = Some(outcome);
            continue;
        }
        if value::is_truthy(&renderer.eval_expression(case, scope)?) {
            return renderer.render(outcome, scope);
        }
    }

    match default {
        Some(outcome) => renderer.render(outcome, scope),
        None => Err(Error::new(
            Code::InvalidTemplate,
            "`$switch` has no matching case and no default",
        )),
    }
}

/// `$match` renders the values of every case whose key expression is
/// truthy, collected into an array in declaration order.
fn match_all(
    template: &Map<String, Value>,
    scope: &Scope,
    renderer: &Renderer,
) -> Result<Option<Value>, Error> {
    let cases = template
        .get("$match")
        .ok_or_else(|| error_missing_property("$match", "$match"))?;

    let Value::Object(cases) = cases else {
        return Err(error_kind("`$match` cases", "object", value::kind(cases)));
    };

    let mut matched = false;
    let mut results = vec![];
    for (case, outcome) in cases {
        if value::is_truthy(&renderer.eval_expression(case, scope)?) {
            matched = true;
            if let Some(rendered) = renderer.render(outcome, scope)? {
                results.push(rendered);
            }
        }
    }

    if !matched {
        return Err(Error::new(
            Code::InvalidTemplate,
            "`$match` has no matching case",
        ));
    }

    Ok(Some(Value::Array(results)))
}

#[cfg(test)]
mod tests {
    use crate::{log::Code, Engine, Error, Store};
    use serde_json::{json, Value};

    #[test]
    fn test_eval() {
        assert_eq!(helper_render(json!({"$eval": "1 + 2"})), Ok(json!(3)));

        let error = helper_render(json!({"$eval": 5})).unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    #[test]
    fn test_if_branches() {
        let template = json!({"$if": "level > 5", "then": "high", "else": "low"});
        let engine = Engine::default();

        let high = Store::new().with_must("level", 10);
        assert_eq!(engine.render(&template, &high), Ok(json!("high")));

        let low = Store::new().with_must("level", 1);
        assert_eq!(engine.render(&template, &low), Ok(json!("low")));
    }

    #[test]
    fn test_if_literal_condition() {
        assert_eq!(
            helper_render(json!({"$if": true, "then": 1, "else": 2})),
            Ok(json!(1))
        );
        assert_eq!(
            helper_render(json!({"$if": [], "then": 1, "else": 2})),
            Ok(json!(2))
        );
    }

    #[test]
    fn test_if_without_taken_branch_deletes() {
        assert_eq!(
            helper_render(json!({"a": {"$if": "false", "then": 1}, "b": 2})),
            Ok(json!({"b": 2}))
        );
        assert_eq!(
            helper_render(json!([1, {"$if": "false", "then": 2}, 3])),
            Ok(json!([1, 3]))
        );
    }

    #[test]
    fn test_switch_first_truthy_wins() {
        let template = json!({"$switch": {
            "false": "one",
            "true": "two",
            "1 == 1": "three"
        }});

        assert_eq!(helper_render(template), Ok(json!("two")));
    }

    #[test]
    fn test_switch_default() {
        let template = json!({"$switch": {"false": 1, "$default": "fallback"}});
        assert_eq!(helper_render(template), Ok(json!("fallback")));

        let error = helper_render(json!({"$switch": {"false": 1}})).unwrap_err();
        assert_eq!(error.code(), Code::InvalidTemplate);
    }

    #[test]
    fn test_match_collects_in_order() {
        let template = json!({"$match": {
            "2 > 1": "first",
            "false": "skipped",
            "1 in [1]": "second"
        }});

        assert_eq!(helper_render(template), Ok(json!(["first", "second"])));
    }

    #[test]
    fn test_match_requires_a_match() {
        let error = helper_render(json!({"$match": {"false": 1}})).unwrap_err();
        assert_eq!(error.code(), Code::InvalidTemplate);
    }

    fn helper_render(template: Value) -> Result<Value, Error> {
        Engine::default().render(&template, &Store::new())
    }
}
