use crate::{
    compile,
    engine::Engine,
    log::{error_kind, Code, Error},
    operator::Operator,
    scope::Scope,
    syntax::Marker,
    value,
};
use serde_json::{Map, Value};

/// Walks a template tree and produces output values.
///
/// The renderer owns no state of its own, it borrows the [`Engine`] for
/// the registries and the interpolation finder. Rendering a node yields
/// `None` when the node deletes itself, such as an `$if` with no taken
/// branch; containers filter those out as they assemble.
pub(crate) struct Renderer<'engine> {
    /// An engine containing the function and operator tables.
    engine: &'engine Engine,
}

impl<'engine> Renderer<'engine> {
    /// Create a new Renderer over the given [`Engine`].
    pub fn new(engine: &'engine Engine) -> Self {
        Renderer { engine }
    }

    /// Render a template node against the given scope.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an operator is misused or any embedded
    /// expression fails to evaluate.
    pub fn render(&self, template: &Value, scope: &Scope) -> Result<Option<Value>, Error> {
        match template {
            Value::Object(map) => self.render_object(map, scope),
            Value::Array(items) => self.render_array(items, scope),
            Value::String(text) => Ok(Some(self.render_string(text, scope)?)),
            other => Ok(Some(other.clone())),
        }
    }

    /// Render a template node, reading deletion as null.
    ///
    /// Operators use this for their source fields, where a deleted value
    /// has no position to vanish from.
    pub fn render_or_null(&self, template: &Value, scope: &Scope) -> Result<Value, Error> {
        Ok(self.render(template, scope)?.unwrap_or(Value::Null))
    }

    /// Compile and evaluate an expression string against the given scope.
    pub fn eval_expression(&self, source: &str, scope: &Scope) -> Result<Value, Error> {
        compile::compile(source)?.eval(self.engine, scope)
    }

    /// Read a condition value for truth.
    ///
    /// A string condition is evaluated as an expression, anything else is
    /// taken by its own truthiness.
    pub fn truthy(&self, condition: &Value, scope: &Scope) -> Result<bool, Error> {
        match condition {
            Value::String(text) => Ok(value::is_truthy(&self.eval_expression(text, scope)?)),
            other => Ok(value::is_truthy(other)),
        }
    }

    /// Render an object node.
    ///
    /// When a registered operator key is present, the whole node belongs
    /// to that operator. Otherwise keys are processed in declaration
    /// order, applying the `$$` escape, `${expr}` dynamic keys and the
    /// `" $if"` conditional key suffix.
    fn render_object(
        &self,
        template: &Map<String, Value>,
        scope: &Scope,
    ) -> Result<Option<Value>, Error> {
        if let Some(operator) = self.find_operator(template) {
            return operator(template, scope, self);
        }

        let mut result = Map::new();
        for (key, template_value) in template {
            let key = if let Some(stripped) = key.strip_prefix("$$") {
                format!("${stripped}")
            } else if key.starts_with('$') && key.contains('{') && key.ends_with('}') {
                let expression = &key[2..key.len() - 1];
                match self.eval_expression(expression, scope)? {
                    Value::String(text) => text,
                    other => {
                        return Err(error_kind("dynamic key", "string", value::kind(&other)));
                    }
                }
            } else {
                key.clone()
            };

            if let Some(stripped) = key.strip_suffix(" $if") {
                self.render_conditional_key(stripped, template_value, scope, &mut result)?;
                continue;
            }

            if let Some(rendered) = self.render(template_value, scope)? {
                result.insert(key, rendered);
            }
        }

        Ok(Some(Value::Object(result)))
    }

    /// Render the value of a `"name $if"` key.
    ///
    /// The value must be an object holding a `$if` condition and optional
    /// `then`/`else` branches. The stripped key is included only when the
    /// taken branch exists and survives rendering.
    fn render_conditional_key(
        &self,
        key: &str,
        template_value: &Value,
        scope: &Scope,
        result: &mut Map<String, Value>,
    ) -> Result<(), Error> {
        let branches = match template_value {
            Value::Object(map) if map.contains_key("$if") => map,
            _ => {
                return Err(Error::new(
                    Code::InvalidTemplate,
                    format!(
                        "key `{key} $if` requires an object value with a `$if` property"
                    ),
                ));
            }
        };

        let condition = &branches["$if"];
        let branch = if self.truthy(condition, scope)? {
            branches.get("then")
        } else {
            branches.get("else")
        };

        if let Some(branch) = branch {
            if let Some(rendered) = self.render(branch, scope)? {
                result.insert(key.to_string(), rendered);
            }
        }

        Ok(())
    }

    /// Render an array node, dropping deleted elements.
    fn render_array(&self, items: &[Value], scope: &Scope) -> Result<Option<Value>, Error> {
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            if let Some(rendered) = self.render(item, scope)? {
                result.push(rendered);
            }
        }

        Ok(Some(Value::Array(result)))
    }

    /// Render a string node, substituting `${...}` interpolation spans.
    ///
    /// A span body runs to the first `}`, and may itself contain `${`. An
    /// empty body, or a `${` with no closing brace anywhere after it,
    /// stays literal. Strings without spans are returned unchanged.
    fn render_string(&self, text: &str, scope: &Scope) -> Result<Value, Error> {
        let finder = self.engine.finder();
        let mut output = String::new();
        let mut cursor = 0;
        let mut substituted = false;

        let mut position = 0;
        while let Some((id, begin, end)) = finder.next(text, position) {
            if !matches!(Marker::from(id), Marker::BeginInterpolation) {
                // A bare `}` is literal text.
                position = end;
                continue;
            }

            let Some((close_begin, close_end)) = self.find_close(text, end) else {
                break;
            };

            let body = &text[end..close_begin];
            if body.is_empty() {
                position = close_end;
                continue;
            }

            let evaluated = self.eval_expression(body, scope)?;
            output.push_str(&text[cursor..begin]);
            output.push_str(&value::stringify(&evaluated));
            cursor = close_end;
            position = close_end;
            substituted = true;
        }

        if !substituted {
            return Ok(Value::String(text.to_string()));
        }

        output.push_str(&text[cursor..]);
        Ok(Value::String(output))
    }

    /// Locate the `}` closing an interpolation span, skipping any `${`
    /// markers inside the body.
    fn find_close(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        let finder = self.engine.finder();
        let mut seek = from;

        while let Some((id, begin, end)) = finder.next(text, seek) {
            if matches!(Marker::from(id), Marker::EndInterpolation) {
                return Some((begin, end));
            }
            seek = end;
        }

        None
    }

    /// Return the first registered operator named by a `$` key of the
    /// node, in key declaration order.
    fn find_operator(&self, template: &Map<String, Value>) -> Option<Operator> {
        for key in template.keys() {
            if key.starts_with('$') {
                if let Some(operator) = self.engine.get_operator(key) {
                    return Some(*operator);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use crate::{log::Code, Engine, Error, Store};
    use serde_json::{json, Value};

    #[test]
    fn test_scalars_pass_through() {
        for template in [json!(null), json!(true), json!(5), json!([1, {"a": "b"}])] {
            assert_eq!(helper_render(template.clone()), Ok(template));
        }
    }

    #[test]
    fn test_interpolation() {
        let template = json!({"greeting": "Hello ${name}!"});
        let store = Store::new().with_must("name", "World");

        assert_eq!(
            Engine::default().render(&template, &store),
            Ok(json!({"greeting": "Hello World!"}))
        );
    }

    #[test]
    fn test_interpolation_stringifies() {
        let store = Store::new()
            .with_must("n", 2.0)
            .with_must("f", 2.5)
            .with_must("b", true)
            .with_must("nothing", Value::Null);
        let template = json!("${n} ${f} ${b} ${nothing}");

        assert_eq!(
            Engine::default().render(&template, &store),
            Ok(json!("2 2.5 true null"))
        );
    }

    #[test]
    fn test_interpolation_literal_edges() {
        // No spans, empty bodies and unterminated spans stay literal.
        assert_eq!(helper_render(json!("plain } text")), Ok(json!("plain } text")));
        assert_eq!(helper_render(json!("${}")), Ok(json!("${}")));
        assert_eq!(helper_render(json!("x ${1 + 1")), Ok(json!("x ${1 + 1")));
        assert_eq!(helper_render(json!("${} ${1 + 1}")), Ok(json!("${} 2")));
    }

    #[test]
    fn test_interpolation_multiple_spans() {
        assert_eq!(
            helper_render(json!("${1 + 1} and ${2 * 2}")),
            Ok(json!("2 and 4"))
        );
    }

    #[test]
    fn test_escaped_keys() {
        assert_eq!(
            helper_render(json!({"$$eval": "1 + 2"})),
            Ok(json!({"$eval": "1 + 2"}))
        );
        assert_eq!(
            helper_render(json!({"$$$eval": 1})),
            Ok(json!({"$$eval": 1}))
        );
    }

    #[test]
    fn test_dynamic_keys() {
        let template = json!({"${'the' + 'Key'}": 1});
        assert_eq!(helper_render(template), Ok(json!({"theKey": 1})));

        let error = helper_render(json!({"${5}": 1})).unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    #[test]
    fn test_conditional_key_suffix() {
        let template = json!({
            "debug $if": {"$if": "level > 5", "then": true},
            "name": "service"
        });
        let engine = Engine::default();

        let verbose = Store::new().with_must("level", 9);
        assert_eq!(
            engine.render(&template, &verbose),
            Ok(json!({"debug": true, "name": "service"}))
        );

        let quiet = Store::new().with_must("level", 1);
        assert_eq!(engine.render(&template, &quiet), Ok(json!({"name": "service"})));
    }

    #[test]
    fn test_conditional_key_else_branch() {
        let template = json!({"mode $if": {"$if": "false", "then": "on", "else": "off"}});

        assert_eq!(helper_render(template), Ok(json!({"mode": "off"})));
    }

    #[test]
    fn test_conditional_key_requires_if_object() {
        let error = helper_render(json!({"mode $if": "yes"})).unwrap_err();
        assert_eq!(error.code(), Code::InvalidTemplate);

        let error = helper_render(json!({"mode $if": {"then": 1}})).unwrap_err();
        assert_eq!(error.code(), Code::InvalidTemplate);
    }

    #[test]
    fn test_operators_nest() {
        let template = json!({
            "$if": "true",
            "then": {"$map": [1, 2], "each(x)": "${x * 10}"}
        });

        assert_eq!(helper_render(template), Ok(json!(["10", "20"])));
    }

    #[test]
    fn test_first_operator_key_wins() {
        // `$if` is declared first, the `$map` key is just its payload.
        let template = json!({"$if": "true", "then": 1, "$map": 2});

        assert_eq!(helper_render(template), Ok(json!(1)));
    }

    #[test]
    fn test_whole_template_deletion_yields_null() {
        assert_eq!(helper_render(json!({"$if": "false", "then": 1})), Ok(json!(null)));
    }

    fn helper_render(template: Value) -> Result<Value, Error> {
        Engine::default().render(&template, &Store::new())
    }
}
