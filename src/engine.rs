use crate::{
    function::{self, Function},
    log::{Code, Error},
    operator::{self, Operator},
    render::Renderer,
    scope::Scope,
    store::Store,
    syntax,
};
use morel::Finder;
use serde_json::Value;
use std::collections::HashMap;

/// Renders and validates templates, and provides storage for the built-in
/// function and operator tables.
///
/// An `Engine` is immutable once constructed, so one instance may be
/// shared freely across threads and render calls.
pub struct Engine {
    /// Functions callable from expressions.
    functions: HashMap<&'static str, Function>,
    /// Operators recognized at object nodes.
    operators: HashMap<&'static str, Operator>,
    /// Compiled [`Finder`] instance used to search for interpolation
    /// markers in string values.
    finder: Finder,
}

impl Engine {
    /// Create a new instance of [`Engine`] with the built-in functions
    /// and operators registered.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a template against the given [`Store`].
    ///
    /// A template whose whole value deletes itself renders to null.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the template misuses an operator, or an
    /// embedded expression fails to evaluate.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use stencil::{Engine, Store};
    ///
    /// let engine = Engine::default();
    /// let store = Store::new().with_must("name", "taylor");
    /// let result = engine.render(&json!("hello, ${name}!"), &store);
    ///
    /// assert_eq!(result.unwrap(), json!("hello, taylor!"))
    /// ```
    pub fn render(&self, template: &Value, store: &Store) -> Result<Value, Error> {
        let scope = Scope::root(store);
        let renderer = Renderer::new(self);

        Ok(renderer.render(template, &scope)?.unwrap_or(Value::Null))
    }

    /// Render a template from JSON text, returning compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when either argument is not valid JSON, or
    /// rendering fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use stencil::Engine;
    ///
    /// let engine = Engine::default();
    /// let result = engine.render_str(r#"{"$eval": "a + 1"}"#, r#"{"a": 2}"#);
    ///
    /// assert_eq!(result.unwrap(), "3");
    /// ```
    pub fn render_str(&self, template: &str, context: &str) -> Result<String, Error> {
        let template: Value = serde_json::from_str(template).map_err(|error| {
            Error::new(
                Code::InvalidTemplate,
                format!("template is not valid JSON: {error}"),
            )
        })?;
        let context: Value = serde_json::from_str(context).map_err(|error| {
            Error::new(
                Code::InvalidArgument,
                format!("context is not valid JSON: {error}"),
            )
        })?;

        let result = self.render(&template, &Store::from_value(&context))?;

        Ok(result.to_string())
    }

    /// Verify that every `$`-prefixed key in the template is a registered
    /// operator or special form, without rendering anything.
    ///
    /// Escaped keys (`$$name`), the `$default` case of `$switch`, dynamic
    /// keys (containing `{`) and the `" $if"` conditional suffix are the
    /// recognized special forms.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] with code [`Code::InvalidOperator`] naming
    /// the first unrecognized key.
    pub fn validate(&self, template: &Value) -> Result<(), Error> {
        match template {
            Value::Object(map) => {
                for (key, value) in map {
                    if key.starts_with('$')
                        && !key.starts_with("$$")
                        && !self.is_operator(key)
                        && key != "$default"
                        && !key.contains('{')
                        && !key.ends_with(" $if")
                    {
                        return Err(Error::new(
                            Code::InvalidOperator,
                            format!("unknown operator `{key}`"),
                        ));
                    }
                    self.validate(value)?;
                }

                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    self.validate(item)?;
                }

                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Return the function with the given name, if registered.
    #[inline]
    pub(crate) fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Return the operator with the given name, if registered.
    #[inline]
    pub(crate) fn get_operator(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    /// Return true if the given name is a registered operator.
    #[inline]
    pub(crate) fn is_operator(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Return the interpolation marker [`Finder`].
    #[inline]
    pub(crate) fn finder(&self) -> &Finder {
        &self.finder
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            functions: function::all_functions(),
            operators: operator::all_operators(),
            finder: Finder::new(syntax::to_syntax()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::{log::Code, Store};
    use serde_json::json;

    #[test]
    fn test_render_str() {
        let engine = Engine::default();

        let result = engine.render_str(
            r#"{"sum": {"$eval": "a + 1"}, "plain": [true, null]}"#,
            r#"{"a": 2}"#,
        );
        assert_eq!(result.unwrap(), r#"{"sum":3,"plain":[true,null]}"#);

        let error = engine.render_str("{not json", "{}").unwrap_err();
        assert_eq!(error.code(), Code::InvalidTemplate);
    }

    #[test]
    fn test_validate_accepts_special_forms() {
        let engine = Engine::default();
        let template = json!({
            "$if": "true",
            "then": {
                "$$escaped": 1,
                "${'dynamic'}": 2,
                "maybe $if": {"$if": "false"},
                "nested": [{"$map": [], "each(x)": "${x}"}],
                "cases": {"$switch": {"$default": 1}}
            }
        });

        assert_eq!(engine.validate(&template), Ok(()));
    }

    #[test]
    fn test_validate_rejects_unknown_operators() {
        let engine = Engine::default();

        for template in [
            json!({"$bogus": 1}),
            json!([{"deep": {"$nope": 1}}]),
            json!({"$if": "true", "then": {"$Map": 1}}),
        ] {
            let error = engine.validate(&template).unwrap_err();
            assert_eq!(error.code(), Code::InvalidOperator, "{template}");
        }
    }

    #[test]
    fn test_render_does_not_mutate_inputs() {
        let engine = Engine::default();
        let template = json!({"a": "${x}"});
        let store = Store::new().with_must("x", 1);

        engine.render(&template, &store).unwrap();
        assert_eq!(template, json!({"a": "${x}"}));
        assert_eq!(store.get("x"), Some(&json!(1)));
    }
}
