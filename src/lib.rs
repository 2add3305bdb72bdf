//! Stencil - JSON Template Engine
//!
//! Renders a JSON template, a JSON value carrying embedded directives,
//! against a JSON context of variables, producing a new JSON value with
//! every directive resolved.
//!
//! Directives come in three forms:
//!
//! - Operators, `$`-prefixed keys such as `$if`, `$map` and `$eval`,
//!   which hand their object node to dedicated logic.
//! - Interpolation, `${...}` spans inside strings, substituted with the
//!   evaluated expression.
//! - Special keys, the `$$name` escape, `${expr}` dynamic keys and the
//!   `"name $if"` conditional suffix.
//!
//! ```
//! use serde_json::json;
//!
//! let template = json!({
//!     "$map": [1, 2, 3],
//!     "each(x)": {"$eval": "x * 2"}
//! });
//! let result = stencil::render(&template, &json!({}));
//!
//! assert_eq!(result.unwrap(), json!([2, 4, 6]));
//! ```
//!
//! The free functions share one lazily built [`Engine`]; construct your
//! own to hold it somewhere specific, and pair it with a [`Store`] to
//! build contexts from native values:
//!
//! ```
//! use serde_json::json;
//! use stencil::{Engine, Store};
//!
//! let engine = Engine::default();
//! let store = Store::new().with_must("name", "taylor");
//!
//! let result = engine.render(&json!("hello, ${name}!"), &store);
//! assert_eq!(result.unwrap(), json!("hello, taylor!"));
//! ```
mod compile;
mod datetime;
mod engine;
mod eval;
mod function;
mod log;
mod operator;
mod region;
mod render;
mod scope;
mod store;
mod syntax;
mod value;

pub use engine::Engine;
pub use log::{Code, Error, Pointer, Visual};
pub use region::Region;
pub use store::Store;

use serde_json::Value;
use std::sync::OnceLock;

/// Return the shared [`Engine`], built on first use.
///
/// The function and operator tables are populated exactly once, before
/// any render can observe them, so lookups never synchronize.
fn shared() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();

    ENGINE.get_or_init(Engine::default)
}

/// Render a template against the given context.
///
/// The fields of a context object become the root variable scope. A
/// template whose whole value deletes itself renders to null.
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
///
/// let result = stencil::render(
///     &json!({"$eval": "a + 1"}),
///     &json!({"a": 2}),
/// );
///
/// assert_eq!(result.unwrap(), json!(3));
/// ```
pub fn render(template: &Value, context: &Value) -> Result<Value, Error> {
    shared().render(template, &Store::from_value(context))
}

/// Render a template with an empty context.
///
/// # Errors
///
/// Propagates any [`Error`] from [`render`].
pub fn render_default(template: &Value) -> Result<Value, Error> {
    shared().render(template, &Store::new())
}

/// Render a template from JSON text, returning compact JSON text.
///
/// # Errors
///
/// Returns an [`Error`] when either argument is not valid JSON, or
/// rendering fails.
pub fn render_str(template: &str, context: &str) -> Result<String, Error> {
    shared().render_str(template, context)
}

/// Verify that every `$`-prefixed key in the template is a registered
/// operator or special form, without rendering anything.
///
/// # Errors
///
/// Returns an [`Error`] with code [`Code::InvalidOperator`] naming the
/// first unrecognized key.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// assert!(stencil::validate(&json!({"$if": "true", "then": 1})).is_ok());
/// assert!(stencil::validate(&json!({"$bogus": 1})).is_err());
/// ```
pub fn validate(template: &Value) -> Result<(), Error> {
    shared().validate(template)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn test_render_free_function() {
        let result = super::render(
            &json!({"message": "Hello ${name}!"}),
            &json!({"name": "World"}),
        );

        assert_eq!(result.unwrap(), json!({"message": "Hello World!"}));
    }

    #[test]
    fn test_render_default_context() {
        assert_eq!(
            super::render_default(&json!({"$eval": "1 + 1"})).unwrap(),
            json!(2)
        );
    }

    #[test]
    fn test_render_ignores_non_object_context() {
        assert_eq!(super::render(&json!("hi"), &json!([1, 2])).unwrap(), json!("hi"));
    }
}
