//! Built-in functions callable from expressions.
//!
//! Functions are grouped by family, each module exposing its entries
//! through a `functions` method. The combined table is built once per
//! [`Engine`][`crate::Engine`] and never mutated afterward.

pub mod kind;
pub mod math;
pub mod text;
pub mod util;

use crate::{log::Error, scope::Scope};
use serde_json::Value;
use std::collections::HashMap;

/// A built-in function.
///
/// Arguments arrive already evaluated. The scope of the call site is
/// available for the few functions that inspect it, such as `defined`.
pub(crate) type Function = fn(&[Value], &Scope) -> Result<Value, Error>;

/// All functions combined into a name keyed table.
pub(crate) fn all_functions() -> HashMap<&'static str, Function> {
    let mut table = HashMap::new();

    for (name, function) in math::functions()
        .into_iter()
        .chain(text::functions())
        .chain(kind::functions())
        .chain(util::functions())
    {
        table.insert(name, function);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::all_functions;

    #[test]
    fn test_every_family_is_registered() {
        let table = all_functions();

        for name in [
            "min", "max", "sqrt", "ceil", "floor", "abs", "lowercase", "uppercase", "strip",
            "lstrip", "rstrip", "split", "join", "typeof", "str", "number", "len", "range",
            "defined", "fromNow",
        ] {
            assert!(table.contains_key(name), "`{name}` should be registered");
        }
        assert_eq!(table.len(), 20);
    }
}
