//! Template operators.
//!
//! Operators are `$`-prefixed keys that transfer control of rendering an
//! object node to dedicated logic. They are grouped by family, each module
//! exposing its entries through an `operators` method. The combined table
//! is built once per [`Engine`][`crate::Engine`] and never mutated
//! afterward.

pub mod binding;
pub mod logic;
pub mod object;
pub mod sequence;
pub mod time;

use crate::{log::Error, render::Renderer, scope::Scope};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A template operator.
///
/// Operators receive the whole object node they were found in, the scope
/// in effect, and the [`Renderer`] for recursing into sub-templates.
/// Returning `None` deletes the node from the surrounding output.
pub(crate) type Operator =
    fn(&Map<String, Value>, &Scope, &Renderer) -> Result<Option<Value>, Error>;

/// All operators combined into a name keyed table.
pub(crate) fn all_operators() -> HashMap<&'static str, Operator> {
    let mut table = HashMap::new();

    for (name, operator) in logic::operators()
        .into_iter()
        .chain(binding::operators())
        .chain(sequence::operators())
        .chain(object::operators())
        .chain(time::operators())
    {
        table.insert(name, operator);
    }

    table
}

/// Find the first binder key with the given head in the node, such as
/// `each(item, index)` for head `each`, and return its bound names along
/// with the key's value.
///
/// Keys that begin with the head but do not parse are passed over.
pub(crate) fn find_binder<'t>(
    template: &'t Map<String, Value>,
    head: &str,
) -> Option<(Vec<&'t str>, &'t Value)> {
    for (key, value) in template {
        if key.starts_with(head) {
            if let Some(names) = parse_binder(key, head) {
                return Some((names, value));
            }
        }
    }

    None
}

/// Parse a binder head such as `each(item, index)` or `by(key)` into its
/// bound names.
///
/// The grammar admits the head, a parenthesized comma separated list of
/// names, and optional whitespace after each comma. Names are word
/// characters.
fn parse_binder<'k>(key: &'k str, head: &str) -> Option<Vec<&'k str>> {
    let body = key
        .strip_prefix(head)?
        .strip_prefix('(')?
        .strip_suffix(')')?;

    let mut names = vec![];
    for (index, part) in body.split(',').enumerate() {
        let name = if index == 0 { part } else { part.trim_start() };
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        names.push(name);
    }

    Some(names)
}
