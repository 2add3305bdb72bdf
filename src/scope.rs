use crate::store::Store;
use serde_json::{Map, Value};

/// A single level of lexical scope during rendering.
///
/// Each scope owns only its local bindings and a reference to its parent,
/// so creating a child for a `$let` body or a `$map` iteration never copies
/// ancestor state. Lookup walks the chain outward, letting a child shadow
/// its parent.
pub(crate) struct Scope<'a> {
    /// Names bound at this level.
    data: Map<String, Value>,
    /// The enclosing scope, if any.
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// Create a root Scope from the bindings of the given [`Store`].
    pub fn root(store: &Store) -> Scope<'static> {
        Scope {
            data: store.data().clone(),
            parent: None,
        }
    }

    /// Create a child Scope with the given local bindings.
    pub fn child(&'a self, data: Map<String, Value>) -> Scope<'a> {
        Scope {
            data,
            parent: Some(self),
        }
    }

    /// Return the value bound to the given name, checking parent scopes
    /// when this scope has no local binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.data.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|parent| parent.get(name)),
        }
    }

    /// Return true if the given name resolves in this scope or any parent.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::Scope;
    use crate::store::Store;
    use serde_json::{json, Map};

    #[test]
    fn test_lookup_walks_outward() {
        let store = Store::new().with_must("a", 1).with_must("b", 2);
        let root = Scope::root(&store);

        let mut bindings = Map::new();
        bindings.insert("b".to_string(), json!(20));
        let child = root.child(bindings);

        assert_eq!(child.get("a"), Some(&json!(1)));
        assert_eq!(child.get("b"), Some(&json!(20)));
        assert_eq!(root.get("b"), Some(&json!(2)));
        assert!(!child.has("c"));
    }

    #[test]
    fn test_grandchild_shadowing() {
        let store = Store::new().with_must("x", "root");
        let root = Scope::root(&store);

        let mut first = Map::new();
        first.insert("x".to_string(), json!("outer"));
        let outer = root.child(first);

        let inner = outer.child(Map::new());

        assert_eq!(inner.get("x"), Some(&json!("outer")));
    }
}
