use crate::log::{Code, Error};
use serde::Serialize;
use serde_json::{to_value, Map, Value};

/// Provides storage for data that templates can be rendered against.
///
/// Bindings in a `Store` form the root scope of a render call. They keep
/// their insertion order, matching the behavior of object keys everywhere
/// else in the engine.
pub struct Store {
    data: Map<String, Value>,
}

impl Store {
    /// Create a new Store.
    #[inline]
    pub fn new() -> Self {
        Self { data: Map::new() }
    }

    /// Create a new Store from the fields of the given [`Value`].
    ///
    /// A non-object value contributes no bindings.
    pub fn from_value(context: &Value) -> Self {
        let data = match context {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        Self { data }
    }

    /// Insert the value into the Store.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    pub fn insert<S, T>(&mut self, key: S, value: T) -> Result<(), Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        let serialized = to_value(&value)
            .map_err(|_| Error::new(Code::InvalidArgument, "unable to serialize value"))?;
        self.data.insert(key.into(), serialized);

        Ok(())
    }

    /// Insert the value into the Store.
    ///
    /// # Panics
    ///
    /// Will panic if the serialization fails.
    #[inline]
    pub fn insert_must<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Serialize,
    {
        self.data.insert(key.into(), to_value(value).unwrap());
    }

    /// Insert the value into the Store.
    ///
    /// Returns the Store, so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    pub fn with<S, T>(mut self, key: S, value: T) -> Result<Self, Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Insert the value into the Store.
    ///
    /// Returns the Store, so additional methods may be chained.
    ///
    /// # Panics
    ///
    /// Will panic if the serialization fails.
    #[inline]
    pub fn with_must<S, T>(mut self, key: S, value: T) -> Self
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert_must(key, value);
        self
    }

    /// Get the value of the given key, if any.
    #[inline]
    pub fn get(&self, index: &str) -> Option<&Value> {
        self.data.get(index)
    }

    /// Return the bindings held by this Store.
    #[inline]
    pub(crate) fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
