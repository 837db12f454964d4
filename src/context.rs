use crate::error::OperationError;
use ahash::AHashMap;
use serde_json::{Map, Value};

/// Key under which a loop binds the element of the current iteration.
pub const ITERATOR_ITEM: &str = "iterator_item";

/// The shared, mutable result store threaded through a pipeline run.
///
/// One `Context` is owned by the run and passed by mutable reference to
/// every node. Nested graphs receive either the same reference or a
/// [`project`](Context::project)ed copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: AHashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Like [`get`](Context::get), but a missing key is an error.
    pub fn require(&self, key: &str) -> Result<&Value, OperationError> {
        self.values
            .get(key)
            .ok_or_else(|| OperationError::MissingKey(key.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy of this context without the excluded keys.
    ///
    /// Values are cloned, so mutations inside the projection never reach
    /// the caller's context.
    pub fn project(&self, exclusions: &[String]) -> Context {
        self.values
            .iter()
            .filter(|(key, _)| !exclusions.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Moves every entry of `other` into this context; `other` wins on collision.
    pub fn merge(&mut self, other: Context) {
        self.values.extend(other.values);
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values.into_iter().collect::<Map<String, Value>>())
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// The string form used to key per-element loop results.
pub fn item_key(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
