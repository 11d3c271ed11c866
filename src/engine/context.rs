// SPDX-License-Identifier: MIT

//! Ordered key/value carrier threaded through a run

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shared data passed from node to node.
///
/// Keys keep their insertion order; overwriting a key keeps its position.
/// Metadata is kept apart from the data and is never serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(flatten)]
    data: Map<String, Value>,
    #[serde(skip)]
    metadata: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON value; `null` yields an empty context
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(data) => Ok(Self::from(data)),
            other => Err(serde::de::Error::custom(format!(
                "context must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a nested value using dot notation (e.g., "result.intent")
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.data.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                other => other.get(part)?,
            };
        }
        Some(current)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Merge a partial update, in the update's own key order
    pub fn merge(&mut self, update: Map<String, Value>) {
        for (key, value) in update {
            self.data.insert(key, value);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Convert the data to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(self.data.clone())
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

impl From<Map<String, Value>> for Context {
    fn from(data: Map<String, Value>) -> Self {
        Self {
            data,
            metadata: Map::new(),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_merge_overwrites_and_appends() {
        let mut ctx = Context::from(map(json!({"a": 1, "b": 2})));
        ctx.merge(map(json!({"c": 3, "a": 10})));

        assert_eq!(ctx.to_json(), json!({"a": 10, "b": 2, "c": 3}));
        let keys: Vec<&String> = ctx.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_merge_follows_update_order() {
        let mut ctx = Context::new();
        ctx.merge(map(json!({"z": 1, "y": 2, "x": 3})));
        let keys: Vec<&String> = ctx.keys().collect();
        assert_eq!(keys, ["z", "y", "x"]);
    }

    #[test]
    fn test_get_path() {
        let mut ctx = Context::new();
        ctx.set("result", json!({"data": {"value": 42}, "items": ["a", "b"]}));

        assert_eq!(ctx.get_path("result.data.value"), Some(&json!(42)));
        assert_eq!(ctx.get_path("result.items.1"), Some(&json!("b")));
        assert_eq!(ctx.get_path("result.nonexistent"), None);
        assert_eq!(ctx.get_path("missing"), None);
    }

    #[test]
    fn test_from_value() {
        assert!(Context::from_value(Value::Null).unwrap().is_empty());
        assert_eq!(
            Context::from_value(json!({"k": "v"})).unwrap().get("k"),
            Some(&json!("v"))
        );
        assert!(Context::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_metadata_is_not_serialized() {
        let mut ctx = Context::new();
        ctx.set("msg", json!("hi"));
        ctx.set_metadata("run_id", json!("abc"));

        assert_eq!(ctx.metadata("run_id"), Some(&json!("abc")));
        assert_eq!(serde_json::to_value(&ctx).unwrap(), json!({"msg": "hi"}));
    }

    #[test]
    fn test_deserialize() {
        let ctx: Context = serde_json::from_value(json!({"a": [1, 2], "b": null})).unwrap();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("b"), Some(&Value::Null));
    }
}
