//! Structured query keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered list of JSON values identifying one query, e.g. `["article", 7]`.
///
/// Two keys are the same query iff their hashes are equal. The hash is the
/// compact JSON encoding of the key; object members are emitted in sorted
/// order, so logically equal keys always hash the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
    /// Key with a single string segment.
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![Value::String(root.into())])
    }

    /// Append a segment.
    pub fn with(mut self, part: impl Into<Value>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    /// Stable identity used for caching and in the dehydrated payload.
    pub fn hash(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash())
    }
}

impl From<&str> for QueryKey {
    fn from(root: &str) -> Self {
        QueryKey::new(root)
    }
}

impl From<String> for QueryKey {
    fn from(root: String) -> Self {
        QueryKey::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_is_compact_json() {
        let key = QueryKey::new("article").with("7");
        assert_eq!(key.hash(), r#"["article","7"]"#);
    }

    #[test]
    fn test_object_parts_hash_independent_of_insertion_order() {
        let a = QueryKey::new("list").with(json!({"page": 1, "tag": "rust"}));
        let b = QueryKey::new("list").with(json!({"tag": "rust", "page": 1}));
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_serializes_as_array() {
        let key = QueryKey::new("tags").with(3);
        assert_eq!(serde_json::to_value(&key).unwrap(), json!(["tags", 3]));
    }
}
