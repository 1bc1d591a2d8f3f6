//! Read-only view over one metadata document

use crate::response::RawHit;
use serde_json::Value;

/// A Sumo document: its id and `_source` metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    metadata: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, metadata: Value) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Value at a nested path, `None` as soon as a segment is missing
    pub fn get_property(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.metadata, |current, key| current.get(*key))
            .filter(|value| !value.is_null())
    }

    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get_property(path).and_then(Value::as_str)
    }

    pub fn get_i64(&self, path: &[&str]) -> Option<i64> {
        self.get_property(path).and_then(Value::as_i64)
    }
}

impl From<RawHit> for Document {
    fn from(hit: RawHit) -> Self {
        Self::new(hit.id, hit.source)
    }
}
