//! Table objects

use crate::objects::child::Child;
use serde_json::Value;

/// A table object in Sumo (CSV, parquet or arrow blob)
#[derive(Debug)]
pub struct Table {
    child: Child,
}

impl Table {
    pub fn new(child: Child) -> Self {
        Self { child }
    }

    pub fn child(&self) -> &Child {
        &self.child
    }

    /// Column names from `data.spec.columns`
    pub fn columns(&self) -> Vec<&str> {
        self.child
            .document()
            .get_property(&["data", "spec", "columns"])
            .and_then(Value::as_array)
            .map(|cols| cols.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl std::ops::Deref for Table {
    type Target = Child;

    fn deref(&self) -> &Child {
        &self.child
    }
}
