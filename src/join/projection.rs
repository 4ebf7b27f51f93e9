//! Field-list projection.
//!
//! Both the provider-level aggregate object and every per-key record can be
//! narrowed through a field list (`fl`-style): `*` keeps everything, a
//! comma-separated list keeps only the named fields. Projection applies to
//! JSON objects; other values pass through untouched.

use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldProjection {
    All,
    Fields(BTreeSet<String>),
}

impl FieldProjection {
    /// Parses a field-list spec. `*` anywhere in the list, or a blank spec,
    /// selects all fields.
    pub fn parse(spec: &str) -> Self {
        let fields: BTreeSet<String> = spec
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();

        if fields.is_empty() || fields.contains("*") {
            FieldProjection::All
        } else {
            FieldProjection::Fields(fields)
        }
    }

    pub fn project_map(&self, map: &serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
        match self {
            FieldProjection::All => map.clone(),
            FieldProjection::Fields(fields) => map
                .iter()
                .filter(|(key, _)| fields.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }

    pub fn project(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.project_map(map)),
            other => other.clone(),
        }
    }
}

impl Default for FieldProjection {
    fn default() -> Self {
        FieldProjection::All
    }
}
