//! Request parameter map.
//!
//! Keys are flat dotted strings as they arrive on the query URL
//! (`seqjoin.external.sequence=MKT...`). Ordered storage keeps parameter
//! iteration deterministic.

use crate::error::{Result, XJoinError};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    values: BTreeMap<String, String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean request flag; absent or unparsable values fall back to the
    /// default.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map(|v| matches!(v, "true" | "on" | "1"))
            .unwrap_or(default)
    }

    /// Fetches a required parameter; absence or emptiness fails the query.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(XJoinError::MissingParameter(key.to_string())),
        }
    }

    /// Extracts every parameter under `prefix` with the prefix stripped,
    /// e.g. `scoped("seqjoin.external.")` turns
    /// `seqjoin.external.sequence` into `sequence`.
    pub fn scoped(&self, prefix: &str) -> RequestParams {
        let mut scoped = RequestParams::new();
        for (key, value) in &self.values {
            if let Some(stripped) = key.strip_prefix(prefix) {
                scoped.set(stripped, value);
            }
        }
        scoped
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for RequestParams {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.set(key, value);
        }
        params
    }
}

impl From<HashMap<String, String>> for RequestParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }
}
