//! The provider interface and the external result-set model.

use crate::error::Result;
use crate::join::params::RequestParams;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The capability a concrete provider implements.
///
/// `compute_results` must be a pure function of its parameters plus the
/// provider's own remote state: it may be called concurrently for different
/// queries on the same instance and must not mutate state visible to them.
#[async_trait]
pub trait ExternalResultsProvider: Send + Sync + std::fmt::Debug {
    async fn compute_results(&self, params: &RequestParams) -> Result<ExternalResultSet>;
}

/// One join key's worth of external results: exactly one record, or an
/// ordered sequence of them. Carried explicitly rather than disambiguated by
/// a runtime type check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExternalValue {
    Single(Value),
    Many(Vec<Value>),
}

impl ExternalValue {
    /// The records in order, regardless of variant.
    pub fn records(&self) -> Vec<&Value> {
        match self {
            ExternalValue::Single(record) => vec![record],
            ExternalValue::Many(records) => records.iter().collect(),
        }
    }
}

/// How `ExternalResultSet::get` normalizes an incoming join key before the
/// lookup. Provider-specific: the sequence provider stores canonical
/// upper-case keys while publishing lower-case identifiers, so its lookups
/// upper-case. Most providers are `Verbatim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyNormalization {
    #[default]
    Verbatim,
    Uppercase,
}

impl KeyNormalization {
    fn apply(&self, key: &str) -> String {
        match self {
            KeyNormalization::Verbatim => key.to_string(),
            KeyNormalization::Uppercase => key.to_uppercase(),
        }
    }
}

/// The full output of one provider invocation for one query.
///
/// Immutable once built. Maps join keys to result records and carries the
/// provider's named scalar aggregates. Lookups of unknown keys return no
/// results, never an error.
#[derive(Debug, Clone)]
pub struct ExternalResultSet {
    /// Identifier list as the provider publishes it (order and case are the
    /// provider's contract, not necessarily the canonical map keys).
    join_ids: Vec<String>,
    values: HashMap<String, ExternalValue>,
    aggregates: serde_json::Map<String, Value>,
    normalization: KeyNormalization,
}

impl ExternalResultSet {
    pub fn builder() -> ExternalResultSetBuilder {
        ExternalResultSetBuilder::default()
    }

    /// The provider's published identifier list.
    pub fn join_ids(&self) -> &[String] {
        &self.join_ids
    }

    /// Looks up the external results for a join key, applying the provider's
    /// key normalization. `None` means "no results for this key".
    pub fn get(&self, join_id: &str) -> Option<&ExternalValue> {
        self.values.get(&self.normalization.apply(join_id))
    }

    pub fn aggregates(&self) -> &serde_json::Map<String, Value> {
        &self.aggregates
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Default)]
pub struct ExternalResultSetBuilder {
    join_ids: Option<Vec<String>>,
    insertion_order: Vec<String>,
    values: HashMap<String, ExternalValue>,
    aggregates: serde_json::Map<String, Value>,
    normalization: KeyNormalization,
}

impl ExternalResultSetBuilder {
    pub fn normalization(mut self, normalization: KeyNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Stores the results for a canonical key. Keys must already be in the
    /// form the configured normalization produces.
    pub fn insert(mut self, key: impl Into<String>, value: ExternalValue) -> Self {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.insertion_order.push(key.clone());
        }
        self.values.insert(key, value);
        self
    }

    /// Overrides the published identifier list. Without this the canonical
    /// keys are published in insertion order.
    pub fn publish_ids(mut self, ids: Vec<String>) -> Self {
        self.join_ids = Some(ids);
        self
    }

    pub fn aggregate(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.aggregates.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> ExternalResultSet {
        ExternalResultSet {
            join_ids: self.join_ids.unwrap_or(self.insertion_order),
            values: self.values,
            aggregates: self.aggregates,
            normalization: self.normalization,
        }
    }
}
