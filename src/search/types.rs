use crate::join::coordinator::JoinSection;
use crate::merge::types::ResultShape;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The response a query produces: the matched documents plus one named
/// section per join that ran. Built up by ownership — each join phase
/// consumes the response and returns it with its section attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(rename = "numFound")]
    pub num_found: usize,
    pub results: ResultShape,
    #[serde(flatten, default)]
    pub joins: BTreeMap<String, JoinSection>,
}

impl SearchResponse {
    pub fn new(query: impl Into<String>, results: ResultShape) -> Self {
        Self {
            query: query.into(),
            num_found: results.doc_count(),
            results,
            joins: BTreeMap::new(),
        }
    }

    pub fn has_join(&self, name: &str) -> bool {
        self.joins.contains_key(name)
    }

    pub fn with_join(mut self, name: &str, section: JoinSection) -> Self {
        self.joins.insert(name.to_string(), section);
        self
    }
}
