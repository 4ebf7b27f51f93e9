//! Result shape model for join-key extraction.
//!
//! Documents here are deliberately loose: a string-keyed bag of JSON values.
//! On a leaf node they come from the local match list with all stored fields;
//! on a distributed coordinator they are rebuilt from serialized shard
//! responses and usually carry nothing but the join field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single result document. Multivalued fields are JSON arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultDocument {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl ResultDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document holding a single field, as shard responses do when
    /// only the join field was requested.
    pub fn with_field(name: &str, value: Value) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert(name.to_string(), value);
        Self { fields }
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Returns the string renderings of a field's values.
    ///
    /// A scalar field yields one value, an array field one per element, and an
    /// absent field none. Non-string scalars are rendered through their JSON
    /// display form so numeric join keys still match.
    pub fn field_values(&self, name: &str) -> Vec<String> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
            Some(value) => value_to_string(value).into_iter().collect(),
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// One group inside a grouped response: the grouping value plus its documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    #[serde(rename = "groupValue")]
    pub group_value: Option<String>,
    pub doclist: Vec<ResultDocument>,
}

/// The two grouped response sub-formats: a list of groups, or a single merged
/// document list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum GroupFormat {
    Grouped { groups: Vec<Group> },
    Simple { doclist: Vec<ResultDocument> },
}

/// The grouped results for one group-by field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupedField {
    pub field: String,
    #[serde(flatten)]
    pub format: GroupFormat,
}

/// The overall shape of a response's matched documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResultShape {
    Grouped(Vec<GroupedField>),
    Flat(Vec<ResultDocument>),
}

impl ResultShape {
    pub fn empty() -> Self {
        ResultShape::Flat(Vec::new())
    }

    /// Total number of reachable documents, over all groups.
    pub fn doc_count(&self) -> usize {
        match self {
            ResultShape::Flat(docs) => docs.len(),
            ResultShape::Grouped(fields) => fields
                .iter()
                .map(|f| match &f.format {
                    GroupFormat::Grouped { groups } => {
                        groups.iter().map(|g| g.doclist.len()).sum::<usize>()
                    }
                    GroupFormat::Simple { doclist } => doclist.len(),
                })
                .sum(),
        }
    }
}

/// A single shard's already-gathered partial response, as seen by the
/// distributed finalize stage. Documents may hold only the join field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardResponse {
    pub shard: String,
    pub results: ResultShape,
}
