use crate::merge::types::{ResultDocument, ResultShape};

/// In-memory document store standing in for the host engine's index.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: Vec<ResultDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, doc: ResultDocument) {
        self.docs.push(doc);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Naive retrieval: a document matches when any of its string field values
/// contains the query, case-insensitively. `*` matches everything. Enough to
/// drive the join phases end to end.
pub fn search(query: &str, store: &DocumentStore) -> ResultShape {
    if query == "*" {
        return ResultShape::Flat(store.docs.clone());
    }

    let needle = query.to_lowercase();
    let matches: Vec<ResultDocument> = store
        .docs
        .iter()
        .filter(|doc| {
            doc.fields.iter().any(|(field, _)| {
                doc.field_values(field)
                    .iter()
                    .any(|value| value.to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect();

    ResultShape::Flat(matches)
}
