//! Join-key extraction over result shapes.
//!
//! Both entry points return a duplicate-free sequence in encounter order:
//! first occurrence wins, later repeats (within a group, across groups, or
//! across shards) are dropped. Documents without the join field are skipped,
//! and empty shapes yield an empty sequence rather than an error.

use super::types::{GroupFormat, ResultShape, ShardResponse};
use std::collections::HashSet;

/// Extracts the ordered set of join-key values present across every document
/// reachable in the given shape.
pub fn collect_join_keys(shape: &ResultShape, join_field: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut seen = HashSet::new();
    collect_into(shape, join_field, &mut keys, &mut seen);
    keys
}

/// Extracts join keys across a set of gathered shard responses, deduplicated
/// into a single ordered sequence.
pub fn collect_distributed_join_keys(shards: &[ShardResponse], join_field: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut seen = HashSet::new();

    for shard in shards {
        let before = keys.len();
        collect_into(&shard.results, join_field, &mut keys, &mut seen);
        tracing::debug!(
            "Gathered {} new join key(s) from shard {}",
            keys.len() - before,
            shard.shard
        );
    }

    keys
}

fn collect_into(
    shape: &ResultShape,
    join_field: &str,
    keys: &mut Vec<String>,
    seen: &mut HashSet<String>,
) {
    match shape {
        ResultShape::Flat(docs) => {
            for doc in docs {
                push_doc_keys(doc.field_values(join_field), keys, seen);
            }
        }
        ResultShape::Grouped(fields) => {
            for field in fields {
                match &field.format {
                    GroupFormat::Grouped { groups } => {
                        for group in groups {
                            for doc in &group.doclist {
                                push_doc_keys(doc.field_values(join_field), keys, seen);
                            }
                        }
                    }
                    GroupFormat::Simple { doclist } => {
                        for doc in doclist {
                            push_doc_keys(doc.field_values(join_field), keys, seen);
                        }
                    }
                }
            }
        }
    }
}

fn push_doc_keys(values: Vec<String>, keys: &mut Vec<String>, seen: &mut HashSet<String>) {
    for value in values {
        if seen.insert(value.clone()) {
            keys.push(value);
        }
    }
}
