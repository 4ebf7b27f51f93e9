//! Distributed Merge Resolver Module
//!
//! Extracts the set of join-key field values from a query response, whatever its
//! shape: a flat ranked list, a grouped structure (in either of the two grouped
//! response sub-formats), or a set of already-gathered shard responses on the
//! coordinator node of a distributed query.
//!
//! ## Core Concepts
//! - **Shape-agnostic traversal**: every document reachable in the response is
//!   visited exactly once, regardless of grouping.
//! - **Materialized documents**: in the distributed case documents are rebuilt
//!   from shard responses and may carry only the join field(s). The resolver
//!   never assumes full field availability.
//! - **Deduplication**: the extracted key sequence is duplicate-free and keeps
//!   encounter order, across groups and across shards.
//!
//! ## Submodules
//! - **`types`**: Result shape model (documents, group fields, shard responses).
//! - **`resolver`**: Join-key extraction over those shapes.

pub mod resolver;
pub mod types;
