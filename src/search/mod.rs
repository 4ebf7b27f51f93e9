//! Search Boundary Module
//!
//! The host search engine proper (query execution, storage, shard transport)
//! is an external collaborator; this module is the thin boundary the join
//! layer plugs into: response types shared with the coordinator, a minimal
//! in-memory match engine, and the HTTP handler that drives the join phases
//! for a query.
//!
//! ## Submodules
//! - **`engine`**: In-memory document store and naive matching.
//! - **`handlers`**: HTTP request handlers for the Axum web server.
//! - **`types`**: The query response carried through the join phases.

pub mod engine;
pub mod handlers;
pub mod types;
