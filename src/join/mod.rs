//! Join Coordinator Module
//!
//! Orchestrates the two-phase external-join protocol for one query:
//!
//! 1. **Prepare**: invoke the provider (unless already cached for this
//!    request) with the component's prefix-stripped external parameters and
//!    store the result set in the request-scoped `QueryContext`.
//! 2. **Process**: on a leaf or non-distributed node, extract the join keys
//!    present in the matched documents and merge the cached external records
//!    onto the response.
//! 3. **Finalize**: on the distributed coordinator's final fan-in stage,
//!    gather join keys from every shard's returned documents instead, with a
//!    guard against merging the same join twice.
//!
//! ## Submodules
//! - **`params`**: Request parameter map with prefix scoping.
//! - **`context`**: Request-scoped state (cached result set, merge flags).
//! - **`projection`**: Field-list projection for aggregates and records.
//! - **`coordinator`**: The phase driver and response merging.

pub mod context;
pub mod coordinator;
pub mod params;
pub mod projection;
