//! Request-scoped join state.
//!
//! A `QueryContext` is created when a query starts and dropped when it ends;
//! it is owned by that request and never shared across requests. Per join
//! component it holds the cached external result set (write-once,
//! read-many) and the merge-completion flag. The cache write sits behind a
//! mutex so that a re-entrant or retried prepare still invokes the provider
//! at most once.

use crate::error::Result;
use crate::provider::types::ExternalResultSet;

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct JoinState {
    results: Mutex<Option<Arc<ExternalResultSet>>>,
    merged: AtomicBool,
}

pub struct QueryContext {
    request_id: uuid::Uuid,
    joins: DashMap<String, Arc<JoinState>>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4(),
            joins: DashMap::new(),
        }
    }

    /// Correlation id for this request's log lines.
    pub fn request_id(&self) -> uuid::Uuid {
        self.request_id
    }

    fn join_state(&self, join: &str) -> Arc<JoinState> {
        self.joins
            .entry(join.to_string())
            .or_insert_with(|| Arc::new(JoinState::default()))
            .clone()
    }

    /// Returns the cached result set for a join, if prepare has produced one.
    pub async fn cached_results(&self, join: &str) -> Option<Arc<ExternalResultSet>> {
        self.join_state(join).results.lock().await.clone()
    }

    /// Returns the cached result set, computing and storing it first if
    /// absent. The compute closure runs under the join's cache lock, so
    /// concurrent callers for the same join serialize and the provider is
    /// invoked at most once per query context.
    pub async fn cache_results_if_absent<F, Fut>(
        &self,
        join: &str,
        compute: F,
    ) -> Result<Arc<ExternalResultSet>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ExternalResultSet>>,
    {
        let state = self.join_state(join);
        let mut cached = state.results.lock().await;

        if let Some(results) = cached.as_ref() {
            tracing::debug!(
                "Request {}: external results for {} already cached",
                self.request_id,
                join
            );
            return Ok(results.clone());
        }

        let results = Arc::new(compute().await?);
        *cached = Some(results.clone());
        Ok(results)
    }

    /// Marks the join's merge output as written. Returns false if it was
    /// already marked, letting callers enforce exactly-once merging.
    pub fn mark_merged(&self, join: &str) -> bool {
        !self.join_state(join).merged.swap(true, Ordering::SeqCst)
    }

    pub fn is_merged(&self, join: &str) -> bool {
        self.join_state(join).merged.load(Ordering::SeqCst)
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}
