//! The per-query phase driver.
//!
//! A `JoinCoordinator` is built once per configured join component and shared
//! across queries; all per-query state lives in the `QueryContext`. Response
//! values are passed by ownership through each phase and returned with the
//! join section attached, rather than mutated in shared state.

use super::context::QueryContext;
use super::params::RequestParams;
use super::projection::FieldProjection;
use crate::error::Result;
use crate::merge::resolver::{collect_distributed_join_keys, collect_join_keys};
use crate::merge::types::ShardResponse;
use crate::provider::types::{ExternalResultSet, ExternalResultsProvider, ExternalValue};
use crate::search::types::SearchResponse;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-query parameter suffixes under the component name:
/// `<name>` enables the join, `<name>.external.*` is forwarded to the
/// provider, `<name>.fl` / `<name>.doc.fl` select fields on the aggregate
/// object and the per-key records.
pub const EXTERNAL_PREFIX: &str = "external";
pub const RESULTS_FIELD_LIST: &str = "fl";
pub const DOC_FIELD_LIST: &str = "doc.fl";

/// One join key's merge output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalEntry {
    #[serde(rename = "joinId")]
    pub join_id: String,
    pub doc: ExternalValue,
}

/// The named section a join adds to the response: the provider's projected
/// aggregates plus one `external` entry per matched join key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinSection {
    #[serde(flatten)]
    pub aggregates: serde_json::Map<String, serde_json::Value>,
    pub external: Vec<ExternalEntry>,
}

pub struct JoinCoordinator {
    name: String,
    join_field: String,
    provider: Arc<dyn ExternalResultsProvider>,
}

impl JoinCoordinator {
    pub fn new(
        name: impl Into<String>,
        join_field: impl Into<String>,
        provider: Arc<dyn ExternalResultsProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            join_field: join_field.into(),
            provider,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn join_field(&self) -> &str {
        &self.join_field
    }

    /// The join runs only when the request carries `<name>=true`.
    fn enabled(&self, params: &RequestParams) -> bool {
        params.get_bool(&self.name, false)
    }

    /// Phase 1: generate external results if they have not already been
    /// generated for this request. Provider errors fail the whole query.
    pub async fn prepare(&self, ctx: &QueryContext, params: &RequestParams) -> Result<()> {
        if !self.enabled(params) {
            return Ok(());
        }

        let external_params = params.scoped(&format!("{}.{}.", self.name, EXTERNAL_PREFIX));
        let results = ctx
            .cache_results_if_absent(&self.name, || self.provider.compute_results(&external_params))
            .await?;

        tracing::info!(
            "Request {}: join {} prepared {} external id(s)",
            ctx.request_id(),
            self.name,
            results.join_ids().len()
        );
        Ok(())
    }

    /// Phase 2, non-distributed: match the response's own documents against
    /// the cached external results and attach the join section. A disabled
    /// join, a missing cache, or an already-written section leave the
    /// response unchanged.
    pub async fn process(
        &self,
        ctx: &QueryContext,
        params: &RequestParams,
        response: SearchResponse,
    ) -> SearchResponse {
        if !self.enabled(params) {
            return response;
        }
        let Some(results) = ctx.cached_results(&self.name).await else {
            return response;
        };
        if response.has_join(&self.name) {
            return response;
        }

        let join_ids = collect_join_keys(&response.results, &self.join_field);
        self.merge(ctx, params, join_ids, &results, response)
    }

    /// Distributed finalize: runs on the coordinator node once every shard
    /// response has been gathered. Guarded against double execution — if the
    /// join output is already on the response (or was merged earlier in this
    /// request), this is a silent no-op.
    pub async fn finish_stage(
        &self,
        ctx: &QueryContext,
        params: &RequestParams,
        shards: &[ShardResponse],
        response: SearchResponse,
    ) -> SearchResponse {
        if !self.enabled(params) {
            return response;
        }
        let Some(results) = ctx.cached_results(&self.name).await else {
            tracing::warn!(
                "Request {}: join {} has no cached external results at finalize",
                ctx.request_id(),
                self.name
            );
            return response;
        };
        if response.has_join(&self.name) || ctx.is_merged(&self.name) {
            tracing::debug!(
                "Request {}: join {} already merged, skipping finalize",
                ctx.request_id(),
                self.name
            );
            return response;
        }

        let join_ids = collect_distributed_join_keys(shards, &self.join_field);
        if join_ids.is_empty() {
            return response;
        }
        self.merge(ctx, params, join_ids, &results, response)
    }

    /// Looks up each join key and writes the section. Keys without external
    /// results are skipped silently; an empty join is not an error.
    fn merge(
        &self,
        ctx: &QueryContext,
        params: &RequestParams,
        join_ids: Vec<String>,
        results: &ExternalResultSet,
        response: SearchResponse,
    ) -> SearchResponse {
        let results_projection = self.projection(params, RESULTS_FIELD_LIST);
        let doc_projection = self.projection(params, DOC_FIELD_LIST);

        let external = join_ids
            .into_iter()
            .filter_map(|join_id| {
                results.get(&join_id).map(|value| ExternalEntry {
                    doc: project_value(&doc_projection, value),
                    join_id,
                })
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "Request {}: join {} matched {} of {} external id(s)",
            ctx.request_id(),
            self.name,
            external.len(),
            results.join_ids().len()
        );

        ctx.mark_merged(&self.name);
        response.with_join(
            &self.name,
            JoinSection {
                aggregates: results_projection.project_map(results.aggregates()),
                external,
            },
        )
    }

    fn projection(&self, params: &RequestParams, suffix: &str) -> FieldProjection {
        params
            .get(&format!("{}.{}", self.name, suffix))
            .map(FieldProjection::parse)
            .unwrap_or_default()
    }
}

fn project_value(projection: &FieldProjection, value: &ExternalValue) -> ExternalValue {
    match value {
        ExternalValue::Single(record) => ExternalValue::Single(projection.project(record)),
        ExternalValue::Many(records) => {
            ExternalValue::Many(records.iter().map(|r| projection.project(r)).collect())
        }
    }
}
