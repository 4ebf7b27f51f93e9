use super::engine::{search, DocumentStore};
use super::types::SearchResponse;
use crate::error::XJoinError;
use crate::join::context::QueryContext;
use crate::join::coordinator::JoinCoordinator;
use crate::join::params::RequestParams;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a query needs: the document store and the configured join
/// components, in execution order.
pub struct SearchState {
    pub store: DocumentStore,
    pub joins: Vec<Arc<JoinCoordinator>>,
}

/// Runs one query through the full join protocol: prepare every enabled
/// join, execute the match, then merge each join's external results onto the
/// response. A provider failure fails the whole query — there is no partial
/// join output.
pub async fn handle_select(
    Extension(state): Extension<Arc<SearchState>>,
    Query(raw_params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let params = RequestParams::from(raw_params);
    let query = params.get("q").unwrap_or("*").to_string();

    let ctx = QueryContext::new();
    tracing::info!("Request {}: q=\"{}\"", ctx.request_id(), query);

    for join in &state.joins {
        if let Err(e) = join.prepare(&ctx, &params).await {
            tracing::error!(
                "Request {}: join {} failed: {}",
                ctx.request_id(),
                join.name(),
                e
            );
            return (
                status_for(&e),
                Json(serde_json::json!({ "error": e.to_string() })),
            );
        }
    }

    let results = search(&query, &state.store);
    let mut response = SearchResponse::new(query, results);

    for join in &state.joins {
        response = join.process(&ctx, &params, response).await;
    }

    match serde_json::to_value(&response) {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => {
            tracing::error!("Request {}: failed to serialize response: {}", ctx.request_id(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}

pub async fn handle_health() -> StatusCode {
    StatusCode::OK
}

fn status_for(error: &XJoinError) -> StatusCode {
    match error {
        XJoinError::MissingParameter(_) => StatusCode::BAD_REQUEST,
        XJoinError::Transport(_) | XJoinError::RemoteJobFailure(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
