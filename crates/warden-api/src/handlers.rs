//! Read-only handlers over the store's read path.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use warden_types::ReputationSummary;

use crate::types::{ApiState, ErrorBody};

const DEFAULT_LIST_LIMIT: u32 = 100;
const MAX_HISTORY_LIMIT: u32 = 200;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn list_agents(State(state): State<ApiState>) -> Response {
    match state.reader.list_agents(DEFAULT_LIST_LIMIT).await {
        Ok(agents) => Json(agents).into_response(),
        Err(e) => {
            warn!("[API] list_agents failed: {e}");
            internal_error()
        }
    }
}

pub async fn get_agent(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.reader.get_agent(&id).await {
        Ok(Some(agent)) => Json(agent).into_response(),
        Ok(None) => not_found(&id),
        Err(e) => {
            warn!("[API] get_agent({id}) failed: {e}");
            internal_error()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

pub async fn get_history(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let limit = params.limit.unwrap_or(50).min(MAX_HISTORY_LIMIT);
    match state.reader.get_health_history(&id, limit).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => {
            warn!("[API] get_history({id}) failed: {e}");
            internal_error()
        }
    }
}

/// Full trust report: the stored record plus the narrative the diagnostic
/// engine generates from it (cache-backed, safe-defaulted).
pub async fn get_report(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let record = match state.reader.get_agent(&id).await {
        Ok(Some(record)) => record,
        Ok(None) => return not_found(&id),
        Err(e) => {
            warn!("[API] get_report({id}) failed: {e}");
            return internal_error();
        }
    };

    let reputation = ReputationSummary {
        mean: record.reputation_mean,
        count: record.feedback_count,
    };
    let narrative = state
        .engine
        .generate_trust_narrative(&id, &record, &reputation)
        .await;

    Json(json!({
        "agent": record,
        "narrative": narrative,
    }))
    .into_response()
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(format!("agent {id} not found"))),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("store unavailable")),
    )
        .into_response()
}
