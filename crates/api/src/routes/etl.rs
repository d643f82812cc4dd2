//! ETL status and trigger endpoints.

use axum::{extract::Query, extract::State, http::StatusCode, Json};
use etl_core::EtlRun;
use serde::{Deserialize, Serialize};
use tracing::info;
use warehouse::runs;

use crate::response::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub limit: Option<i64>,
}

/// Recent run listing, newest first.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub count: usize,
    pub runs: Vec<EtlRun>,
}

/// GET /api/v1/etl/status
pub async fn status_handler(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Result<Json<StatusResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let runs = runs::recent_runs(&state.warehouse, limit).await?;

    Ok(Json(StatusResponse {
        count: runs.len(),
        runs,
    }))
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub status: String,
}

/// POST /api/v1/etl/trigger - kick off an asynchronous load.
pub async fn trigger_handler(State(state): State<AppState>) -> (StatusCode, Json<TriggerResponse>) {
    info!("ETL load triggered via API");
    state.scheduler.clone().trigger();

    (
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            status: "accepted".to_string(),
        }),
    )
}
