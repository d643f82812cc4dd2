//! Health check endpoints.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use telemetry::{health, ComponentHealthReport};

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: Vec<ComponentHealthReport>,
}

/// GET /health - Full health report.
pub async fn health_handler() -> Json<HealthResponse> {
    let ready = health().is_ready();

    Json(HealthResponse {
        status: if ready { "healthy" } else { "unhealthy" }.to_string(),
        components: health().report(),
    })
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (process is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
