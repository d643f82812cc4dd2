//! API routes.

pub mod analytics;
pub mod etl;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v1 = Router::new()
        .route("/kpis", get(analytics::kpis_handler))
        .route("/revenue/trends", get(analytics::revenue_trends_handler))
        .route("/customers/segments", get(analytics::segments_handler))
        .route("/products/top-sellers", get(analytics::top_sellers_handler))
        .route("/etl/status", get(etl::status_handler))
        .route("/etl/trigger", post(etl::trigger_handler));

    Router::new()
        .nest("/api/v1", v1)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
