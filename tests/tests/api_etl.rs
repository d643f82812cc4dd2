//! ETL status and trigger endpoints.

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use etl_core::RunStatus;
use integration_tests::fixtures::{order_row, orders_csv};
use integration_tests::setup::TestContext;
use warehouse::runs::recent_runs;

#[tokio::test]
async fn status_starts_empty() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    let response = server.get("/api/v1/etl/status").await;
    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 0);
    assert_eq!(body["runs"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn status_lists_newest_first_and_clamps_limit() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    ctx.write_csv(
        "orders.csv",
        &orders_csv(&[order_row(
            "O-1", "C-1", "P-1", "10.00", "1", "0.00", "2024-01-01T12:00:00Z",
        )]),
    );
    let pipeline = ctx.pipeline();
    let config = ctx.pipeline_config("orders.csv");
    for _ in 0..3 {
        pipeline.run(&config).await.unwrap();
    }

    let response = server
        .get("/api/v1/etl/status")
        .add_query_param("limit", 2)
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 2);
    let runs = body["runs"].as_array().unwrap();
    assert!(runs[0]["run_id"].as_i64().unwrap() > runs[1]["run_id"].as_i64().unwrap());

    // Out-of-range limits clamp instead of erroring.
    let response = server
        .get("/api/v1/etl/status")
        .add_query_param("limit", 0)
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 1);

    let response = server
        .get("/api/v1/etl/status")
        .add_query_param("limit", 5000)
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn trigger_accepts_and_runs_asynchronously() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    // The scheduler's default source inside this context.
    ctx.write_csv(
        "orders.csv",
        &orders_csv(&[order_row(
            "O-1", "C-1", "P-1", "10.00", "1", "0.00", "2024-01-01T12:00:00Z",
        )]),
    );

    let response = server.post("/api/v1/etl/trigger").await;
    response.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "accepted");

    // Poll the audit table until the detached load finishes.
    let mut finished = None;
    for _ in 0..100 {
        let runs = recent_runs(&ctx.warehouse, 1).await.unwrap();
        if let Some(run) = runs.into_iter().find(|r| r.status.is_terminal()) {
            finished = Some(run);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let run = finished.expect("triggered run never finished");
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.rows_loaded, 1);
}
