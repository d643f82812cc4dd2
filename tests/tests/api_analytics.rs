//! Aggregate analytics endpoints over seeded warehouse data.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::fixtures::{order_row, orders_csv};
use integration_tests::setup::TestContext;

/// Two orders in early January 2024:
/// - O-1: customer C-1, product P-1, 2.00 x 5  = 10.00 (Jan 1)
/// - O-2: customer C-2, product P-2, 20.00 x 3 = 60.00 (Jan 2)
async fn seeded_context() -> TestContext {
    let ctx = TestContext::new().await;
    ctx.write_csv(
        "orders.csv",
        &orders_csv(&[
            order_row("O-1", "C-1", "P-1", "2.00", "5", "0.00", "2024-01-01T12:00:00Z"),
            order_row("O-2", "C-2", "P-2", "20.00", "3", "0.00", "2024-01-02T12:00:00Z"),
        ]),
    );
    ctx.pipeline()
        .run(&ctx.pipeline_config("orders.csv"))
        .await
        .unwrap();
    ctx
}

#[tokio::test]
async fn kpis_aggregate_over_the_range() {
    let ctx = seeded_context().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    let response = server
        .get("/api/v1/kpis")
        .add_query_param("date_from", "2024-01-01")
        .add_query_param("date_to", "2024-01-31")
        .await;
    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["date_from"], "2024-01-01");
    assert_eq!(body["date_to"], "2024-01-31");
    assert_eq!(body["total_revenue"], "70.00");
    assert_eq!(body["total_orders"], 2);
    assert_eq!(body["unique_customers"], 2);
    assert_eq!(body["avg_order_value"], "35.00");
}

#[tokio::test]
async fn kpis_outside_the_range_are_zero() {
    let ctx = seeded_context().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    let response = server
        .get("/api/v1/kpis")
        .add_query_param("date_from", "2023-01-01")
        .add_query_param("date_to", "2023-12-31")
        .await;
    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_revenue"], "0.00");
    assert_eq!(body["total_orders"], 0);
    assert_eq!(body["avg_order_value"], "0");
}

#[tokio::test]
async fn revenue_trends_bucket_by_granularity() {
    let ctx = seeded_context().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    let response = server
        .get("/api/v1/revenue/trends")
        .add_query_param("date_from", "2024-01-01")
        .add_query_param("date_to", "2024-01-31")
        .add_query_param("granularity", "daily")
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["granularity"], "daily");
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["bucket"], "2024-01-01");
    assert_eq!(points[0]["revenue"], "10.00");
    assert_eq!(points[1]["bucket"], "2024-01-02");
    assert_eq!(points[1]["revenue"], "60.00");

    // Both days fall in ISO week 1 of 2024.
    let response = server
        .get("/api/v1/revenue/trends")
        .add_query_param("date_from", "2024-01-01")
        .add_query_param("date_to", "2024-01-31")
        .add_query_param("granularity", "weekly")
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["bucket"], "2024-W01");
    assert_eq!(points[0]["revenue"], "70.00");
    assert_eq!(points[0]["orders"], 2);

    // And in a single calendar month.
    let response = server
        .get("/api/v1/revenue/trends")
        .add_query_param("date_from", "2024-01-01")
        .add_query_param("date_to", "2024-01-31")
        .add_query_param("granularity", "monthly")
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["granularity"], "monthly");
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["bucket"], "2024-01");
    assert_eq!(points[0]["revenue"], "70.00");
    assert_eq!(points[0]["unique_customers"], 2);
}

#[tokio::test]
async fn weekly_buckets_keep_a_year_straddling_week_together() {
    let ctx = TestContext::new().await;
    // 2024-12-30 (Monday) and 2025-01-02 both belong to ISO week 2025-W01.
    ctx.write_csv(
        "orders.csv",
        &orders_csv(&[
            order_row("O-1", "C-1", "P-1", "10.00", "1", "0.00", "2024-12-30T12:00:00Z"),
            order_row("O-2", "C-2", "P-1", "15.00", "1", "0.00", "2025-01-02T12:00:00Z"),
        ]),
    );
    ctx.pipeline()
        .run(&ctx.pipeline_config("orders.csv"))
        .await
        .unwrap();
    let server = TestServer::new(ctx.router.clone()).unwrap();

    let response = server
        .get("/api/v1/revenue/trends")
        .add_query_param("date_from", "2024-12-01")
        .add_query_param("date_to", "2025-01-31")
        .add_query_param("granularity", "weekly")
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["bucket"], "2025-W01");
    assert_eq!(points[0]["revenue"], "25.00");
    assert_eq!(points[0]["orders"], 2);

    // The monthly view still splits on the calendar boundary.
    let response = server
        .get("/api/v1/revenue/trends")
        .add_query_param("date_from", "2024-12-01")
        .add_query_param("date_to", "2025-01-31")
        .add_query_param("granularity", "monthly")
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["bucket"], "2024-12");
    assert_eq!(points[1]["bucket"], "2025-01");
}

#[tokio::test]
async fn trends_reject_unknown_granularity() {
    let ctx = seeded_context().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    let response = server
        .get("/api/v1/revenue/trends")
        .add_query_param("granularity", "hourly")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("granularity"));
}

#[tokio::test]
async fn top_sellers_rank_by_the_chosen_metric() {
    let ctx = seeded_context().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    // By revenue: P-2 (60.00) ahead of P-1 (10.00).
    let response = server
        .get("/api/v1/products/top-sellers")
        .add_query_param("date_from", "2024-01-01")
        .add_query_param("date_to", "2024-01-31")
        .add_query_param("metric", "revenue")
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["product_id"], "P-2");
    assert_eq!(items[0]["revenue"], "60.00");

    // By quantity: P-1 (5 units) ahead of P-2 (3 units).
    let response = server
        .get("/api/v1/products/top-sellers")
        .add_query_param("date_from", "2024-01-01")
        .add_query_param("date_to", "2024-01-31")
        .add_query_param("metric", "quantity")
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["product_id"], "P-1");
    assert_eq!(items[0]["quantity"], 5);
}

#[tokio::test]
async fn segments_cover_every_active_customer() {
    let ctx = seeded_context().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    let response = server
        .get("/api/v1/customers/segments")
        .add_query_param("date_from", "2024-01-01")
        .add_query_param("date_to", "2024-01-31")
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    let segments = body["segments"].as_array().unwrap();

    let known = [
        "Champions",
        "Loyal",
        "Potential",
        "At Risk",
        "Hibernating",
    ];
    let total: i64 = segments
        .iter()
        .map(|s| {
            assert!(known.contains(&s["segment"].as_str().unwrap()));
            s["customers"].as_i64().unwrap()
        })
        .sum();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn date_range_validation() {
    let ctx = seeded_context().await;
    let server = TestServer::new(ctx.router.clone()).unwrap();

    let response = server
        .get("/api/v1/kpis")
        .add_query_param("date_from", "2024-02-01")
        .add_query_param("date_to", "2024-01-01")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/v1/kpis")
        .add_query_param("date_from", "01/02/2024")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("date_from"));
}
