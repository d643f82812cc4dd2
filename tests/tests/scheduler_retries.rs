//! Scheduler retry semantics: each attempt is a full pipeline
//! invocation with its own audit record.

use etl::SchedulerConfig;
use etl_core::{Error, RunStatus};
use integration_tests::fixtures::{order_row, orders_csv};
use integration_tests::setup::TestContext;
use warehouse::runs::recent_runs;

#[tokio::test]
async fn exhausted_retries_leave_one_failed_run_per_attempt() {
    let ctx = TestContext::with_scheduler_config(SchedulerConfig {
        max_retries: 2,
        retry_backoff_secs: 0,
        interval_secs: 3600,
    })
    .await;

    // The scheduler's source file never exists, so every attempt fails.
    let err = ctx.scheduler.run_once().await.unwrap_err();
    assert!(matches!(err, Error::SourceNotFound(_)));

    let runs = recent_runs(&ctx.warehouse, 10).await.unwrap();
    assert_eq!(runs.len(), 3);
    assert!(runs.iter().all(|r| r.status == RunStatus::Failed));
}

#[tokio::test]
async fn first_attempt_success_needs_no_retry() {
    let ctx = TestContext::with_scheduler_config(SchedulerConfig {
        max_retries: 3,
        retry_backoff_secs: 0,
        interval_secs: 3600,
    })
    .await;

    ctx.write_csv(
        "orders.csv",
        &orders_csv(&[order_row(
            "O-1", "C-1", "P-1", "10.00", "1", "0.00", "2024-01-01T12:00:00Z",
        )]),
    );

    let run = ctx.scheduler.run_once().await.unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.rows_loaded, 1);

    let runs = recent_runs(&ctx.warehouse, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
}

#[tokio::test]
async fn zero_retries_fail_after_a_single_attempt() {
    let ctx = TestContext::with_scheduler_config(SchedulerConfig {
        max_retries: 0,
        retry_backoff_secs: 0,
        interval_secs: 3600,
    })
    .await;

    assert!(ctx.scheduler.run_once().await.is_err());

    let runs = recent_runs(&ctx.warehouse, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
}
