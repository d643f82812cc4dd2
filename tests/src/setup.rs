//! Common test setup functions.

use std::path::PathBuf;
use std::sync::Arc;

use api::{router, state::AppState};
use axum::Router;
use etl::{CsvPipeline, EtlScheduler, PipelineConfig, SchedulerConfig};
use tempfile::TempDir;
use warehouse::{init_schema, Warehouse};

/// Test context with an in-memory warehouse and a temp directory for
/// CSV sources.
///
/// This exercises the production code paths end to end: the real Axum
/// router, the real pipeline and scheduler, and the real SQLite schema
/// (just held in memory).
pub struct TestContext {
    pub warehouse: Arc<Warehouse>,
    pub scheduler: Arc<EtlScheduler>,
    pub router: Router,
    data_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with all components initialized.
    /// Scheduler retries run with zero backoff so suites stay fast.
    pub async fn new() -> Self {
        Self::with_scheduler_config(SchedulerConfig {
            max_retries: 0,
            retry_backoff_secs: 0,
            interval_secs: 3600,
        })
        .await
    }

    pub async fn with_scheduler_config(scheduler_config: SchedulerConfig) -> Self {
        let warehouse = Arc::new(
            Warehouse::connect_in_memory()
                .await
                .expect("Failed to open in-memory warehouse"),
        );
        init_schema(&warehouse)
            .await
            .expect("Failed to initialize schema");

        // The health registry is process-global; mark the warehouse up
        // so readiness reflects this context.
        telemetry::health().warehouse.set_healthy();

        let data_dir = TempDir::new().expect("Failed to create temp dir");

        let scheduler = Arc::new(EtlScheduler::new(
            warehouse.clone(),
            PipelineConfig {
                csv_path: data_dir.path().join("orders.csv"),
                ..PipelineConfig::default()
            },
            scheduler_config,
        ));

        let state = AppState::new(warehouse.clone(), scheduler.clone());
        let router = router(state);

        Self {
            warehouse,
            scheduler,
            router,
            data_dir,
        }
    }

    /// A pipeline bound to this context's warehouse.
    pub fn pipeline(&self) -> CsvPipeline {
        CsvPipeline::new(self.warehouse.clone())
    }

    /// Pipeline config pointing at a file in the temp directory.
    pub fn pipeline_config(&self, file_name: &str) -> PipelineConfig {
        PipelineConfig {
            csv_path: self.data_dir.path().join(file_name),
            ..PipelineConfig::default()
        }
    }

    /// Write a CSV document into the temp directory and return its path.
    pub fn write_csv(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.data_dir.path().join(file_name);
        std::fs::write(&path, content).expect("Failed to write CSV fixture");
        path
    }
}
