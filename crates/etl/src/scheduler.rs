//! Retry scheduler for pipeline invocations.
//!
//! Each attempt is a complete pipeline invocation with its own run
//! record, so a load that succeeds on attempt three leaves two Failed
//! runs and one Success run in the audit table.

use std::sync::Arc;
use std::time::Duration;

use etl_core::{EtlRun, Result};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use warehouse::Warehouse;

use crate::pipeline::{CsvPipeline, PipelineConfig};

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between attempts, in seconds
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// Period of the scheduled load loop, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_secs() -> u64 {
    60
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Drives the CSV pipeline: bounded-retry execution on demand and a
/// periodic loop for scheduled loads.
pub struct EtlScheduler {
    pipeline: CsvPipeline,
    job: PipelineConfig,
    config: SchedulerConfig,
}

impl EtlScheduler {
    pub fn new(warehouse: Arc<Warehouse>, job: PipelineConfig, config: SchedulerConfig) -> Self {
        Self {
            pipeline: CsvPipeline::new(warehouse),
            job,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run the pipeline once with retries. Returns the run record of
    /// the successful attempt, or the last attempt's error.
    pub async fn run_once(&self) -> Result<EtlRun> {
        let max_attempts = self.config.max_retries + 1;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.pipeline.run(&self.job).await {
                Ok(run) => {
                    if attempt > 1 {
                        info!(attempt, run_id = run.run_id, "Pipeline recovered after retry");
                    }
                    return Ok(run);
                }
                Err(e) if attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        backoff_secs = self.config.retry_backoff_secs,
                        error = %e,
                        "Pipeline attempt failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff()).await;
                }
                Err(e) => {
                    error!(attempt, error = %e, "Pipeline failed, retries exhausted");
                    return Err(e);
                }
            }
        }
    }

    /// Kick off a detached load. Progress is observable through the
    /// run audit table; outcomes are logged by `run_once`.
    pub fn trigger(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let _ = self.run_once().await;
        })
    }

    /// Start the periodic load loop. The first load fires immediately.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            interval_secs = self.config.interval_secs,
            "Starting scheduled load loop"
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval());
            loop {
                ticker.tick().await;
                let _ = self.run_once().await;
            }
        })
    }
}
