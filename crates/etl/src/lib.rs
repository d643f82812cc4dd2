//! Asynchronous ingestion for the analytics warehouse.
//!
//! - Pipeline: one failure-atomic CSV load (dims + fact + run audit)
//! - Scheduler: bounded-retry trigger and periodic execution

pub mod pipeline;
pub mod scheduler;

pub use pipeline::{CsvPipeline, PipelineConfig};
pub use scheduler::{EtlScheduler, SchedulerConfig};
