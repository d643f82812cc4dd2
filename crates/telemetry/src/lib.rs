//! Tracing setup and component health for the warehouse ETL stack.

pub mod health;
pub mod tracing_setup;

pub use health::*;
pub use tracing_setup::*;
