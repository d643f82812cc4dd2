//! SQLite storage layer for the analytics warehouse.
//!
//! Owns the star schema (dimensions + order fact + ETL run audit),
//! the dimension upsert engine, the idempotent fact loader, and the
//! read-only aggregate queries served to the dashboard API.

pub mod client;
pub mod config;
pub mod dimensions;
pub mod facts;
pub mod health;
pub mod query;
pub mod runs;
pub mod schema;

pub use client::Warehouse;
pub use config::WarehouseConfig;
pub use dimensions::{resolve_time, upsert_customer, upsert_product};
pub use facts::{load_fact, FactRecord, LoadOutcome};
pub use query::*;
pub use schema::init_schema;
