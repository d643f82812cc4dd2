//! Core types for the e-commerce analytics warehouse.
//!
//! Domain models shared by every crate: warehouse rows (dimensions and
//! the order fact), cleaned CSV records, fixed-point money arithmetic,
//! and the ETL run lifecycle. This crate knows nothing about storage.

pub mod error;
pub mod model;
pub mod money;
pub mod record;
pub mod run;

pub use error::{Error, Result};
pub use model::*;
pub use record::*;
pub use run::*;
