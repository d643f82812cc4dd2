//! HTTP API for the analytics warehouse.
//!
//! Read endpoints serve run status and aggregate analytics; the single
//! write endpoint kicks off an asynchronous ETL load.

pub mod response;
pub mod routes;
pub mod state;

pub use response::{ApiError, ErrorResponse};
pub use routes::router;
pub use state::AppState;
