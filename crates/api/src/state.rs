//! Shared application state.

use std::sync::Arc;

use etl::EtlScheduler;
use warehouse::Warehouse;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub warehouse: Arc<Warehouse>,
    pub scheduler: Arc<EtlScheduler>,
}

impl AppState {
    pub fn new(warehouse: Arc<Warehouse>, scheduler: Arc<EtlScheduler>) -> Self {
        Self {
            warehouse,
            scheduler,
        }
    }
}
