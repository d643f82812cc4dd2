//! Warehouse health checks.

use tracing::{debug, error};

use crate::client::Warehouse;

/// Check warehouse connection health.
pub async fn check_connection(warehouse: &Warehouse) -> bool {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(warehouse.pool())
        .await
    {
        Ok(_) => {
            debug!("Warehouse connection healthy");
            true
        }
        Err(e) => {
            error!("Warehouse health check failed: {}", e);
            false
        }
    }
}
