//! Component health registry backing the health endpoints.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Component health state.
#[derive(Debug)]
pub struct ComponentHealth {
    name: &'static str,
    healthy: AtomicBool,
    message: parking_lot::RwLock<Option<String>>,
}

impl ComponentHealth {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            healthy: AtomicBool::new(false),
            message: parking_lot::RwLock::new(None),
        }
    }

    pub fn set_healthy(&self) {
        self.healthy.store(true, Ordering::Relaxed);
        *self.message.write() = None;
    }

    pub fn set_unhealthy(&self, msg: impl Into<String>) {
        self.healthy.store(false, Ordering::Relaxed);
        *self.message.write() = Some(msg.into());
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> Option<String> {
        self.message.read().clone()
    }
}

/// Per-component health report entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealthReport {
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
}

/// Health registry for the process.
pub struct HealthRegistry {
    pub warehouse: ComponentHealth,
}

impl HealthRegistry {
    pub const fn new() -> Self {
        Self {
            warehouse: ComponentHealth::new("warehouse"),
        }
    }

    pub fn report(&self) -> Vec<ComponentHealthReport> {
        vec![ComponentHealthReport {
            name: self.warehouse.name().to_string(),
            healthy: self.warehouse.is_healthy(),
            message: self.warehouse.message(),
        }]
    }

    /// Ready to accept traffic: every component is healthy.
    pub fn is_ready(&self) -> bool {
        self.warehouse.is_healthy()
    }

    /// The process is alive (trivially true once we can answer).
    pub fn is_alive(&self) -> bool {
        true
    }
}

static HEALTH: HealthRegistry = HealthRegistry::new();

/// Global health registry handle.
pub fn health() -> &'static HealthRegistry {
    &HEALTH
}
