//! Analytics warehouse ETL service
//!
//! - SQLite star-schema warehouse (customers, products, time, orders)
//! - Failure-atomic CSV ingestion with run auditing and retries
//! - HTTP API for run status, triggering, and aggregate analytics

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use api::{router, AppState};
use etl::{EtlScheduler, PipelineConfig, SchedulerConfig};
use telemetry::{health, init_tracing_from_env};
use warehouse::{init_schema, Warehouse, WarehouseConfig};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Run the periodic load loop in addition to on-demand triggers
    #[serde(default)]
    scheduled_loads: bool,

    #[serde(default)]
    warehouse: WarehouseConfig,

    #[serde(default)]
    pipeline: PipelineConfig,

    #[serde(default)]
    scheduler: SchedulerConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            scheduled_loads: false,
            warehouse: WarehouseConfig::default(),
            pipeline: PipelineConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!("Starting warehouse ETL service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;

    info!(
        database_url = %config.warehouse.database_url,
        csv_path = %config.pipeline.csv_path.display(),
        "Loaded configuration"
    );

    // Connect to the warehouse and ensure the star schema exists
    let warehouse = Arc::new(
        Warehouse::connect(config.warehouse.clone())
            .await
            .context("Failed to connect to warehouse")?,
    );

    init_schema(&warehouse)
        .await
        .context("Failed to initialize warehouse schema")?;

    // Check health and update status
    check_health(&warehouse).await;

    // Scheduler handle shared with the API for on-demand triggers
    let scheduler = Arc::new(EtlScheduler::new(
        warehouse.clone(),
        config.pipeline.clone(),
        config.scheduler.clone(),
    ));

    let _load_loop = if config.scheduled_loads {
        Some(scheduler.clone().start())
    } else {
        None
    };

    // Create application state
    let state = AppState::new(warehouse.clone(), scheduler);

    // Create router
    let app = router(state);

    // Start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("WAREHOUSE")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested config from environment
    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(url) = std::env::var("WAREHOUSE_DATABASE_URL") {
        config.warehouse.database_url = url;
    }
    if let Ok(path) = std::env::var("WAREHOUSE_CSV_PATH") {
        config.pipeline.csv_path = path.into();
    }
    if let Ok(retries) = std::env::var("WAREHOUSE_MAX_RETRIES") {
        config.scheduler.max_retries = retries
            .parse()
            .context("WAREHOUSE_MAX_RETRIES must be an integer")?;
    }
    if let Ok(secs) = std::env::var("WAREHOUSE_RETRY_BACKOFF_SECS") {
        config.scheduler.retry_backoff_secs = secs
            .parse()
            .context("WAREHOUSE_RETRY_BACKOFF_SECS must be an integer")?;
    }
    if let Ok(enabled) = std::env::var("WAREHOUSE_SCHEDULED_LOADS") {
        config.scheduled_loads = enabled == "1" || enabled.to_lowercase() == "true";
    }

    Ok(config)
}

/// Check component health on startup.
async fn check_health(warehouse: &Warehouse) {
    if warehouse::health::check_connection(warehouse).await {
        health().warehouse.set_healthy();
        info!("Warehouse connection: healthy");
    } else {
        health().warehouse.set_unhealthy("Connection failed");
        error!("Warehouse connection: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
