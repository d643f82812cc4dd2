//! Warehouse table schemas.
//!
//! Star schema: three dimensions, one fact, plus the ETL run audit
//! table. Business keys carry UNIQUE constraints, which are the sole
//! deduplication mechanism for both ingestion and concurrent writers.

use etl_core::{Error, Result};
use tracing::debug;

use crate::client::Warehouse;

/// Customer dimension (Type-1; Type-2 fields reserved).
pub const CREATE_DIM_CUSTOMERS: &str = r#"
CREATE TABLE IF NOT EXISTS dim_customers (
    customer_key  INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id   TEXT NOT NULL UNIQUE,
    email         TEXT,
    country       TEXT,
    city          TEXT,
    first_seen_at TEXT,

    -- SCD-ready fields (Type 2 later)
    valid_from    TEXT NOT NULL,
    valid_to      TEXT,
    is_current    INTEGER NOT NULL DEFAULT 1
)
"#;

pub const CREATE_DIM_PRODUCTS: &str = r#"
CREATE TABLE IF NOT EXISTS dim_products (
    product_key INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id  TEXT NOT NULL UNIQUE,
    name        TEXT,
    category    TEXT,
    price_cents INTEGER
)
"#;

/// Time dimension at date grain; rows are never updated after creation.
/// `week_year` is the ISO week-based year, which can differ from `year`
/// around Jan 1.
pub const CREATE_DIM_TIME: &str = r#"
CREATE TABLE IF NOT EXISTS dim_time (
    time_key  INTEGER PRIMARY KEY AUTOINCREMENT,
    date      TEXT NOT NULL UNIQUE,
    year      INTEGER NOT NULL,
    month     INTEGER NOT NULL,
    day       INTEGER NOT NULL,
    week      INTEGER NOT NULL,
    week_year INTEGER NOT NULL
)
"#;

/// Order fact. Monetary columns are integer cents so aggregates stay
/// exact. Dimension references are delete-protected via foreign keys.
pub const CREATE_FACT_ORDERS: &str = r#"
CREATE TABLE IF NOT EXISTS fact_orders (
    order_key          INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id           TEXT NOT NULL UNIQUE,
    customer_key       INTEGER NOT NULL REFERENCES dim_customers(customer_key),
    product_key        INTEGER NOT NULL REFERENCES dim_products(product_key),
    time_key           INTEGER NOT NULL REFERENCES dim_time(time_key),
    order_amount_cents INTEGER NOT NULL CHECK (order_amount_cents >= 0),
    quantity           INTEGER NOT NULL CHECK (quantity > 0),
    discount_cents     INTEGER NOT NULL DEFAULT 0 CHECK (discount_cents >= 0),
    created_at         TEXT NOT NULL,
    ingested_at        TEXT NOT NULL
)
"#;

pub const CREATE_ETL_RUNS: &str = r#"
CREATE TABLE IF NOT EXISTS etl_runs (
    run_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    source         TEXT NOT NULL,
    job_name       TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'running',
    started_at     TEXT NOT NULL,
    finished_at    TEXT,
    rows_extracted INTEGER NOT NULL DEFAULT 0,
    rows_loaded    INTEGER NOT NULL DEFAULT 0,
    error_message  TEXT
)
"#;

const CREATE_INDEXES: [&str; 7] = [
    "CREATE INDEX IF NOT EXISTS idx_dim_customers_country ON dim_customers (country)",
    "CREATE INDEX IF NOT EXISTS idx_dim_products_category ON dim_products (category)",
    "CREATE INDEX IF NOT EXISTS idx_dim_time_year_month ON dim_time (year, month)",
    "CREATE INDEX IF NOT EXISTS idx_fact_orders_created_at ON fact_orders (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_fact_orders_customer ON fact_orders (customer_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_orders_time ON fact_orders (time_key)",
    "CREATE INDEX IF NOT EXISTS idx_etl_runs_job_started ON etl_runs (job_name, started_at)",
];

/// All DDL statements in dependency order.
pub fn all_tables() -> Vec<&'static str> {
    let mut ddl = vec![
        CREATE_DIM_CUSTOMERS,
        CREATE_DIM_PRODUCTS,
        CREATE_DIM_TIME,
        CREATE_FACT_ORDERS,
        CREATE_ETL_RUNS,
    ];
    ddl.extend(CREATE_INDEXES);
    ddl
}

/// Initialize the warehouse schema (idempotent).
pub async fn init_schema(warehouse: &Warehouse) -> Result<()> {
    for ddl in all_tables() {
        sqlx::query(ddl)
            .execute(warehouse.pool())
            .await
            .map_err(|e| Error::storage(format!("ddl failed: {e}")))?;
    }

    debug!("Warehouse schema initialized");
    Ok(())
}
