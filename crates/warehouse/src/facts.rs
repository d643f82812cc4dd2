//! Idempotent fact loader.
//!
//! `order_id` uniqueness is the sole deduplication mechanism: the
//! insert is attempted unconditionally and a uniqueness violation maps
//! to `Skipped`. No pre-check, so concurrent loaders cannot race a
//! duplicate in.

use chrono::{DateTime, Utc};
use etl_core::money::{from_cents, round2, to_cents};
use etl_core::{Error, FactOrder, Result};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;

use crate::client::is_unique_violation;

/// Outcome of a fact load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Inserted,
    /// A fact with this business key already exists; nothing written.
    Skipped,
}

/// Input for one fact row, with dimension references already resolved.
#[derive(Debug, Clone)]
pub struct FactRecord {
    pub order_id: String,
    pub customer_key: i64,
    pub product_key: i64,
    pub time_key: i64,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub discount_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl FactRecord {
    /// Net order amount: round2(price * quantity) minus the discount,
    /// rounded again and clamped at zero.
    pub fn net_amount(&self) -> Decimal {
        let gross = round2(self.unit_price * Decimal::from(self.quantity));
        round2(gross - self.discount_amount).max(Decimal::ZERO)
    }
}

/// Insert one fact row; `ingested_at` is set to the load instant and
/// never modified afterwards.
pub async fn load_fact(conn: &mut SqliteConnection, record: &FactRecord) -> Result<LoadOutcome> {
    let amount_cents = to_cents(record.net_amount())
        .ok_or_else(|| Error::validation("order amount out of range"))?;
    let discount_cents = to_cents(round2(record.discount_amount))
        .ok_or_else(|| Error::validation("discount amount out of range"))?;

    let inserted = sqlx::query(
        "INSERT INTO fact_orders \
         (order_id, customer_key, product_key, time_key, order_amount_cents, quantity, discount_cents, created_at, ingested_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(&record.order_id)
    .bind(record.customer_key)
    .bind(record.product_key)
    .bind(record.time_key)
    .bind(amount_cents)
    .bind(record.quantity)
    .bind(discount_cents)
    .bind(record.created_at)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(_) => Ok(LoadOutcome::Inserted),
        Err(e) if is_unique_violation(&e) => Ok(LoadOutcome::Skipped),
        Err(e) => Err(Error::storage(format!("insert fact: {e}"))),
    }
}

#[derive(sqlx::FromRow)]
struct FactRow {
    order_key: i64,
    order_id: String,
    customer_key: i64,
    product_key: i64,
    time_key: i64,
    order_amount_cents: i64,
    quantity: i64,
    discount_cents: i64,
    created_at: DateTime<Utc>,
    ingested_at: DateTime<Utc>,
}

impl From<FactRow> for FactOrder {
    fn from(row: FactRow) -> Self {
        Self {
            order_key: row.order_key,
            order_id: row.order_id,
            customer_key: row.customer_key,
            product_key: row.product_key,
            time_key: row.time_key,
            order_amount: from_cents(row.order_amount_cents),
            quantity: row.quantity,
            discount_amount: from_cents(row.discount_cents),
            created_at: row.created_at,
            ingested_at: row.ingested_at,
        }
    }
}

/// Count all fact rows (verification and tests).
pub async fn count_facts(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM fact_orders")
        .fetch_one(pool)
        .await
        .map_err(|e| Error::storage(format!("count facts: {e}")))?;
    Ok(count)
}

/// Fetch one fact by business key (verification and tests).
pub async fn fetch_fact(pool: &SqlitePool, order_id: &str) -> Result<Option<FactOrder>> {
    let row: Option<FactRow> = sqlx::query_as(
        "SELECT order_key, order_id, customer_key, product_key, time_key, order_amount_cents, \
                quantity, discount_cents, created_at, ingested_at \
         FROM fact_orders WHERE order_id = ?1",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::storage(format!("fetch fact: {e}")))?;
    Ok(row.map(Into::into))
}
