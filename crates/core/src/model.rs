//! Warehouse row models: star-schema dimensions and the order fact.
//!
//! Surrogate keys (`*_key`) are storage-generated; business identifiers
//! (`customer_id`, `product_id`, `order_id`, calendar date) are the
//! unique keys ingestion resolves against.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer dimension row (Type-1 slowly-changing).
///
/// `valid_from`/`valid_to`/`is_current` are reserved for Type-2
/// versioning; the mutation path does not exercise them yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimCustomer {
    pub customer_key: i64,
    pub customer_id: String,
    pub email: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Source event timestamp from the first sighting; immutable.
    pub first_seen_at: Option<DateTime<Utc>>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_current: bool,
}

/// Product dimension row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimProduct {
    pub product_key: i64,
    pub product_id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
}

/// Time dimension row, one per distinct calendar date. Never mutated
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimTime {
    pub time_key: i64,
    pub date: NaiveDate,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    /// ISO-8601 week number.
    pub week: i32,
    /// ISO-8601 week-based year. Differs from `year` for dates whose
    /// ISO week straddles Jan 1.
    pub week_year: i32,
}

impl DimTime {
    /// Derive the calendar parts for a date. Week and week-year follow
    /// ISO-8601.
    pub fn parts(date: NaiveDate) -> (i32, i32, i32, i32, i32) {
        (
            date.year(),
            date.month() as i32,
            date.day() as i32,
            date.iso_week().week() as i32,
            date.iso_week().year(),
        )
    }
}

/// Candidate customer attributes carried by one source row.
///
/// Optional fields may be blank; only non-empty values that differ
/// from the stored row trigger a Type-1 refresh.
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub email: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Event timestamp of the sighting; only used on first creation.
    pub observed_at: DateTime<Utc>,
}

/// Candidate product attributes carried by one source row.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub product_id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
}

/// Order fact row. Immutable once created; `order_id` is the
/// idempotency key for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactOrder {
    pub order_key: i64,
    pub order_id: String,
    pub customer_key: i64,
    pub product_key: i64,
    pub time_key: i64,
    /// Net order amount: round2(price * quantity - discount), >= 0.
    pub order_amount: Decimal,
    pub quantity: i64,
    pub discount_amount: Decimal,
    /// When the order occurred.
    pub created_at: DateTime<Utc>,
    /// When the row was loaded; set once at insert.
    pub ingested_at: DateTime<Utc>,
}
