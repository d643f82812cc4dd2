//! CSV order records: the raw row shape and the cleaning rules that
//! turn one into a loadable record.
//!
//! Cleaning is recover-locally: a defective row is dropped (returns
//! `None`), never an error. Coercion defaults follow the source feed
//! contract: quantity 1, amounts 0.00.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::money::parse_amount;

/// Columns the CSV header must contain. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "order_id",
    "customer_id",
    "email",
    "country",
    "city",
    "product_id",
    "product_name",
    "category",
    "price",
    "quantity",
    "discount_amount",
    "created_at",
];

/// One raw CSV row, borrowed from the reader's string record.
#[derive(Debug, Clone, Copy)]
pub struct RawOrderRow<'a> {
    pub order_id: &'a str,
    pub customer_id: &'a str,
    pub email: &'a str,
    pub country: &'a str,
    pub city: &'a str,
    pub product_id: &'a str,
    pub product_name: &'a str,
    pub category: &'a str,
    pub price: &'a str,
    pub quantity: &'a str,
    pub discount_amount: &'a str,
    pub created_at: &'a str,
}

/// A cleaned, loadable order record.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    pub email: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub product_id: String,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub quantity: i64,
    pub discount_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl RawOrderRow<'_> {
    /// Clean and coerce this row. Returns `None` when the row must be
    /// dropped: missing order/customer/product identifier or an
    /// unparseable `created_at`.
    pub fn clean(&self) -> Option<OrderRecord> {
        let order_id = non_empty(self.order_id)?;
        let customer_id = non_empty(self.customer_id)?;
        let product_id = non_empty(self.product_id)?;
        let created_at = parse_timestamp(self.created_at)?;

        Some(OrderRecord {
            order_id,
            customer_id,
            email: non_empty(self.email),
            country: non_empty(self.country),
            city: non_empty(self.city),
            product_id,
            product_name: non_empty(self.product_name),
            category: non_empty(self.category),
            price: parse_amount(self.price),
            quantity: parse_quantity(self.quantity),
            discount_amount: parse_amount(self.discount_amount),
            created_at,
        })
    }
}

impl OrderRecord {
    /// Candidate customer attributes for dimension resolution.
    pub fn customer_record(&self) -> crate::model::CustomerRecord {
        crate::model::CustomerRecord {
            customer_id: self.customer_id.clone(),
            email: self.email.clone(),
            country: self.country.clone(),
            city: self.city.clone(),
            observed_at: self.created_at,
        }
    }

    /// Candidate product attributes for dimension resolution.
    pub fn product_record(&self) -> crate::model::ProductRecord {
        crate::model::ProductRecord {
            product_id: self.product_id.clone(),
            name: self.product_name.clone(),
            category: self.category.clone(),
            price: self.price,
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Coerce a quantity field to a positive integer, defaulting to 1.
pub fn parse_quantity(raw: &str) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => n,
        _ => 1,
    }
}

/// Parse an order timestamp into an unambiguous UTC instant.
///
/// Accepts RFC 3339 as well as the common naive layouts the feed has
/// shipped. Naive timestamps are assumed local and converted; in the
/// DST gap where a local time does not exist, the value is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    const NAIVE_LAYOUTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(localize(naive));
        }
    }

    // Date-only rows load at local midnight.
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(localize(date.and_hms_opt(0, 0, 0)?));
    }

    None
}

fn localize(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(local) => local.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}
