//! Dimension upsert engine.
//!
//! All resolvers take a live connection so they run inside the
//! invocation's transaction. Creation is insert-first: the row is
//! attempted unconditionally and a uniqueness violation means another
//! writer (or an earlier row of this file) got there first; the loser
//! re-fetches and proceeds. "Already exists" is the steady state for
//! repeated ingestion runs, never an error.

use chrono::{DateTime, NaiveDate, Utc};
use etl_core::money::{from_cents, to_cents};
use etl_core::{CustomerRecord, DimCustomer, DimProduct, DimTime, Error, ProductRecord, Result};
use sqlx::sqlite::SqliteConnection;
use sqlx::QueryBuilder;

use crate::client::is_unique_violation;

#[derive(sqlx::FromRow)]
struct CustomerRow {
    customer_key: i64,
    customer_id: String,
    email: Option<String>,
    country: Option<String>,
    city: Option<String>,
    first_seen_at: Option<DateTime<Utc>>,
    valid_from: DateTime<Utc>,
    valid_to: Option<DateTime<Utc>>,
    is_current: bool,
}

impl From<CustomerRow> for DimCustomer {
    fn from(row: CustomerRow) -> Self {
        Self {
            customer_key: row.customer_key,
            customer_id: row.customer_id,
            email: row.email,
            country: row.country,
            city: row.city,
            first_seen_at: row.first_seen_at,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            is_current: row.is_current,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_key: i64,
    product_id: String,
    name: Option<String>,
    category: Option<String>,
    price_cents: Option<i64>,
}

impl From<ProductRow> for DimProduct {
    fn from(row: ProductRow) -> Self {
        Self {
            product_key: row.product_key,
            product_id: row.product_id,
            name: row.name,
            category: row.category,
            price: row.price_cents.map(from_cents),
        }
    }
}

#[derive(sqlx::FromRow)]
struct TimeRow {
    time_key: i64,
    date: NaiveDate,
    year: i32,
    month: i32,
    day: i32,
    week: i32,
    week_year: i32,
}

impl From<TimeRow> for DimTime {
    fn from(row: TimeRow) -> Self {
        Self {
            time_key: row.time_key,
            date: row.date,
            year: row.year,
            month: row.month,
            day: row.day,
            week: row.week,
            week_year: row.week_year,
        }
    }
}

/// Resolve or create the customer row for a business key.
///
/// Returns the stored row and whether existing attributes were
/// refreshed in place (Type-1: email/country/city only, when the
/// candidate is non-empty and differs; only changed columns are
/// written).
pub async fn upsert_customer(
    conn: &mut SqliteConnection,
    record: &CustomerRecord,
) -> Result<(DimCustomer, bool)> {
    let inserted = sqlx::query(
        "INSERT INTO dim_customers (customer_id, email, country, city, first_seen_at, valid_from) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&record.customer_id)
    .bind(&record.email)
    .bind(&record.country)
    .bind(&record.city)
    .bind(record.observed_at)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(_) => {
            let row = fetch_customer(conn, &record.customer_id).await?;
            Ok((row, false))
        }
        Err(e) if is_unique_violation(&e) => {
            let existing = fetch_customer(conn, &record.customer_id).await?;
            refresh_customer(conn, existing, record).await
        }
        Err(e) => Err(Error::storage(format!("insert customer: {e}"))),
    }
}

async fn refresh_customer(
    conn: &mut SqliteConnection,
    existing: DimCustomer,
    record: &CustomerRecord,
) -> Result<(DimCustomer, bool)> {
    let mut changed: Vec<(&'static str, &str)> = Vec::new();
    for (column, candidate, stored) in [
        ("email", &record.email, &existing.email),
        ("country", &record.country, &existing.country),
        ("city", &record.city, &existing.city),
    ] {
        if let Some(value) = candidate {
            if stored.as_deref() != Some(value) {
                changed.push((column, value));
            }
        }
    }

    if changed.is_empty() {
        return Ok((existing, false));
    }

    let mut builder = QueryBuilder::new("UPDATE dim_customers SET ");
    let mut fields = builder.separated(", ");
    for (column, value) in &changed {
        fields.push(format!("{column} = "));
        fields.push_bind_unseparated(*value);
    }
    builder.push(" WHERE customer_id = ");
    builder.push_bind(&record.customer_id);
    builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| Error::storage(format!("update customer: {e}")))?;

    let row = fetch_customer(conn, &record.customer_id).await?;
    Ok((row, true))
}

async fn fetch_customer(conn: &mut SqliteConnection, customer_id: &str) -> Result<DimCustomer> {
    let row: CustomerRow = sqlx::query_as(
        "SELECT customer_key, customer_id, email, country, city, first_seen_at, valid_from, valid_to, is_current \
         FROM dim_customers WHERE customer_id = ?1",
    )
    .bind(customer_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| Error::storage(format!("fetch customer: {e}")))?;
    Ok(row.into())
}

/// Resolve or create the product row for a business key. Refreshes
/// name/category/price in place under the same non-empty-and-different
/// rule; a zero candidate price never overwrites a stored price.
pub async fn upsert_product(
    conn: &mut SqliteConnection,
    record: &ProductRecord,
) -> Result<(DimProduct, bool)> {
    let price_cents =
        to_cents(record.price).ok_or_else(|| Error::validation("product price out of range"))?;

    let inserted = sqlx::query(
        "INSERT INTO dim_products (product_id, name, category, price_cents) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&record.product_id)
    .bind(&record.name)
    .bind(&record.category)
    .bind(price_cents)
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(_) => {
            let row = fetch_product(conn, &record.product_id).await?;
            Ok((row, false))
        }
        Err(e) if is_unique_violation(&e) => {
            let existing = fetch_product(conn, &record.product_id).await?;
            refresh_product(conn, existing, record, price_cents).await
        }
        Err(e) => Err(Error::storage(format!("insert product: {e}"))),
    }
}

async fn refresh_product(
    conn: &mut SqliteConnection,
    existing: DimProduct,
    record: &ProductRecord,
    price_cents: i64,
) -> Result<(DimProduct, bool)> {
    let mut builder = QueryBuilder::new("UPDATE dim_products SET ");
    let mut fields = builder.separated(", ");
    let mut changed = false;

    for (column, candidate, stored) in [
        ("name", &record.name, &existing.name),
        ("category", &record.category, &existing.category),
    ] {
        if let Some(value) = candidate {
            if stored.as_deref() != Some(value.as_str()) {
                fields.push(format!("{column} = "));
                fields.push_bind_unseparated(value.as_str());
                changed = true;
            }
        }
    }

    let stored_cents = existing.price.and_then(to_cents);
    if price_cents != 0 && stored_cents != Some(price_cents) {
        fields.push("price_cents = ");
        fields.push_bind_unseparated(price_cents);
        changed = true;
    }

    if !changed {
        return Ok((existing, false));
    }

    builder.push(" WHERE product_id = ");
    builder.push_bind(&record.product_id);
    builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| Error::storage(format!("update product: {e}")))?;

    let row = fetch_product(conn, &record.product_id).await?;
    Ok((row, true))
}

async fn fetch_product(conn: &mut SqliteConnection, product_id: &str) -> Result<DimProduct> {
    let row: ProductRow = sqlx::query_as(
        "SELECT product_key, product_id, name, category, price_cents \
         FROM dim_products WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| Error::storage(format!("fetch product: {e}")))?;
    Ok(row.into())
}

/// Resolve or create the time row for a calendar date. Derived parts
/// are populated at creation and never updated.
pub async fn resolve_time(conn: &mut SqliteConnection, date: NaiveDate) -> Result<DimTime> {
    let (year, month, day, week, week_year) = DimTime::parts(date);

    let inserted = sqlx::query(
        "INSERT INTO dim_time (date, year, month, day, week, week_year) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(date)
    .bind(year)
    .bind(month)
    .bind(day)
    .bind(week)
    .bind(week_year)
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(_) => fetch_time(conn, date).await,
        Err(e) if is_unique_violation(&e) => fetch_time(conn, date).await,
        Err(e) => Err(Error::storage(format!("insert time: {e}"))),
    }
}

async fn fetch_time(conn: &mut SqliteConnection, date: NaiveDate) -> Result<DimTime> {
    let row: TimeRow = sqlx::query_as(
        "SELECT time_key, date, year, month, day, week, week_year FROM dim_time WHERE date = ?1",
    )
    .bind(date)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| Error::storage(format!("fetch time: {e}")))?;
    Ok(row.into())
}
