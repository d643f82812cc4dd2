//! Read-only aggregate queries over the fact table.
//!
//! Date filtering and truncation go through the `dim_time` star join;
//! monetary sums run on integer cents and convert to decimals at the
//! boundary. These queries never write and may run concurrently with
//! ingestion (eventually-consistent reads).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use etl_core::money::{from_cents, round2};
use etl_core::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::client::Warehouse;

/// Headline KPIs for an inclusive date range.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub unique_customers: i64,
    pub avg_order_value: Decimal,
}

pub async fn fetch_kpis(warehouse: &Warehouse, date_from: NaiveDate, date_to: NaiveDate) -> Result<Kpis> {
    let (revenue_cents, total_orders, unique_customers): (i64, i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(f.order_amount_cents), 0), COUNT(*), COUNT(DISTINCT f.customer_key) \
         FROM fact_orders f \
         JOIN dim_time t ON t.time_key = f.time_key \
         WHERE t.date BETWEEN ?1 AND ?2",
    )
    .bind(date_from)
    .bind(date_to)
    .fetch_one(warehouse.pool())
    .await
    .map_err(|e| Error::storage(format!("kpi query: {e}")))?;

    let total_revenue = from_cents(revenue_cents);
    let avg_order_value = if total_orders > 0 {
        round2(total_revenue / Decimal::from(total_orders))
    } else {
        Decimal::ZERO
    };

    Ok(Kpis {
        total_revenue,
        total_orders,
        unique_customers,
        avg_order_value,
    })
}

/// Date-truncation unit for trend buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// SQL expression producing the bucket label. Static strings only.
    /// Weekly labels pair the week with its ISO week-year, so a week
    /// straddling Jan 1 lands in a single bucket.
    fn bucket_expr(&self) -> &'static str {
        match self {
            Self::Daily => "t.date",
            Self::Weekly => "printf('%04d-W%02d', t.week_year, t.week)",
            Self::Monthly => "strftime('%Y-%m', t.date)",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(Error::validation(
                "granularity must be one of: daily, weekly, monthly",
            )),
        }
    }
}

/// One revenue trend bucket.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub bucket: String,
    pub revenue: Decimal,
    pub orders: i64,
    pub unique_customers: i64,
}

pub async fn fetch_revenue_trend(
    warehouse: &Warehouse,
    date_from: NaiveDate,
    date_to: NaiveDate,
    granularity: Granularity,
) -> Result<Vec<TrendPoint>> {
    let sql = format!(
        "SELECT {bucket} AS bucket, \
                COALESCE(SUM(f.order_amount_cents), 0) AS revenue_cents, \
                COUNT(*) AS orders, \
                COUNT(DISTINCT f.customer_key) AS unique_customers \
         FROM fact_orders f \
         JOIN dim_time t ON t.time_key = f.time_key \
         WHERE t.date BETWEEN ?1 AND ?2 \
         GROUP BY 1 ORDER BY 1",
        bucket = granularity.bucket_expr()
    );

    let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(&sql)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(warehouse.pool())
        .await
        .map_err(|e| Error::storage(format!("trend query: {e}")))?;

    Ok(rows
        .into_iter()
        .map(|(bucket, revenue_cents, orders, unique_customers)| TrendPoint {
            bucket,
            revenue: from_cents(revenue_cents),
            orders,
            unique_customers,
        })
        .collect())
}

/// Customer count per RFM segment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentCount {
    pub segment: String,
    pub customers: i64,
}

/// RFM segmentation: recency/frequency/monetary quantile scores
/// (NTILE(5), 5 = best) per customer over the range, mapped to named
/// segments.
pub async fn fetch_customer_segments(
    warehouse: &Warehouse,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<SegmentCount>> {
    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        "WITH rfm AS ( \
             SELECT f.customer_key, \
                    julianday(?2) - julianday(MAX(t.date)) AS recency_days, \
                    COUNT(*) AS frequency, \
                    SUM(f.order_amount_cents) AS monetary_cents \
             FROM fact_orders f \
             JOIN dim_time t ON t.time_key = f.time_key \
             WHERE t.date BETWEEN ?1 AND ?2 \
             GROUP BY f.customer_key \
         ) \
         SELECT NTILE(5) OVER (ORDER BY recency_days DESC) AS r_score, \
                NTILE(5) OVER (ORDER BY frequency ASC) AS f_score, \
                NTILE(5) OVER (ORDER BY monetary_cents ASC) AS m_score \
         FROM rfm",
    )
    .bind(date_from)
    .bind(date_to)
    .fetch_all(warehouse.pool())
    .await
    .map_err(|e| Error::storage(format!("segment query: {e}")))?;

    let mut counts: BTreeMap<&'static str, i64> = BTreeMap::new();
    for (r, f, m) in rows {
        *counts.entry(segment_name(r, f, m)).or_insert(0) += 1;
    }

    Ok(counts
        .into_iter()
        .map(|(segment, customers)| SegmentCount {
            segment: segment.to_string(),
            customers,
        })
        .collect())
}

/// Map an R/F/M tile triplet to a segment label. F and M are averaged:
/// value matters as much as cadence.
fn segment_name(r: i64, f: i64, m: i64) -> &'static str {
    let fm = (f + m + 1) / 2;
    match (r, fm) {
        (4..=5, 4..=5) => "Champions",
        (3..=5, 3..=5) => "Loyal",
        (3..=5, _) => "Potential",
        (2, _) => "At Risk",
        _ => "Hibernating",
    }
}

/// Ranking metric for top products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopMetric {
    Revenue,
    Quantity,
}

impl TopMetric {
    fn order_column(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue_cents",
            Self::Quantity => "total_quantity",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Quantity => "quantity",
        }
    }
}

impl std::str::FromStr for TopMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "revenue" => Ok(Self::Revenue),
            "quantity" => Ok(Self::Quantity),
            _ => Err(Error::validation("metric must be one of: revenue, quantity")),
        }
    }
}

/// One ranked product.
#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_id: String,
    pub name: Option<String>,
    pub revenue: Decimal,
    pub quantity: i64,
}

pub async fn fetch_top_products(
    warehouse: &Warehouse,
    date_from: NaiveDate,
    date_to: NaiveDate,
    metric: TopMetric,
    limit: i64,
) -> Result<Vec<TopProduct>> {
    let sql = format!(
        "SELECT p.product_id, p.name, \
                COALESCE(SUM(f.order_amount_cents), 0) AS revenue_cents, \
                COALESCE(SUM(f.quantity), 0) AS total_quantity \
         FROM fact_orders f \
         JOIN dim_products p ON p.product_key = f.product_key \
         JOIN dim_time t ON t.time_key = f.time_key \
         WHERE t.date BETWEEN ?1 AND ?2 \
         GROUP BY p.product_key \
         ORDER BY {order} DESC \
         LIMIT ?3",
        order = metric.order_column()
    );

    let rows: Vec<(String, Option<String>, i64, i64)> = sqlx::query_as(&sql)
        .bind(date_from)
        .bind(date_to)
        .bind(limit)
        .fetch_all(warehouse.pool())
        .await
        .map_err(|e| Error::storage(format!("top products query: {e}")))?;

    Ok(rows
        .into_iter()
        .map(|(product_id, name, revenue_cents, quantity)| TopProduct {
            product_id,
            name,
            revenue: from_cents(revenue_cents),
            quantity,
        })
        .collect())
}
