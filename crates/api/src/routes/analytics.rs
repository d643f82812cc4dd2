//! Aggregate analytics endpoints.
//!
//! All endpoints share the `date_from`/`date_to` range parameters
//! (`YYYY-MM-DD`, inclusive). The range defaults to the first of the
//! current month through today.

use axum::{extract::Query, extract::State, Json};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use warehouse::query::{
    fetch_customer_segments, fetch_kpis, fetch_revenue_trend, fetch_top_products, Granularity,
    Kpis, SegmentCount, TopMetric, TopProduct, TrendPoint,
};

use crate::response::ApiError;
use crate::state::AppState;

const DEFAULT_TOP_LIMIT: i64 = 10;
const MAX_TOP_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub granularity: Option<String>,
    pub metric: Option<String>,
    pub limit: Option<i64>,
}

/// Resolve the inclusive date range, applying defaults.
fn resolve_range(params: &RangeParams) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let today = Utc::now().date_naive();
    let month_start = today
        .with_day(1)
        .unwrap_or(today);

    let date_from = match &params.date_from {
        Some(s) => parse_date(s, "date_from")?,
        None => month_start,
    };
    let date_to = match &params.date_to {
        Some(s) => parse_date(s, "date_to")?,
        None => today,
    };

    if date_from > date_to {
        return Err(ApiError::bad_request("date_from must not be after date_to"));
    }

    Ok((date_from, date_to))
}

fn parse_date(s: &str, name: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{name} must be YYYY-MM-DD")))
}

#[derive(Debug, Serialize)]
pub struct KpisResponse {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(flatten)]
    pub kpis: Kpis,
}

/// GET /api/v1/kpis
pub async fn kpis_handler(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<KpisResponse>, ApiError> {
    let (date_from, date_to) = resolve_range(&params)?;
    let kpis = fetch_kpis(&state.warehouse, date_from, date_to).await?;

    Ok(Json(KpisResponse {
        date_from,
        date_to,
        kpis,
    }))
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub granularity: String,
    pub points: Vec<TrendPoint>,
}

/// GET /api/v1/revenue/trends
pub async fn revenue_trends_handler(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<TrendResponse>, ApiError> {
    let (date_from, date_to) = resolve_range(&params)?;
    let granularity: Granularity = params
        .granularity
        .as_deref()
        .unwrap_or("daily")
        .parse()
        .map_err(ApiError::from)?;

    let points = fetch_revenue_trend(&state.warehouse, date_from, date_to, granularity).await?;

    Ok(Json(TrendResponse {
        granularity: granularity.as_str().to_string(),
        points,
    }))
}

#[derive(Debug, Serialize)]
pub struct SegmentsResponse {
    pub segments: Vec<SegmentCount>,
}

/// GET /api/v1/customers/segments
pub async fn segments_handler(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<SegmentsResponse>, ApiError> {
    let (date_from, date_to) = resolve_range(&params)?;
    let segments = fetch_customer_segments(&state.warehouse, date_from, date_to).await?;

    Ok(Json(SegmentsResponse { segments }))
}

#[derive(Debug, Serialize)]
pub struct TopSellersResponse {
    pub metric: String,
    pub items: Vec<TopProduct>,
}

/// GET /api/v1/products/top-sellers
pub async fn top_sellers_handler(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<TopSellersResponse>, ApiError> {
    let (date_from, date_to) = resolve_range(&params)?;
    let metric: TopMetric = params
        .metric
        .as_deref()
        .unwrap_or("revenue")
        .parse()
        .map_err(ApiError::from)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_TOP_LIMIT)
        .clamp(1, MAX_TOP_LIMIT);

    let items = fetch_top_products(&state.warehouse, date_from, date_to, metric, limit).await?;

    Ok(Json(TopSellersResponse {
        metric: metric.as_str().to_string(),
        items,
    }))
}
