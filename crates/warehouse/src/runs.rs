//! ETL run tracker.
//!
//! The audit trail is deliberately written through the pool, not the
//! ingestion transaction: a run row must be created before any data
//! write and must survive the rollback that discards those writes.
//! Terminal updates are guarded on `status = 'running'` so a run is
//! finalized exactly once.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use etl_core::{Error, EtlRun, Result, RunStatus};

use crate::client::Warehouse;

#[derive(sqlx::FromRow)]
struct RunRow {
    run_id: i64,
    source: String,
    job_name: String,
    status: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    rows_extracted: i64,
    rows_loaded: i64,
    error_message: Option<String>,
}

impl TryFrom<RunRow> for EtlRun {
    type Error = Error;

    fn try_from(row: RunRow) -> Result<Self> {
        Ok(Self {
            run_id: row.run_id,
            source: row.source,
            job_name: row.job_name,
            status: RunStatus::from_str(&row.status)?,
            started_at: row.started_at,
            finished_at: row.finished_at,
            rows_extracted: row.rows_extracted,
            rows_loaded: row.rows_loaded,
            error_message: row.error_message,
        })
    }
}

const RUN_COLUMNS: &str = "run_id, source, job_name, status, started_at, finished_at, \
                           rows_extracted, rows_loaded, error_message";

/// Create a run in `Running` state. Called before any row processing.
pub async fn create_run(warehouse: &Warehouse, source: &str, job_name: &str) -> Result<EtlRun> {
    let result = sqlx::query(
        "INSERT INTO etl_runs (source, job_name, status, started_at) VALUES (?1, ?2, 'running', ?3)",
    )
    .bind(source)
    .bind(job_name)
    .bind(Utc::now())
    .execute(warehouse.pool())
    .await
    .map_err(|e| Error::storage(format!("create run: {e}")))?;

    fetch_run(warehouse, result.last_insert_rowid()).await
}

/// Record the raw row count of the source.
pub async fn set_rows_extracted(warehouse: &Warehouse, run_id: i64, rows: i64) -> Result<()> {
    sqlx::query("UPDATE etl_runs SET rows_extracted = ?1 WHERE run_id = ?2")
        .bind(rows)
        .bind(run_id)
        .execute(warehouse.pool())
        .await
        .map_err(|e| Error::storage(format!("set rows extracted: {e}")))?;
    Ok(())
}

/// Terminal transition to `Success`.
pub async fn finish_success(warehouse: &Warehouse, run_id: i64, rows_loaded: i64) -> Result<()> {
    sqlx::query(
        "UPDATE etl_runs SET status = 'success', rows_loaded = ?1, finished_at = ?2 \
         WHERE run_id = ?3 AND status = 'running'",
    )
    .bind(rows_loaded)
    .bind(Utc::now())
    .bind(run_id)
    .execute(warehouse.pool())
    .await
    .map_err(|e| Error::storage(format!("finish run: {e}")))?;
    Ok(())
}

/// Terminal transition to `Failed`, capturing the error text.
pub async fn finish_failed(warehouse: &Warehouse, run_id: i64, error: &str) -> Result<()> {
    sqlx::query(
        "UPDATE etl_runs SET status = 'failed', error_message = ?1, finished_at = ?2 \
         WHERE run_id = ?3 AND status = 'running'",
    )
    .bind(error)
    .bind(Utc::now())
    .bind(run_id)
    .execute(warehouse.pool())
    .await
    .map_err(|e| Error::storage(format!("finish run: {e}")))?;
    Ok(())
}

/// Fetch a single run.
pub async fn fetch_run(warehouse: &Warehouse, run_id: i64) -> Result<EtlRun> {
    let row: RunRow = sqlx::query_as(&format!(
        "SELECT {RUN_COLUMNS} FROM etl_runs WHERE run_id = ?1"
    ))
    .bind(run_id)
    .fetch_one(warehouse.pool())
    .await
    .map_err(|e| Error::storage(format!("fetch run: {e}")))?;
    row.try_into()
}

/// The most recent runs, newest first.
pub async fn recent_runs(warehouse: &Warehouse, limit: i64) -> Result<Vec<EtlRun>> {
    let rows: Vec<RunRow> = sqlx::query_as(&format!(
        "SELECT {RUN_COLUMNS} FROM etl_runs ORDER BY run_id DESC LIMIT ?1"
    ))
    .bind(limit)
    .fetch_all(warehouse.pool())
    .await
    .map_err(|e| Error::storage(format!("list runs: {e}")))?;

    rows.into_iter().map(TryInto::try_into).collect()
}
