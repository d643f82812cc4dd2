//! CSV ingestion pipeline.
//!
//! One invocation is one unit of work: read and count the source,
//! validate the header, clean rows, then resolve dimensions and load
//! facts inside a single transaction. The run audit record is written
//! through the pool, created before any data write and finalized after
//! the commit or the rollback, so a Failed run survives the rollback
//! that discards its data writes.
//!
//! Per-row defects never abort the run; they are dropped during
//! cleaning and visible only as the extracted-vs-loaded gap. Any other
//! error aborts the invocation, rolls back every data write, marks the
//! run Failed, and propagates to the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use etl_core::{Error, EtlRun, OrderRecord, RawOrderRow, Result, REQUIRED_COLUMNS};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use warehouse::{
    dimensions, facts::load_fact, runs, FactRecord, LoadOutcome, Warehouse,
};

/// Pipeline invocation inputs: source path plus provenance labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Path to the orders CSV feed
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    /// Provenance tag recorded on the run
    #[serde(default = "default_source")]
    pub source: String,
    /// Job label recorded on the run
    #[serde(default = "default_job_name")]
    pub job_name: String,
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("data/raw/orders.csv")
}

fn default_source() -> String {
    "csv".to_string()
}

fn default_job_name() -> String {
    "load_csv_orders".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            source: default_source(),
            job_name: default_job_name(),
        }
    }
}

/// The CSV ingestion pipeline.
#[derive(Clone)]
pub struct CsvPipeline {
    warehouse: Arc<Warehouse>,
}

impl CsvPipeline {
    pub fn new(warehouse: Arc<Warehouse>) -> Self {
        Self { warehouse }
    }

    /// Execute one pipeline invocation and return the finalized run.
    pub async fn run(&self, config: &PipelineConfig) -> Result<EtlRun> {
        let run = runs::create_run(&self.warehouse, &config.source, &config.job_name).await?;
        info!(
            run_id = run.run_id,
            path = %config.csv_path.display(),
            job = %config.job_name,
            "ETL run started"
        );

        match self.execute(run.run_id, config).await {
            Ok(loaded) => {
                runs::finish_success(&self.warehouse, run.run_id, loaded).await?;
                let run = runs::fetch_run(&self.warehouse, run.run_id).await?;
                info!(
                    run_id = run.run_id,
                    rows_extracted = run.rows_extracted,
                    rows_loaded = run.rows_loaded,
                    "ETL run succeeded"
                );
                Ok(run)
            }
            Err(e) => {
                error!(run_id = run.run_id, error = %e, "ETL run failed");
                // Data writes are already rolled back (the transaction
                // was dropped); the audit write goes through a fresh
                // pool connection so the Failed record is durable.
                if let Err(audit_err) =
                    runs::finish_failed(&self.warehouse, run.run_id, &e.to_string()).await
                {
                    error!(
                        run_id = run.run_id,
                        error = %audit_err,
                        "Failed to record run failure"
                    );
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, run_id: i64, config: &PipelineConfig) -> Result<i64> {
        let source = read_source(&config.csv_path)?;
        let extracted = source.records.len() as i64;
        runs::set_rows_extracted(&self.warehouse, run_id, extracted).await?;

        let header_index = validate_columns(&source.headers)?;
        let records = clean_rows(&source, &header_index);
        if (records.len() as i64) < extracted {
            debug!(
                run_id,
                dropped = extracted - records.len() as i64,
                "Dropped defective rows during cleaning"
            );
        }

        let mut tx = self.warehouse.begin().await?;
        let mut loaded = 0i64;

        for record in &records {
            let time_dim =
                dimensions::resolve_time(&mut tx, record.created_at.date_naive()).await?;

            let (customer, refreshed) =
                dimensions::upsert_customer(&mut tx, &record.customer_record()).await?;
            if refreshed {
                debug!(run_id, customer_id = %customer.customer_id, "Customer attributes refreshed");
            }

            let (product, refreshed) =
                dimensions::upsert_product(&mut tx, &record.product_record()).await?;
            if refreshed {
                debug!(run_id, product_id = %product.product_id, "Product attributes refreshed");
            }

            let fact = FactRecord {
                order_id: record.order_id.clone(),
                customer_key: customer.customer_key,
                product_key: product.product_key,
                time_key: time_dim.time_key,
                unit_price: record.price,
                quantity: record.quantity,
                discount_amount: record.discount_amount,
                created_at: record.created_at,
            };
            match load_fact(&mut tx, &fact).await? {
                LoadOutcome::Inserted => loaded += 1,
                LoadOutcome::Skipped => {
                    debug!(run_id, order_id = %record.order_id, "Duplicate fact skipped");
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| Error::storage(format!("commit failed: {e}")))?;

        Ok(loaded)
    }
}

struct SourceRows {
    headers: csv::StringRecord,
    records: Vec<csv::StringRecord>,
}

fn read_source(path: &Path) -> Result<SourceRows> {
    if !path.exists() {
        return Err(Error::source_not_found(path.display().to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::csv(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::csv(e.to_string()))?
        .clone();

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record.map_err(|e| Error::csv(e.to_string()))?);
    }

    Ok(SourceRows { headers, records })
}

/// Check the header against the required-column set; returns the
/// column index map on success.
fn validate_columns(headers: &csv::StringRecord) -> Result<HashMap<String, usize>> {
    let index: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !index.contains_key(**col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(index)
    } else {
        Err(Error::schema_validation(missing))
    }
}

fn clean_rows(source: &SourceRows, header_index: &HashMap<String, usize>) -> Vec<OrderRecord> {
    let field = |record: &csv::StringRecord, column: &str| -> String {
        header_index
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
            .to_string()
    };

    source
        .records
        .iter()
        .filter_map(|record| {
            let order_id = field(record, "order_id");
            let customer_id = field(record, "customer_id");
            let email = field(record, "email");
            let country = field(record, "country");
            let city = field(record, "city");
            let product_id = field(record, "product_id");
            let product_name = field(record, "product_name");
            let category = field(record, "category");
            let price = field(record, "price");
            let quantity = field(record, "quantity");
            let discount_amount = field(record, "discount_amount");
            let created_at = field(record, "created_at");

            RawOrderRow {
                order_id: &order_id,
                customer_id: &customer_id,
                email: &email,
                country: &country,
                city: &city,
                product_id: &product_id,
                product_name: &product_name,
                category: &category,
                price: &price,
                quantity: &quantity,
                discount_amount: &discount_amount,
                created_at: &created_at,
            }
            .clean()
        })
        .collect()
}
