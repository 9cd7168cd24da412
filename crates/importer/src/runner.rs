//! Executes one import job from file to finalized status.

use csv_async::{AsyncReaderBuilder, StringRecord};
use futures::StreamExt;
use sqlx::PgPool;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use stockroom_core::events::EVENT_IMPORT_COMPLETED;
use stockroom_core::import_status::JobStatus;
use stockroom_core::importer::{parse_row, strip_bom, RawRow};
use stockroom_core::types::DbId;
use stockroom_db::models::task::{DispatchTaskPayload, TaskKind};
use stockroom_db::repositories::{ImportJobRepo, TaskRepo};

use crate::batcher::UpsertBatcher;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Anything that aborts an import. The `Display` text doubles as the
/// job's recorded `error`, so every variant reads as a sentence.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import job {0} not found")]
    JobNotFound(DbId),

    #[error("CSV file not found: {0}")]
    FileMissing(String),

    #[error("failed to read CSV file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV record: {0}")]
    Csv(#[from] csv_async::Error),

    #[error("failed to encode task payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Final counters of a completed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub total_rows: i32,
    pub processed: i32,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Drives a single import job to completion.
pub struct ImportRunner;

impl ImportRunner {
    /// Run the import for `job_id` against the CSV at `file_path`.
    ///
    /// Any error marks the job `failed` with the error text and is then
    /// re-raised so the task layer records it too. A job already in a
    /// terminal status is left untouched and reported as-is: task
    /// re-delivery must not re-run a finished import.
    pub async fn run(
        pool: &PgPool,
        job_id: DbId,
        file_path: &str,
        chunk_size: usize,
    ) -> Result<ImportOutcome, ImportError> {
        tracing::info!(job_id, file = file_path, "Import started");

        let job = ImportJobRepo::find_by_id(pool, job_id)
            .await?
            .ok_or(ImportError::JobNotFound(job_id))?;

        if JobStatus::parse(&job.status).is_some_and(|s| s.is_terminal()) {
            tracing::info!(job_id, status = %job.status, "Job already finalized, skipping");
            return Ok(ImportOutcome {
                total_rows: job.total_rows,
                processed: job.processed,
            });
        }

        match Self::execute(pool, job_id, file_path, chunk_size).await {
            Ok(outcome) => {
                tracing::info!(
                    job_id,
                    total_rows = outcome.total_rows,
                    processed = outcome.processed,
                    "Import completed"
                );
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!(job_id, error = %err, "Import failed");
                if let Err(mark_err) =
                    ImportJobRepo::mark_failed(pool, job_id, &err.to_string()).await
                {
                    tracing::error!(job_id, error = %mark_err, "Could not record job failure");
                }
                Err(err)
            }
        }
    }

    async fn execute(
        pool: &PgPool,
        job_id: DbId,
        file_path: &str,
        chunk_size: usize,
    ) -> Result<ImportOutcome, ImportError> {
        ImportJobRepo::mark_processing(pool, job_id).await?;

        match tokio::fs::try_exists(file_path).await {
            Ok(true) => {}
            Ok(false) => return Err(ImportError::FileMissing(file_path.to_string())),
            Err(err) => return Err(ImportError::Io(err)),
        }

        let total_rows = Self::count_data_rows(file_path).await?;
        ImportJobRepo::set_totals(pool, job_id, total_rows).await?;

        let processed = if total_rows > 0 {
            Self::stream_rows(pool, job_id, file_path, chunk_size, total_rows).await?
        } else {
            0
        };

        ImportJobRepo::mark_done(pool, job_id).await?;

        // Completion is announced even for zero-row files: subscribers learn
        // that the requested import finished, whatever it contained.
        Self::enqueue_completion_dispatch(pool, job_id, total_rows, processed).await?;

        Ok(ImportOutcome {
            total_rows,
            processed,
        })
    }

    /// Count data rows: physical lines minus the header line, floored at
    /// zero. The pre-scan reads the file once in full before any batch runs.
    async fn count_data_rows(file_path: &str) -> Result<i32, ImportError> {
        let file = File::open(file_path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut count: i64 = 0;
        while lines.next_line().await?.is_some() {
            count += 1;
        }
        Ok((count - 1).clamp(0, i64::from(i32::MAX)) as i32)
    }

    async fn stream_rows(
        pool: &PgPool,
        job_id: DbId,
        file_path: &str,
        chunk_size: usize,
        total_rows: i32,
    ) -> Result<i32, ImportError> {
        let file = File::open(file_path).await?;
        // Flexible: a short record reads like missing trailing columns
        // rather than a hard error.
        let mut reader = AsyncReaderBuilder::new().flexible(true).create_reader(file);

        let headers = reader.headers().await?.clone();
        let columns = ColumnMap::from_headers(&headers);

        let mut batcher = UpsertBatcher::new(pool, chunk_size);
        let mut processed: i32 = 0;

        let mut records = reader.records();
        while let Some(record) = records.next().await {
            let record = record?;
            let Some(row) = parse_row(columns.raw_row(&record)) else {
                // No usable SKU: skipped, not an error.
                continue;
            };

            let flushed = batcher.add(row).await?;
            if flushed > 0 {
                processed += flushed as i32;
                ImportJobRepo::set_processed(pool, job_id, processed).await?;
                tracing::info!(job_id, processed, total_rows, "Imported chunk");
            }
        }

        let flushed = batcher.flush().await?;
        if flushed > 0 {
            processed += flushed as i32;
            ImportJobRepo::set_processed(pool, job_id, processed).await?;
            tracing::info!(job_id, processed, total_rows, "Imported final chunk");
        }

        Ok(processed)
    }

    /// Enqueue the `import.completed` fan-out for a finished job.
    ///
    /// The delivered body uses `total`, not the job resource's `total_rows`
    /// column name; subscribers see `{job_id, total, processed}`.
    async fn enqueue_completion_dispatch(
        pool: &PgPool,
        job_id: DbId,
        total_rows: i32,
        processed: i32,
    ) -> Result<(), ImportError> {
        let payload = serde_json::to_value(DispatchTaskPayload {
            event_type: EVENT_IMPORT_COMPLETED.to_string(),
            payload: serde_json::json!({
                "job_id": job_id,
                "total": total_rows,
                "processed": processed,
            }),
        })?;
        TaskRepo::enqueue(pool, TaskKind::WebhookDispatch.as_str(), &payload).await?;
        tracing::debug!(job_id, "Completion dispatch enqueued");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

/// Positions of the recognised columns in this file's header.
///
/// Matching is exact and case-sensitive; a duplicated header name keeps the
/// rightmost occurrence. Unknown columns are ignored, and a missing column
/// simply reads as absent for every record.
#[derive(Debug, Default)]
struct ColumnMap {
    sku: Option<usize>,
    name: Option<usize>,
    description: Option<usize>,
    price: Option<usize>,
    active: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut map = Self::default();
        for (idx, cell) in headers.iter().enumerate() {
            let cell = if idx == 0 { strip_bom(cell) } else { cell };
            match cell {
                "sku" => map.sku = Some(idx),
                "name" => map.name = Some(idx),
                "description" => map.description = Some(idx),
                "price" => map.price = Some(idx),
                "active" => map.active = Some(idx),
                _ => {}
            }
        }
        map
    }

    fn raw_row<'r>(&self, record: &'r StringRecord) -> RawRow<'r> {
        RawRow {
            sku: self.sku.and_then(|i| record.get(i)),
            name: self.name.and_then(|i| record.get(i)),
            description: self.description.and_then(|i| record.get(i)),
            price: self.price.and_then(|i| record.get(i)),
            active: self.active.and_then(|i| record.get(i)),
        }
    }
}
