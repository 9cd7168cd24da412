//! Repository for the `import_jobs` table.
//!
//! Status transitions move only forward (queued → processing → done |
//! failed). The terminal transitions carry a SQL guard so a finished job can
//! never be moved again, whatever the caller believes the current state is.

use sqlx::PgPool;
use stockroom_core::import_status::JobStatus;
use stockroom_core::types::DbId;

use crate::models::import_job::{ImportJob, ImportJobListQuery};

/// Column list for `import_jobs` queries.
const COLUMNS: &str = "id, filename, status, total_rows, processed, error, created_at";

/// Provides lifecycle operations for import jobs.
pub struct ImportJobRepo;

impl ImportJobRepo {
    /// Create a new job in `queued` status.
    pub async fn create(pool: &PgPool, filename: &str) -> Result<ImportJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO import_jobs (filename, status) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportJob>(&query)
            .bind(filename)
            .bind(JobStatus::Queued.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a job by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ImportJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM import_jobs WHERE id = $1");
        sqlx::query_as::<_, ImportJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs, newest first.
    pub async fn list(
        pool: &PgPool,
        params: &ImportJobListQuery,
    ) -> Result<Vec<ImportJob>, sqlx::Error> {
        let limit = stockroom_core::pagination::clamp_limit(params.limit);
        let offset = stockroom_core::pagination::clamp_offset(params.offset);

        let query = format!(
            "SELECT {COLUMNS} FROM import_jobs \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ImportJob>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Move a job to `processing` and clear any stale error. A job already
    /// in a terminal status is left untouched.
    pub async fn mark_processing(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE import_jobs SET status = $2, error = NULL \
             WHERE id = $1 AND status NOT IN ($3, $4)",
        )
        .bind(id)
        .bind(JobStatus::Processing.as_str())
        .bind(JobStatus::Done.as_str())
        .bind(JobStatus::Failed.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Persist the pre-scan result: `total_rows` from the file, `processed`
    /// reset to zero.
    pub async fn set_totals(pool: &PgPool, id: DbId, total_rows: i32) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE import_jobs SET total_rows = $2, processed = 0 WHERE id = $1")
            .bind(id)
            .bind(total_rows)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Persist progress after a flushed batch.
    pub async fn set_processed(pool: &PgPool, id: DbId, processed: i32) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE import_jobs SET processed = $2 WHERE id = $1")
            .bind(id)
            .bind(processed)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Mark a job `done`. No-op if the job is already terminal.
    pub async fn mark_done(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE import_jobs SET status = $2 \
             WHERE id = $1 AND status NOT IN ($2, $3)",
        )
        .bind(id)
        .bind(JobStatus::Done.as_str())
        .bind(JobStatus::Failed.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job `failed` with a human-readable error. No-op if the job is
    /// already terminal, so a late failure can never overwrite `done`.
    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE import_jobs SET status = $2, error = $3 \
             WHERE id = $1 AND status NOT IN ($2, $4)",
        )
        .bind(id)
        .bind(JobStatus::Failed.as_str())
        .bind(error)
        .bind(JobStatus::Done.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }
}
