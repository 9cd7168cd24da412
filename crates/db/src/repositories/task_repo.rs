//! Repository for the `tasks` table: the Postgres-backed work queue.
//!
//! Producers enqueue a (kind, payload) row; workers claim the oldest queued
//! row with `FOR UPDATE SKIP LOCKED` so concurrent workers never
//! double-claim and a claim that loses its transaction simply stays queued.

use sqlx::PgPool;
use stockroom_core::import_status::TaskStatus;
use stockroom_core::types::DbId;

use crate::models::task::Task;

/// Column list for `tasks` queries.
const COLUMNS: &str = "id, kind, payload, status, error, claimed_at, finished_at, created_at";

/// Provides queue operations for background tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Enqueue a new task.
    pub async fn enqueue(
        pool: &PgPool,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (kind, payload, status) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(kind)
            .bind(payload)
            .bind(TaskStatus::Queued.as_str())
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest queued task.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` to prevent double-dispatch
    /// when multiple worker instances are running.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks \
             SET status = $1, claimed_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE status = $2 \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(TaskStatus::Running.as_str())
            .bind(TaskStatus::Queued.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Mark a task as finished successfully.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET status = $2, finished_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(TaskStatus::Done.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Mark a task as failed with its error text. Failed tasks are not
    /// retried automatically; the row is the operator's record.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET status = $2, error = $3, finished_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(TaskStatus::Failed.as_str())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }
}
