//! Repository for the `webhooks` table.

use sqlx::PgPool;
use stockroom_core::events::EVENT_IMPORT_COMPLETED;
use stockroom_core::types::DbId;

use crate::models::webhook::{CreateWebhook, UpdateWebhook, Webhook, WebhookListQuery};

/// Column list for `webhooks` queries.
const COLUMNS: &str = "\
    id, name, url, enabled, event_type, \
    last_status, last_response, last_response_time_ms, created_at";

/// Provides CRUD and delivery-bookkeeping operations for webhooks.
pub struct WebhookRepo;

impl WebhookRepo {
    /// Register a new webhook subscription.
    pub async fn create(pool: &PgPool, input: &CreateWebhook) -> Result<Webhook, sqlx::Error> {
        let query = format!(
            "INSERT INTO webhooks (name, url, enabled, event_type) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(input.name.as_deref().unwrap_or(""))
            .bind(&input.url)
            .bind(input.enabled.unwrap_or(true))
            .bind(input.event_type.as_deref().unwrap_or(EVENT_IMPORT_COMPLETED))
            .fetch_one(pool)
            .await
    }

    /// Find a webhook by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Webhook>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM webhooks WHERE id = $1");
        sqlx::query_as::<_, Webhook>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List webhooks, newest first.
    pub async fn list(
        pool: &PgPool,
        params: &WebhookListQuery,
    ) -> Result<Vec<Webhook>, sqlx::Error> {
        let limit = stockroom_core::pagination::clamp_limit(params.limit);
        let offset = stockroom_core::pagination::clamp_offset(params.offset);

        let query = format!(
            "SELECT {COLUMNS} FROM webhooks \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a webhook. Omitted fields keep their current value; delivery
    /// bookkeeping is never touched here.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWebhook,
    ) -> Result<Option<Webhook>, sqlx::Error> {
        let query = format!(
            "UPDATE webhooks SET \
                name = COALESCE($2, name), \
                url = COALESCE($3, url), \
                enabled = COALESCE($4, enabled), \
                event_type = COALESCE($5, event_type) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(id)
            .bind(input.name.as_deref())
            .bind(input.url.as_deref())
            .bind(input.enabled)
            .bind(input.event_type.as_deref())
            .fetch_optional(pool)
            .await
    }

    /// Delete a webhook by ID. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All enabled subscriptions for an event type, in registration order.
    pub async fn list_enabled_for_event(
        pool: &PgPool,
        event_type: &str,
    ) -> Result<Vec<Webhook>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM webhooks \
             WHERE enabled = TRUE AND event_type = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(event_type)
            .fetch_all(pool)
            .await
    }

    /// Record the outcome of a delivery attempt.
    ///
    /// `status` is `None` for transport-level failures; `response` then
    /// carries the error description instead of a body.
    pub async fn record_delivery(
        pool: &PgPool,
        id: DbId,
        status: Option<i32>,
        response: &str,
        response_time_ms: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE webhooks SET \
                last_status = $2, \
                last_response = $3, \
                last_response_time_ms = $4 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(response)
        .bind(response_time_ms)
        .execute(pool)
        .await?;
        Ok(())
    }
}
