//! Webhook subscription entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockroom_core::types::{DbId, Timestamp};

/// A row from the `webhooks` table.
///
/// The `last_*` fields are delivery bookkeeping, written exclusively by the
/// dispatcher after each attempt: `last_status` is `None` when the most
/// recent attempt failed at the transport level (timeout, connection error),
/// in which case `last_response` holds the error description instead of a
/// body.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Webhook {
    pub id: DbId,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub event_type: String,
    pub last_status: Option<i32>,
    pub last_response: Option<String>,
    pub last_response_time_ms: Option<i32>,
    pub created_at: Timestamp,
}

/// DTO for creating a webhook via `POST /api/v1/webhooks`.
///
/// Delivery bookkeeping fields are server-owned and deliberately absent.
#[derive(Debug, Deserialize)]
pub struct CreateWebhook {
    /// Friendly label for the UI. Defaults to empty.
    pub name: Option<String>,
    pub url: String,
    /// Defaults to `true` when omitted.
    pub enabled: Option<bool>,
    /// Defaults to `import.completed` when omitted.
    pub event_type: Option<String>,
}

/// DTO for updating a webhook. All fields optional.
#[derive(Debug, Deserialize)]
pub struct UpdateWebhook {
    pub name: Option<String>,
    pub url: Option<String>,
    pub enabled: Option<bool>,
    pub event_type: Option<String>,
}

/// Body of `POST /api/v1/webhooks/{id}/test`.
#[derive(Debug, Default, Deserialize)]
pub struct TestWebhookRequest {
    /// Custom payload to deliver; a default test payload is used when
    /// omitted.
    pub payload: Option<serde_json::Value>,
}

/// Query parameters for `GET /api/v1/webhooks`.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
