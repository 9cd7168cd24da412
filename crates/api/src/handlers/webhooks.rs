//! Handlers for webhook subscription CRUD and test deliveries.
//!
//! Delivery bookkeeping (`last_status`, `last_response`,
//! `last_response_time_ms`) is written by the dispatcher only; these
//! endpoints expose it read-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use stockroom_core::error::CoreError;
use stockroom_core::events::is_subscribable_event_type;
use stockroom_core::types::DbId;
use stockroom_db::models::task::{TaskKind, WebhookTestTaskPayload};
use stockroom_db::models::webhook::{
    CreateWebhook, TestWebhookRequest, UpdateWebhook, WebhookListQuery,
};
use stockroom_db::repositories::{TaskRepo, WebhookRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_url(url: &str) -> Result<(), AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("url must not be empty".into()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AppError::BadRequest(
            "url must start with http:// or https://".into(),
        ));
    }
    Ok(())
}

fn validate_event_type(event_type: &str) -> Result<(), AppError> {
    if !is_subscribable_event_type(event_type) {
        return Err(AppError::BadRequest(format!(
            "unknown event_type: {event_type}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Webhook CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks
///
/// Create a new webhook subscription. `event_type` defaults to
/// `import.completed` and `enabled` to true.
pub async fn create_webhook(
    State(state): State<AppState>,
    Json(input): Json<CreateWebhook>,
) -> AppResult<impl IntoResponse> {
    validate_url(&input.url)?;
    if let Some(event_type) = &input.event_type {
        validate_event_type(event_type)?;
    }

    let webhook = WebhookRepo::create(&state.pool, &input).await?;

    tracing::info!(webhook_id = webhook.id, url = %webhook.url, "Webhook created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: webhook })))
}

/// GET /api/v1/webhooks
///
/// List webhook subscriptions with `limit`/`offset` pagination.
pub async fn list_webhooks(
    State(state): State<AppState>,
    Query(query): Query<WebhookListQuery>,
) -> AppResult<impl IntoResponse> {
    let webhooks = WebhookRepo::list(&state.pool, &query).await?;
    Ok(Json(DataResponse { data: webhooks }))
}

/// GET /api/v1/webhooks/{id}
pub async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let webhook = WebhookRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Webhook",
            id,
        }))?;

    Ok(Json(DataResponse { data: webhook }))
}

/// PUT /api/v1/webhooks/{id}
///
/// Partial update: omitted fields keep their current value.
pub async fn update_webhook(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWebhook>,
) -> AppResult<impl IntoResponse> {
    if let Some(url) = &input.url {
        validate_url(url)?;
    }
    if let Some(event_type) = &input.event_type {
        validate_event_type(event_type)?;
    }

    let webhook = WebhookRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Webhook",
            id,
        }))?;

    tracing::info!(webhook_id = webhook.id, "Webhook updated");

    Ok(Json(DataResponse { data: webhook }))
}

/// DELETE /api/v1/webhooks/{id}
pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = WebhookRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Webhook",
            id,
        }));
    }

    tracing::info!(webhook_id = id, "Webhook deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Test delivery
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks/{id}/test
///
/// Queue a test delivery to the webhook's URL, bypassing the `enabled`
/// flag. An optional JSON body `{ "payload": ... }` overrides the default
/// test payload. Returns 202; the delivery result lands in the webhook's
/// bookkeeping fields once the worker has made the attempt.
pub async fn test_webhook(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<TestWebhookRequest>>,
) -> AppResult<impl IntoResponse> {
    let webhook = WebhookRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Webhook",
            id,
        }))?;

    let request = body.map(|Json(b)| b).unwrap_or_default();

    let payload = serde_json::to_value(WebhookTestTaskPayload {
        webhook_id: webhook.id,
        payload: request.payload,
    })
    .map_err(|e| AppError::InternalError(format!("Failed to encode test payload: {e}")))?;

    TaskRepo::enqueue(&state.pool, TaskKind::WebhookTest.as_str(), &payload).await?;

    tracing::info!(webhook_id = webhook.id, "Webhook test queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: json!({
                "detail": "Test webhook queued",
                "webhook_id": webhook.id,
            }),
        }),
    ))
}
