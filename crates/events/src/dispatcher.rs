//! Fan-out of events to webhook subscribers.
//!
//! [`WebhookDispatcher`] is invoked by the task worker: `webhook.dispatch`
//! tasks fan an event out to every enabled subscriber, `webhook.test` tasks
//! deliver to exactly one endpoint. Both paths record status, response
//! snippet and timing on the webhook row after every attempt.

use sqlx::PgPool;

use stockroom_core::events::EVENT_WEBHOOK_TEST;
use stockroom_core::types::DbId;
use stockroom_db::models::webhook::Webhook;
use stockroom_db::repositories::WebhookRepo;

use crate::delivery::{DeliveryOutcome, WebhookClient};

/// Anything that aborts a dispatch. Individual endpoint failures are not
/// errors; they are outcomes, recorded and logged.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("webhook {0} not found")]
    WebhookNotFound(DbId),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Counters for one fan-out round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Subscribers an attempt was made for.
    pub attempted: usize,
    /// Attempts answered with a 2xx status.
    pub delivered: usize,
}

/// Delivers events to their webhook subscribers.
pub struct WebhookDispatcher;

impl WebhookDispatcher {
    /// Deliver `payload` to every enabled subscriber of `event_type`.
    ///
    /// Subscribers are independent: a failing endpoint neither stops the
    /// others nor fails the round. Only a database error aborts.
    pub async fn dispatch(
        pool: &PgPool,
        client: &WebhookClient,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<DispatchSummary, DispatchError> {
        let subscribers = WebhookRepo::list_enabled_for_event(pool, event_type).await?;
        if subscribers.is_empty() {
            tracing::debug!(event_type, "No enabled subscribers for event");
            return Ok(DispatchSummary::default());
        }

        let mut summary = DispatchSummary::default();
        for webhook in &subscribers {
            summary.attempted += 1;
            let outcome = Self::deliver_and_record(pool, client, webhook, payload).await;
            if outcome.is_success() {
                summary.delivered += 1;
            }
        }

        tracing::info!(
            event_type,
            attempted = summary.attempted,
            delivered = summary.delivered,
            "Webhook dispatch finished"
        );
        Ok(summary)
    }

    /// Deliver a test payload to exactly one webhook, enabled or not: an
    /// explicit test overrides the flag. Uses `payload` when given,
    /// otherwise a generated test payload naming the webhook.
    pub async fn dispatch_test(
        pool: &PgPool,
        client: &WebhookClient,
        webhook_id: DbId,
        payload: Option<serde_json::Value>,
    ) -> Result<DeliveryOutcome, DispatchError> {
        let webhook = WebhookRepo::find_by_id(pool, webhook_id)
            .await?
            .ok_or(DispatchError::WebhookNotFound(webhook_id))?;

        let payload = payload.unwrap_or_else(|| test_payload(&webhook));
        let outcome = Self::deliver_and_record(pool, client, &webhook, &payload).await;
        Ok(outcome)
    }

    /// One attempt against one endpoint, bookkeeping included. A failure to
    /// record the outcome is logged, not raised: the delivery itself already
    /// happened.
    async fn deliver_and_record(
        pool: &PgPool,
        client: &WebhookClient,
        webhook: &Webhook,
        payload: &serde_json::Value,
    ) -> DeliveryOutcome {
        let outcome = client.post_json(&webhook.url, payload).await;
        if outcome.is_success() {
            tracing::info!(
                webhook_id = webhook.id,
                status = outcome.status,
                duration_ms = outcome.duration_ms,
                "Webhook delivered"
            );
        } else {
            tracing::warn!(
                webhook_id = webhook.id,
                status = outcome.status,
                duration_ms = outcome.duration_ms,
                "Webhook delivery failed"
            );
        }

        if let Err(err) = WebhookRepo::record_delivery(
            pool,
            webhook.id,
            outcome.status,
            &outcome.body,
            outcome.duration_ms,
        )
        .await
        {
            tracing::error!(webhook_id = webhook.id, error = %err, "Could not record delivery outcome");
        }

        outcome
    }
}

/// Payload for a test delivery without a caller-supplied body.
fn test_payload(webhook: &Webhook) -> serde_json::Value {
    serde_json::json!({
        "event": EVENT_WEBHOOK_TEST,
        "webhook_id": webhook.id,
        "webhook_name": webhook.name,
        "timestamp": chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_names_the_webhook() {
        let webhook = Webhook {
            id: 7,
            name: "orders feed".to_string(),
            url: "https://example.test/hook".to_string(),
            enabled: false,
            event_type: "import.completed".to_string(),
            last_status: None,
            last_response: None,
            last_response_time_ms: None,
            created_at: chrono::Utc::now(),
        };

        let payload = test_payload(&webhook);
        assert_eq!(payload["event"], EVENT_WEBHOOK_TEST);
        assert_eq!(payload["webhook_id"], 7);
        assert_eq!(payload["webhook_name"], "orders feed");
        assert!(payload["timestamp"].is_string());
    }
}
