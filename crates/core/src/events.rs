//! Webhook event type constants and delivery bounds.

/// Fired when an import job reaches `done`.
pub const EVENT_IMPORT_COMPLETED: &str = "import.completed";

/// Synthetic event type used by manual test deliveries.
pub const EVENT_WEBHOOK_TEST: &str = "webhook.test";

/// Event types a webhook subscription can be registered for.
pub const SUBSCRIBABLE_EVENT_TYPES: &[&str] = &[EVENT_IMPORT_COMPLETED];

/// Check whether an event type can be subscribed to.
pub fn is_subscribable_event_type(event_type: &str) -> bool {
    SUBSCRIBABLE_EVENT_TYPES.contains(&event_type)
}

/// Maximum number of characters of a delivery response body (or transport
/// error description) stored on the webhook record.
pub const RESPONSE_SNIPPET_MAX_CHARS: usize = 1000;
