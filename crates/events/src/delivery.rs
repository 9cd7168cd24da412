//! Single-attempt webhook delivery over HTTP POST.
//!
//! [`WebhookClient`] sends a JSON payload to a subscriber URL and reports
//! what came back. There is no retry: each event gets exactly one attempt
//! per subscriber, and the outcome is recorded on the webhook row so the
//! next attempt starts from a clean slate.

use std::time::{Duration, Instant};

use stockroom_core::events::RESPONSE_SNIPPET_MAX_CHARS;

/// HTTP request timeout for a single delivery attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// DeliveryOutcome
// ---------------------------------------------------------------------------

/// What one delivery attempt produced.
///
/// `status` is `None` when no HTTP response arrived at all (connect failure,
/// DNS error, timeout); `body` then carries the error description instead of
/// a response body. Either way the snippet is capped at
/// [`RESPONSE_SNIPPET_MAX_CHARS`].
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub status: Option<i32>,
    pub body: String,
    pub duration_ms: i32,
}

impl DeliveryOutcome {
    /// True when the subscriber answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

// ---------------------------------------------------------------------------
// WebhookClient
// ---------------------------------------------------------------------------

/// Delivers event payloads to external webhook endpoints. Cheap to clone;
/// clones share the underlying connection pool.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
}

impl WebhookClient {
    /// Create a client with the default per-request timeout.
    pub fn new() -> Self {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }

    /// POST `payload` to `url` and report the outcome.
    ///
    /// This never fails: a transport-level error becomes an outcome with
    /// `status: None`, so callers always have something to record.
    pub async fn post_json(&self, url: &str, payload: &serde_json::Value) -> DeliveryOutcome {
        let started = Instant::now();
        match self.client.post(url).json(payload).send().await {
            Ok(response) => {
                let status = i32::from(response.status().as_u16());
                let body = match response.text().await {
                    Ok(text) => text,
                    Err(err) => describe(&err),
                };
                DeliveryOutcome {
                    status: Some(status),
                    body: snippet(&body),
                    duration_ms: elapsed_ms(started),
                }
            }
            Err(err) => DeliveryOutcome {
                status: None,
                body: snippet(&describe(&err)),
                duration_ms: elapsed_ms(started),
            },
        }
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate recorded text to the bookkeeping cap, counting characters.
fn snippet(text: &str) -> String {
    text.chars().take(RESPONSE_SNIPPET_MAX_CHARS).collect()
}

/// Flatten an error and its sources into a single line. `reqwest::Error`
/// keeps the interesting part ("connection refused", "operation timed out")
/// in its source chain, not in its own `Display`.
fn describe(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn elapsed_ms(started: Instant) -> i32 {
    started.elapsed().as_millis().min(i32::MAX as u128) as i32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
