//! Queued task entity model and the payload schemas carried through the
//! `tasks` table.
//!
//! The queue contract is the payload shape, not the queue mechanics: any
//! producer writes a row with a [`TaskKind`] and the matching payload JSON,
//! and the worker deserializes it back. There is no automatic retry; a
//! failed task keeps its error text for operators.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockroom_core::importer::DEFAULT_CHUNK_SIZE;
use stockroom_core::types::{DbId, Timestamp};

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub kind: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub error: Option<String>,
    pub claimed_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// The kinds of background work the worker knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Run a CSV import for an existing job row.
    ImportCsv,
    /// Deliver an event to every enabled subscriber.
    WebhookDispatch,
    /// Deliver a test payload to a single webhook.
    WebhookTest,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImportCsv => "import.csv",
            Self::WebhookDispatch => "webhook.dispatch",
            Self::WebhookTest => "webhook.test",
        }
    }

    /// Parse a stored kind string. Unknown kinds yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "import.csv" => Some(Self::ImportCsv),
            "webhook.dispatch" => Some(Self::WebhookDispatch),
            "webhook.test" => Some(Self::WebhookTest),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an `import.csv` task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportTaskPayload {
    pub job_id: DbId,
    pub file_path: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

/// Payload of a `webhook.dispatch` task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchTaskPayload {
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Payload of a `webhook.test` task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookTestTaskPayload {
    pub webhook_id: DbId,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
