//! Routes a claimed task to the code that performs it.

use stockroom_db::models::task::{
    DispatchTaskPayload, ImportTaskPayload, Task, TaskKind, WebhookTestTaskPayload,
};
use stockroom_db::DbPool;
use stockroom_events::dispatcher::DispatchError;
use stockroom_events::{WebhookClient, WebhookDispatcher};
use stockroom_importer::{ImportError, ImportRunner};

/// Why a task run failed. The `Display` text becomes the task row's
/// recorded `error`.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("unknown task kind: {0}")]
    UnknownKind(String),

    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Execute one claimed task to completion.
///
/// Each [`TaskKind`] maps to exactly one operation; the payload schema is
/// defined next to the kind in `stockroom_db::models::task`. A payload that
/// does not deserialize fails the task without touching anything else.
pub async fn execute_task(
    pool: &DbPool,
    client: &WebhookClient,
    task: &Task,
) -> Result<(), TaskError> {
    let Some(kind) = TaskKind::parse(&task.kind) else {
        return Err(TaskError::UnknownKind(task.kind.clone()));
    };

    match kind {
        TaskKind::ImportCsv => {
            let payload: ImportTaskPayload = decode(kind, &task.payload)?;
            ImportRunner::run(pool, payload.job_id, &payload.file_path, payload.chunk_size)
                .await?;
        }
        TaskKind::WebhookDispatch => {
            let payload: DispatchTaskPayload = decode(kind, &task.payload)?;
            WebhookDispatcher::dispatch(pool, client, &payload.event_type, &payload.payload)
                .await?;
        }
        TaskKind::WebhookTest => {
            let payload: WebhookTestTaskPayload = decode(kind, &task.payload)?;
            WebhookDispatcher::dispatch_test(pool, client, payload.webhook_id, payload.payload)
                .await?;
        }
    }
    Ok(())
}

fn decode<T: serde::de::DeserializeOwned>(
    kind: TaskKind,
    payload: &serde_json::Value,
) -> Result<T, TaskError> {
    serde_json::from_value(payload.clone()).map_err(|source| TaskError::Payload {
        kind: kind.as_str(),
        source,
    })
}
