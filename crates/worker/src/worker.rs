//! The claim-and-execute polling loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use stockroom_db::models::task::Task;
use stockroom_db::repositories::TaskRepo;
use stockroom_db::DbPool;
use stockroom_events::WebhookClient;

use crate::config::WorkerConfig;
use crate::executor::execute_task;

/// Background service that drains the `tasks` queue.
pub struct TaskWorker {
    pool: DbPool,
    client: WebhookClient,
    config: WorkerConfig,
}

impl TaskWorker {
    /// Create a worker with its own webhook delivery client.
    pub fn new(pool: DbPool, config: WorkerConfig) -> Self {
        Self {
            pool,
            client: WebhookClient::new(),
            config,
        }
    }

    /// Run the polling loop until `cancel` fires, then wait for in-flight
    /// tasks to finish (bounded by the configured grace period).
    ///
    /// Every poll claims as many queued tasks as free concurrency slots
    /// allow; each claimed task runs on its own tokio task and releases its
    /// slot when done.
    pub async fn run(&self, cancel: CancellationToken) {
        let slots = Arc::new(Semaphore::new(self.config.concurrency));
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Task worker cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.claim_available(&slots).await;
                }
            }
        }

        self.drain(&slots).await;
    }

    /// Claim and spawn queued tasks while both a slot and a task exist.
    async fn claim_available(&self, slots: &Arc<Semaphore>) {
        loop {
            let Ok(permit) = slots.clone().try_acquire_owned() else {
                break;
            };

            match TaskRepo::claim_next(&self.pool).await {
                Ok(Some(task)) => {
                    let pool = self.pool.clone();
                    let client = self.client.clone();
                    tokio::spawn(async move {
                        process_task(&pool, &client, task).await;
                        drop(permit);
                    });
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(error = %err, "Failed to claim task");
                    break;
                }
            }
        }
    }

    /// Wait until every slot is free again, i.e. no task is in flight.
    async fn drain(&self, slots: &Arc<Semaphore>) {
        let all = self.config.concurrency as u32;
        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        match tokio::time::timeout(grace, slots.acquire_many(all)).await {
            Ok(_) => tracing::info!("All in-flight tasks finished"),
            Err(_) => {
                tracing::warn!(
                    grace_secs = self.config.shutdown_grace_secs,
                    "Shutdown grace elapsed with tasks still running"
                );
            }
        }
    }
}

/// Run one claimed task and record its outcome on the task row.
async fn process_task(pool: &DbPool, client: &WebhookClient, task: Task) {
    tracing::info!(task_id = task.id, kind = %task.kind, "Task started");

    match execute_task(pool, client, &task).await {
        Ok(()) => {
            if let Err(err) = TaskRepo::complete(pool, task.id).await {
                tracing::error!(task_id = task.id, error = %err, "Could not mark task done");
            } else {
                tracing::info!(task_id = task.id, kind = %task.kind, "Task finished");
            }
        }
        Err(task_err) => {
            tracing::error!(task_id = task.id, kind = %task.kind, error = %task_err, "Task failed");
            if let Err(err) = TaskRepo::fail(pool, task.id, &task_err.to_string()).await {
                tracing::error!(task_id = task.id, error = %err, "Could not mark task failed");
            }
        }
    }
}
