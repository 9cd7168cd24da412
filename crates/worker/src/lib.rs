//! Background worker for queued tasks.
//!
//! [`TaskWorker`] polls the `tasks` table, claims work atomically via
//! [`TaskRepo::claim_next`](stockroom_db::repositories::TaskRepo) and runs
//! each claimed task on its own tokio task, bounded by a concurrency limit.
//! Claiming uses `FOR UPDATE SKIP LOCKED`, so running several worker
//! processes against the same database is safe.

pub mod config;
pub mod executor;
pub mod worker;

pub use config::WorkerConfig;
pub use executor::{execute_task, TaskError};
pub use worker::TaskWorker;
