//! The CSV import pipeline.
//!
//! [`ImportRunner`] drives one job end to end: pre-scan for the row count,
//! stream records through the row parser, feed an [`UpsertBatcher`] that
//! flushes bounded batches into Postgres, persist progress after every
//! flush, and finally enqueue the completion webhook dispatch. Memory stays
//! O(batch size) no matter how large the file is.

pub mod batcher;
pub mod runner;

pub use batcher::UpsertBatcher;
pub use runner::{ImportError, ImportOutcome, ImportRunner};
