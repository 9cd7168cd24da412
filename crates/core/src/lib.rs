//! Pure domain logic for the Stockroom catalog service.
//!
//! This crate has no I/O and no internal dependencies so it can be used by
//! the API, the importer pipeline, and the queue worker alike.

pub mod error;
pub mod events;
pub mod import_status;
pub mod importer;
pub mod pagination;
pub mod types;
