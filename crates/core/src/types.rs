//! Primitive aliases shared across the workspace.

/// Primary keys are BIGSERIAL columns; ids stay `i64` end to end.
pub type DbId = i64;

/// Timestamps are stored and exchanged in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
