//! Pagination defaults shared by every list endpoint.

/// Default number of results per page.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum number of results per page.
pub const MAX_LIMIT: i64 = 200;

/// Clamp a caller-supplied limit into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp a caller-supplied offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
