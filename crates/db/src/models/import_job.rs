//! Import job entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockroom_core::types::{DbId, Timestamp};

/// A row from the `import_jobs` table.
///
/// `total_rows` is the data-row count from the pre-scan (lines minus
/// header); `processed` only counts rows with a usable SKU, so it can end
/// below `total_rows` on files containing skipped rows. `error` is set only
/// when the job fails.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImportJob {
    pub id: DbId,
    pub filename: String,
    pub status: String,
    pub total_rows: i32,
    pub processed: i32,
    pub error: Option<String>,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /api/v1/imports`.
#[derive(Debug, Default, Deserialize)]
pub struct ImportJobListQuery {
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
