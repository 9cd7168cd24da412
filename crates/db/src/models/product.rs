//! Product entity model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockroom_core::types::{DbId, Timestamp};

/// A row from the `products` table.
///
/// `sku_lower` is the case-insensitive identity key (trimmed, lowercased
/// `sku`); `sku` keeps the display form as last written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub sku: String,
    pub sku_lower: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a product via `POST /api/v1/products`.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// Defaults to `true` when omitted.
    pub active: Option<bool>,
}

/// DTO for updating a product. All fields optional; omitted fields keep
/// their current value. A changed `sku` re-derives `sku_lower`.
#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub active: Option<bool>,
}

/// Query parameters for `GET /api/v1/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    /// Free-text search across `sku`, `name`, and `description`.
    pub q: Option<String>,
    /// Substring filter on `sku`.
    pub sku: Option<String>,
    /// Substring filter on `name`.
    pub name: Option<String>,
    /// Exact filter on the active flag.
    pub active: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
