//! Handlers for product catalogue CRUD and the bulk wipe endpoint.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use stockroom_core::error::CoreError;
use stockroom_core::types::DbId;
use stockroom_db::models::product::{CreateProduct, ProductListQuery, UpdateProduct};
use stockroom_db::repositories::ProductRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/products
///
/// Create a new product. The SKU is the case-insensitive identity key, so a
/// duplicate (up to case and surrounding whitespace) is rejected with 409.
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> AppResult<impl IntoResponse> {
    if input.sku.trim().is_empty() {
        return Err(AppError::BadRequest("sku must not be empty".into()));
    }

    let product = ProductRepo::create(&state.pool, &input).await?;

    tracing::info!(product_id = product.id, sku = %product.sku, "Product created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

/// GET /api/v1/products
///
/// List products, newest-updated first. Supports free-text search (`q`),
/// substring filters on `sku` and `name`, an exact `active` filter, and
/// `limit`/`offset` pagination.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<impl IntoResponse> {
    let products = ProductRepo::list(&state.pool, &query).await?;
    Ok(Json(DataResponse { data: products }))
}

/// GET /api/v1/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;

    Ok(Json(DataResponse { data: product }))
}

/// PUT /api/v1/products/{id}
///
/// Partial update: omitted fields keep their current value. Changing the
/// SKU re-derives the identity key and can therefore collide with another
/// product (409).
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<impl IntoResponse> {
    if let Some(sku) = &input.sku {
        if sku.trim().is_empty() {
            return Err(AppError::BadRequest("sku must not be empty".into()));
        }
    }

    let product = ProductRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;

    tracing::info!(product_id = product.id, "Product updated");

    Ok(Json(DataResponse { data: product }))
}

/// DELETE /api/v1/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = ProductRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }));
    }

    tracing::info!(product_id = id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/products
///
/// Remove every product from the catalogue.
pub async fn delete_all_products(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let removed = ProductRepo::delete_all(&state.pool).await?;

    tracing::info!(removed, "All products deleted");

    Ok(StatusCode::NO_CONTENT)
}
