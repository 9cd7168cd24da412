pub mod health;
pub mod imports;
pub mod products;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /products                 list, create (GET, POST), delete all (DELETE)
/// /products/{id}            get, update, delete
///
/// /imports                  upload CSV (POST, multipart), list jobs (GET)
/// /imports/{id}             job status (GET)
///
/// /webhooks                 list, create
/// /webhooks/{id}            get, update, delete
/// /webhooks/{id}/test       queue a test delivery (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Product catalogue CRUD and bulk wipe.
        .nest("/products", products::router())
        // Asynchronous CSV imports.
        .nest("/imports", imports::router())
        // Webhook subscriptions and test deliveries.
        .nest("/webhooks", webhooks::router())
}
