//! Route definitions for the `/webhooks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// ```text
/// GET    /            -> list_webhooks
/// POST   /            -> create_webhook
/// GET    /{id}        -> get_webhook
/// PUT    /{id}        -> update_webhook
/// DELETE /{id}        -> delete_webhook
/// POST   /{id}/test   -> test_webhook
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(webhooks::list_webhooks).post(webhooks::create_webhook),
        )
        .route(
            "/{id}",
            get(webhooks::get_webhook)
                .put(webhooks::update_webhook)
                .delete(webhooks::delete_webhook),
        )
        .route("/{id}/test", post(webhooks::test_webhook))
}
