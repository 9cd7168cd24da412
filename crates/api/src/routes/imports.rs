//! Route definitions for the `/imports` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::imports;
use crate::state::AppState;

/// Routes mounted at `/imports`.
///
/// ```text
/// GET    /          -> list_jobs
/// POST   /          -> upload_csv (multipart)
/// GET    /{id}      -> get_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(imports::list_jobs).post(imports::upload_csv))
        .route("/{id}", get(imports::get_job))
}
