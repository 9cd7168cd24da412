//! Handlers for CSV upload and import job status.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tokio::io::AsyncWriteExt;

use stockroom_core::error::CoreError;
use stockroom_core::importer::DEFAULT_CHUNK_SIZE;
use stockroom_core::types::DbId;
use stockroom_db::models::import_job::{ImportJob, ImportJobListQuery};
use stockroom_db::models::task::{ImportTaskPayload, TaskKind};
use stockroom_db::repositories::{ImportJobRepo, TaskRepo};
use stockroom_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/imports
///
/// Accept a multipart CSV upload, stage it on disk, create a `queued`
/// import job, and enqueue an `import.csv` task for the worker. Returns
/// 202 with the job body so the client can poll `GET /imports/{id}`.
///
/// The upload is streamed to the staging file chunk by chunk; the file
/// never sits in memory as a whole.
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut staged: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        tokio::fs::create_dir_all(&state.config.upload_dir)
            .await
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create upload directory: {e}"))
            })?;

        let path = state
            .config
            .upload_dir
            .join(format!("{}.csv", uuid::Uuid::new_v4()));

        let mut out = tokio::fs::File::create(&path).await.map_err(|e| {
            AppError::InternalError(format!("Failed to create staging file: {e}"))
        })?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?
        {
            out.write_all(&chunk).await.map_err(|e| {
                AppError::InternalError(format!("Failed to write staging file: {e}"))
            })?;
        }
        out.flush().await.map_err(|e| {
            AppError::InternalError(format!("Failed to write staging file: {e}"))
        })?;

        staged = Some(path.to_string_lossy().into_owned());
        break;
    }

    let Some(file_path) = staged else {
        return Err(AppError::BadRequest("multipart field 'file' is required".into()));
    };

    // The job records the staging path; that path is what the worker reads.
    let job = ImportJobRepo::create(&state.pool, &file_path).await?;

    // The job row is kept even when enqueueing the task fails.
    if let Err(err) = enqueue_import_task(&state.pool, &job).await {
        tracing::error!(job_id = job.id, error = %err, "Failed to enqueue import task");
    }

    tracing::info!(job_id = job.id, file = %job.filename, "CSV import queued");

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: job })))
}

/// GET /api/v1/imports
///
/// List import jobs, newest first, with `limit`/`offset` pagination.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ImportJobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = ImportJobRepo::list(&state.pool, &query).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/imports/{id}
///
/// Job status for polling: state, row counts, and the error message when
/// the job failed.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = ImportJobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ImportJob",
            id,
        }))?;

    Ok(Json(DataResponse { data: job }))
}

/// Encode and enqueue the `import.csv` task for a freshly created job.
async fn enqueue_import_task(pool: &DbPool, job: &ImportJob) -> Result<(), AppError> {
    let payload = serde_json::to_value(ImportTaskPayload {
        job_id: job.id,
        file_path: job.filename.clone(),
        chunk_size: DEFAULT_CHUNK_SIZE,
    })
    .map_err(|e| AppError::InternalError(format!("Failed to encode import payload: {e}")))?;

    TaskRepo::enqueue(pool, TaskKind::ImportCsv.as_str(), &payload).await?;
    Ok(())
}
