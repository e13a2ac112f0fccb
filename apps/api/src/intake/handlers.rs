use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::intake::form::read_multipart;
use crate::intake::service::submit_task;
use crate::models::file::FileRecordRow;
use crate::models::task::TaskRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub success: bool,
    pub task: TaskRow,
    pub files: Vec<FileRecordRow>,
}

/// POST /api/task
///
/// The whole form is read and validated before anything is written.
pub async fn handle_create_task(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), AppError> {
    let submission = read_multipart(multipart?)
        .await?
        .validate(state.config.max_upload_bytes)?;

    let outcome = submit_task(
        state.store.as_ref(),
        state.blobs.as_ref(),
        &state.notifier,
        submission,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            success: true,
            task: outcome.task,
            files: outcome.files,
        }),
    ))
}
