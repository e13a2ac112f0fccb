use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::file::FileRecordRow;
use crate::models::task::{TaskPatch, TaskRow, TaskStatus};
use crate::state::AppState;
use crate::tasks::service;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

impl UserIdQuery {
    pub fn require(&self) -> Result<Uuid, AppError> {
        let raw = self
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("User ID is required".to_string()))?;
        Uuid::parse_str(raw).map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub tasks: Vec<TaskRow>,
}

#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    pub success: bool,
    pub task: TaskRow,
    pub files: Vec<FileRecordRow>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task: TaskRow,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub task: TaskRow,
    pub queued: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<TaskStatus>,
}

/// GET /api/task?user_id=
pub async fn handle_list_tasks(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TaskListResponse>, AppError> {
    let user_id = params.require()?;
    let tasks = state.store.list_tasks_for_user(user_id).await?;
    Ok(Json(TaskListResponse {
        success: true,
        tasks,
    }))
}

/// GET /api/task/:id
pub async fn handle_get_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TaskDetailResponse>, AppError> {
    let Path(id) = path?;
    let (task, files) = service::load_task_with_files(state.store.as_ref(), id).await?;
    Ok(Json(TaskDetailResponse {
        success: true,
        task,
        files,
    }))
}

/// PATCH /api/task/:id
pub async fn handle_update_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<TaskResponse>, AppError> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    let task = if patch.is_empty() {
        service::require_task(state.store.as_ref(), id).await?
    } else {
        state
            .store
            .update_task(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {id} not found")))?
    };
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

/// DELETE /api/task/:id
pub async fn handle_delete_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Path(id) = path?;
    service::delete_task(state.store.as_ref(), state.blobs.as_ref(), id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// PATCH /api/task/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<TaskResponse>, AppError> {
    let Path(id) = path?;
    let Json(body) = payload?;
    let next = body
        .status
        .ok_or_else(|| AppError::Validation("Status is required".to_string()))?;
    let task = service::change_status(state.store.as_ref(), id, next).await?;
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

/// POST /api/task/:id/dispatch
pub async fn handle_dispatch_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<(StatusCode, Json<DispatchResponse>), AppError> {
    let Path(id) = path?;
    let (task, queued) = service::redispatch(state.store.as_ref(), &state.notifier, id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(DispatchResponse {
            success: true,
            task,
            queued,
        }),
    ))
}

/// DELETE /api/files/:id
pub async fn handle_delete_file(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Path(id) = path?;
    service::delete_file(state.store.as_ref(), state.blobs.as_ref(), id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
