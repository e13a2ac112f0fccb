use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::task_config::{NewTaskConfig, TaskConfigPatch, TaskConfigRow};
use crate::state::AppState;
use crate::task_config::resolver::resolve_for_user;
use crate::tasks::handlers::UserIdQuery;

#[derive(Debug, Serialize)]
pub struct TaskConfigResponse {
    pub success: bool,
    #[serde(rename = "taskConfig")]
    pub task_config: TaskConfigRow,
}

#[derive(Debug, Serialize)]
pub struct TaskConfigListResponse {
    pub success: bool,
    #[serde(rename = "taskConfigs")]
    pub task_configs: Vec<TaskConfigRow>,
}

/// GET /api/task/config?user_id=
pub async fn handle_get_config(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TaskConfigResponse>, AppError> {
    let user_id = params.require()?;
    let task_config = resolve_for_user(state.store.as_ref(), user_id).await?;
    Ok(Json(TaskConfigResponse {
        success: true,
        task_config,
    }))
}

/// POST /api/task/config
pub async fn handle_create_config(
    State(state): State<AppState>,
    payload: Result<Json<NewTaskConfig>, JsonRejection>,
) -> Result<Json<TaskConfigResponse>, AppError> {
    let Json(config) = payload?;
    let task_config = state.store.insert_task_config(config).await?;
    tracing::info!(config_id = %task_config.id, "Created task config");
    Ok(Json(TaskConfigResponse {
        success: true,
        task_config,
    }))
}

/// PATCH /api/task/config/:id
pub async fn handle_update_config(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TaskConfigPatch>, JsonRejection>,
) -> Result<Json<TaskConfigResponse>, AppError> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    let task_config = state
        .store
        .update_task_config(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task config {id} not found")))?;
    Ok(Json(TaskConfigResponse {
        success: true,
        task_config,
    }))
}

/// GET /api/task/config/history?user_id=
pub async fn handle_config_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TaskConfigListResponse>, AppError> {
    let user_id = params.require()?;
    let task_configs = state.store.task_configs_for_user(user_id).await?;
    Ok(Json(TaskConfigListResponse {
        success: true,
        task_configs,
    }))
}
