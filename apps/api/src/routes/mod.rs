pub mod content_types;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::intake::handlers as intake;
use crate::state::AppState;
use crate::task_config::handlers as task_config;
use crate::tasks::handlers as tasks;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_request_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Tasks
        .route(
            "/api/task",
            post(intake::handle_create_task).get(tasks::handle_list_tasks),
        )
        .route(
            "/api/task/:id",
            get(tasks::handle_get_task)
                .patch(tasks::handle_update_task)
                .delete(tasks::handle_delete_task),
        )
        .route("/api/task/:id/status", patch(tasks::handle_update_status))
        .route("/api/task/:id/dispatch", post(tasks::handle_dispatch_task))
        // Task configuration
        .route(
            "/api/task/config",
            get(task_config::handle_get_config).post(task_config::handle_create_config),
        )
        .route(
            "/api/task/config/history",
            get(task_config::handle_config_history),
        )
        .route(
            "/api/task/config/:id",
            patch(task_config::handle_update_config),
        )
        // Files and reference data
        .route("/api/files/:id", delete(tasks::handle_delete_file))
        .route(
            "/api/content-types",
            get(content_types::handle_list_content_types),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
