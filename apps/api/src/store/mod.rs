//! Row access for tasks, files, task configs and content types.
//!
//! Handlers and services depend on [`TaskStore`]; production wires in
//! [`PgStore`]. Errors are plain `sqlx::Error`; `?` turns foreign-key
//! violations into `AppError::Validation` and everything else into
//! `AppError::Database`.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::content_type::ContentTypeRow;
use crate::models::file::{FileRecordRow, NewFileRecord};
use crate::models::task::{NewTask, TaskPatch, TaskRow, TaskStatus};
use crate::models::task_config::{NewTaskConfig, TaskConfigPatch, TaskConfigRow};

pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait TaskStore: Send + Sync {
    // Tasks
    async fn create_task(&self, task: NewTask) -> StoreResult<TaskRow>;
    async fn get_task(&self, id: Uuid) -> StoreResult<Option<TaskRow>>;
    /// Newest first.
    async fn list_tasks_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TaskRow>>;
    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Option<TaskRow>>;
    /// Moves `id` from `from` to `to` only if its current status is `from`.
    /// Returns `None` when the task is missing or its status differs.
    async fn transition_status(
        &self,
        id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    ) -> StoreResult<Option<TaskRow>>;
    /// Returns whether a row was removed.
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    // Files
    async fn insert_file(&self, file: NewFileRecord) -> StoreResult<FileRecordRow>;
    async fn get_file(&self, id: Uuid) -> StoreResult<Option<FileRecordRow>>;
    async fn files_for_task(&self, task_id: Uuid) -> StoreResult<Vec<FileRecordRow>>;
    async fn delete_file(&self, id: Uuid) -> StoreResult<bool>;

    // Task configs
    /// `task_config_id` of the user's most recently created task, if any.
    async fn latest_task_config_id(&self, user_id: Uuid) -> StoreResult<Option<Uuid>>;
    async fn get_task_config(&self, id: Uuid) -> StoreResult<Option<TaskConfigRow>>;
    async fn insert_task_config(&self, config: NewTaskConfig) -> StoreResult<TaskConfigRow>;
    async fn update_task_config(
        &self,
        id: Uuid,
        patch: TaskConfigPatch,
    ) -> StoreResult<Option<TaskConfigRow>>;
    /// Distinct configs referenced by the user's tasks.
    async fn task_configs_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TaskConfigRow>>;

    // Reference data
    async fn content_types_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<ContentTypeRow>>;
}
