use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreResult, TaskStore};
use crate::models::content_type::ContentTypeRow;
use crate::models::file::{FileRecordRow, NewFileRecord};
use crate::models::task::{NewTask, TaskPatch, TaskRow, TaskStatus};
use crate::models::task_config::{NewTaskConfig, TaskConfigPatch, TaskConfigRow};

/// PostgreSQL-backed store. Cheap to clone; wraps the shared pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, task: NewTask) -> StoreResult<TaskRow> {
        sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks
                (id, user_id, task_config_id, input_content_type_id,
                 output_content_type_id, user_prompt, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(task.user_id)
        .bind(task.task_config_id)
        .bind(task.input_content_type_id)
        .bind(task.output_content_type_id)
        .bind(task.user_prompt)
        .bind(TaskStatus::Pending)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Option<TaskRow>> {
        sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_tasks_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TaskRow>> {
        sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Option<TaskRow>> {
        sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks SET
                task_config_id         = COALESCE($2, task_config_id),
                input_content_type_id  = COALESCE($3, input_content_type_id),
                output_content_type_id = COALESCE($4, output_content_type_id),
                user_prompt            = COALESCE($5, user_prompt),
                updated_at             = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.task_config_id)
        .bind(patch.input_content_type_id)
        .bind(patch.output_content_type_id)
        .bind(patch.user_prompt)
        .fetch_optional(&self.pool)
        .await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    ) -> StoreResult<Option<TaskRow>> {
        sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_file(&self, file: NewFileRecord) -> StoreResult<FileRecordRow> {
        sqlx::query_as::<_, FileRecordRow>(
            r#"
            INSERT INTO files
                (id, task_id, file_name, file_type_id, file_size,
                 stored_location, need_ocr, file_category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(file.task_id)
        .bind(file.file_name)
        .bind(file.file_type_id)
        .bind(file.file_size)
        .bind(file.stored_location)
        .bind(file.need_ocr)
        .bind(file.file_category)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_file(&self, id: Uuid) -> StoreResult<Option<FileRecordRow>> {
        sqlx::query_as::<_, FileRecordRow>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn files_for_task(&self, task_id: Uuid) -> StoreResult<Vec<FileRecordRow>> {
        sqlx::query_as::<_, FileRecordRow>(
            "SELECT * FROM files WHERE task_id = $1 ORDER BY created_at ASC",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_file(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn latest_task_config_id(&self, user_id: Uuid) -> StoreResult<Option<Uuid>> {
        let latest: Option<Option<Uuid>> = sqlx::query_scalar(
            r#"
            SELECT task_config_id FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(latest.flatten())
    }

    async fn get_task_config(&self, id: Uuid) -> StoreResult<Option<TaskConfigRow>> {
        sqlx::query_as::<_, TaskConfigRow>("SELECT * FROM task_configs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_task_config(&self, config: NewTaskConfig) -> StoreResult<TaskConfigRow> {
        sqlx::query_as::<_, TaskConfigRow>(
            r#"
            INSERT INTO task_configs (id, content_length, focus_area, difficulty_level)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(config.content_length)
        .bind(config.focus_area)
        .bind(config.difficulty_level)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_task_config(
        &self,
        id: Uuid,
        patch: TaskConfigPatch,
    ) -> StoreResult<Option<TaskConfigRow>> {
        sqlx::query_as::<_, TaskConfigRow>(
            r#"
            UPDATE task_configs SET
                content_length   = COALESCE($2, content_length),
                focus_area       = COALESCE($3, focus_area),
                difficulty_level = COALESCE($4, difficulty_level),
                updated_at       = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.content_length)
        .bind(patch.focus_area)
        .bind(patch.difficulty_level)
        .fetch_optional(&self.pool)
        .await
    }

    async fn task_configs_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TaskConfigRow>> {
        sqlx::query_as::<_, TaskConfigRow>(
            r#"
            SELECT c.* FROM task_configs c
            WHERE c.id IN (
                SELECT task_config_id FROM tasks
                WHERE user_id = $1 AND task_config_id IS NOT NULL
            )
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn content_types_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<ContentTypeRow>> {
        sqlx::query_as::<_, ContentTypeRow>(
            "SELECT * FROM content_types WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }
}
