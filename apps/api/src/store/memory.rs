//! In-memory `TaskStore` for unit and router tests.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::error::{DatabaseError, ErrorKind};
use uuid::Uuid;

use super::{StoreResult, TaskStore};
use crate::models::content_type::{ContentTypeRow, LISTED};
use crate::models::file::{FileRecordRow, NewFileRecord};
use crate::models::task::{NewTask, TaskPatch, TaskRow, TaskStatus};
use crate::models::task_config::{NewTaskConfig, TaskConfigPatch, TaskConfigRow};

#[derive(Default)]
struct Tables {
    tasks: HashMap<Uuid, TaskRow>,
    files: HashMap<Uuid, FileRecordRow>,
    configs: HashMap<Uuid, TaskConfigRow>,
    content_types: HashMap<Uuid, ContentTypeRow>,
    /// Monotonic offset so rows created in the same instant still order.
    tick: i64,
}

impl Tables {
    fn now(&mut self) -> chrono::DateTime<Utc> {
        self.tick += 1;
        Utc::now() + Duration::microseconds(self.tick)
    }

    /// Mirrors the `REFERENCES` clauses of the `tasks` table.
    fn check_task_refs(
        &self,
        task_config_id: Option<Uuid>,
        input_content_type_id: Option<Uuid>,
        output_content_type_id: Option<Uuid>,
    ) -> StoreResult<()> {
        if task_config_id.is_some_and(|id| !self.configs.contains_key(&id)) {
            return Err(ForeignKeyViolation::error("tasks_task_config_id_fkey"));
        }
        if input_content_type_id.is_some_and(|id| !self.content_types.contains_key(&id)) {
            return Err(ForeignKeyViolation::error("tasks_input_content_type_id_fkey"));
        }
        if output_content_type_id.is_some_and(|id| !self.content_types.contains_key(&id)) {
            return Err(ForeignKeyViolation::error("tasks_output_content_type_id_fkey"));
        }
        Ok(())
    }
}

/// The error Postgres reports (SQLSTATE 23503) when a row references a
/// missing parent.
#[derive(Debug)]
pub struct ForeignKeyViolation {
    constraint: &'static str,
    message: String,
}

impl ForeignKeyViolation {
    pub fn error(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(Self {
            constraint,
            message: format!(
                "insert or update violates foreign key constraint \"{constraint}\""
            ),
        }))
    }
}

impl fmt::Display for ForeignKeyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ForeignKeyViolation {}

impl DatabaseError for ForeignKeyViolation {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23503"))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::ForeignKeyViolation
    }
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// An empty store seeded with the listed content types.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for ct in LISTED {
            let now = tables.now();
            tables.content_types.insert(
                ct.id,
                ContentTypeRow {
                    id: ct.id,
                    name: ct.name.to_string(),
                    extensions: ct.extensions.iter().map(|e| e.to_string()).collect(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        Self {
            tables: Mutex::new(tables),
        }
    }

    pub fn task_count(&self) -> usize {
        self.tables.lock().unwrap().tasks.len()
    }

    pub fn file_count(&self) -> usize {
        self.tables.lock().unwrap().files.len()
    }

    pub fn config_count(&self) -> usize {
        self.tables.lock().unwrap().configs.len()
    }

    /// Inserts a default task config and returns its id.
    pub fn seed_config(&self) -> Uuid {
        let mut t = self.tables.lock().unwrap();
        let now = t.now();
        let defaults = NewTaskConfig::default();
        let row = TaskConfigRow {
            id: Uuid::new_v4(),
            content_length: defaults.content_length,
            focus_area: defaults.focus_area,
            difficulty_level: defaults.difficulty_level,
            created_at: now,
            updated_at: now,
        };
        let id = row.id;
        t.configs.insert(id, row);
        id
    }

    /// Deletes a config row; referencing tasks lose the link (`ON DELETE SET NULL`).
    pub fn remove_config(&self, id: Uuid) {
        let mut t = self.tables.lock().unwrap();
        t.configs.remove(&id);
        for task in t.tasks.values_mut() {
            if task.task_config_id == Some(id) {
                task.task_config_id = None;
            }
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, task: NewTask) -> StoreResult<TaskRow> {
        let mut t = self.tables.lock().unwrap();
        t.check_task_refs(
            Some(task.task_config_id),
            task.input_content_type_id,
            task.output_content_type_id,
        )?;
        let now = t.now();
        let row = TaskRow {
            id: Uuid::new_v4(),
            user_id: Some(task.user_id),
            task_config_id: Some(task.task_config_id),
            input_content_type_id: task.input_content_type_id,
            output_content_type_id: task.output_content_type_id,
            user_prompt: task.user_prompt,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        t.tasks.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Option<TaskRow>> {
        Ok(self.tables.lock().unwrap().tasks.get(&id).cloned())
    }

    async fn list_tasks_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TaskRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<_> = t
            .tasks
            .values()
            .filter(|r| r.user_id == Some(user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Option<TaskRow>> {
        let mut t = self.tables.lock().unwrap();
        if !t.tasks.contains_key(&id) {
            return Ok(None);
        }
        t.check_task_refs(
            patch.task_config_id,
            patch.input_content_type_id,
            patch.output_content_type_id,
        )?;
        let now = t.now();
        let Some(row) = t.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.task_config_id {
            row.task_config_id = Some(v);
        }
        if let Some(v) = patch.input_content_type_id {
            row.input_content_type_id = Some(v);
        }
        if let Some(v) = patch.output_content_type_id {
            row.output_content_type_id = Some(v);
        }
        if let Some(v) = patch.user_prompt {
            row.user_prompt = Some(v);
        }
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    ) -> StoreResult<Option<TaskRow>> {
        let mut t = self.tables.lock().unwrap();
        let now = t.now();
        match t.tasks.get_mut(&id) {
            Some(row) if row.status == from => {
                row.status = to;
                row.updated_at = now;
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let removed = t.tasks.remove(&id).is_some();
        if removed {
            t.files.retain(|_, f| f.task_id != id);
        }
        Ok(removed)
    }

    async fn insert_file(&self, file: NewFileRecord) -> StoreResult<FileRecordRow> {
        let mut t = self.tables.lock().unwrap();
        if !t.tasks.contains_key(&file.task_id) {
            return Err(ForeignKeyViolation::error("files_task_id_fkey"));
        }
        if file
            .file_type_id
            .is_some_and(|id| !t.content_types.contains_key(&id))
        {
            return Err(ForeignKeyViolation::error("files_file_type_id_fkey"));
        }
        let now = t.now();
        let row = FileRecordRow {
            id: Uuid::new_v4(),
            task_id: file.task_id,
            file_name: file.file_name,
            file_type_id: file.file_type_id,
            file_size: Some(file.file_size),
            stored_location: Some(file.stored_location),
            need_ocr: file.need_ocr,
            file_category: file.file_category,
            created_at: now,
            updated_at: now,
        };
        t.files.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_file(&self, id: Uuid) -> StoreResult<Option<FileRecordRow>> {
        Ok(self.tables.lock().unwrap().files.get(&id).cloned())
    }

    async fn files_for_task(&self, task_id: Uuid) -> StoreResult<Vec<FileRecordRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<_> = t
            .files
            .values()
            .filter(|f| f.task_id == task_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn delete_file(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.lock().unwrap().files.remove(&id).is_some())
    }

    async fn latest_task_config_id(&self, user_id: Uuid) -> StoreResult<Option<Uuid>> {
        let t = self.tables.lock().unwrap();
        Ok(t.tasks
            .values()
            .filter(|r| r.user_id == Some(user_id))
            .max_by_key(|r| r.created_at)
            .and_then(|r| r.task_config_id))
    }

    async fn get_task_config(&self, id: Uuid) -> StoreResult<Option<TaskConfigRow>> {
        Ok(self.tables.lock().unwrap().configs.get(&id).cloned())
    }

    async fn insert_task_config(&self, config: NewTaskConfig) -> StoreResult<TaskConfigRow> {
        let mut t = self.tables.lock().unwrap();
        let now = t.now();
        let row = TaskConfigRow {
            id: Uuid::new_v4(),
            content_length: config.content_length,
            focus_area: config.focus_area,
            difficulty_level: config.difficulty_level,
            created_at: now,
            updated_at: now,
        };
        t.configs.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_task_config(
        &self,
        id: Uuid,
        patch: TaskConfigPatch,
    ) -> StoreResult<Option<TaskConfigRow>> {
        let mut t = self.tables.lock().unwrap();
        let now = t.now();
        let Some(row) = t.configs.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.content_length {
            row.content_length = v;
        }
        if let Some(v) = patch.focus_area {
            row.focus_area = Some(v);
        }
        if let Some(v) = patch.difficulty_level {
            row.difficulty_level = v;
        }
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn task_configs_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TaskConfigRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<TaskConfigRow> = t
            .configs
            .values()
            .filter(|c| {
                t.tasks
                    .values()
                    .any(|task| task.user_id == Some(user_id) && task.task_config_id == Some(c.id))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn content_types_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<ContentTypeRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<_> = ids
            .iter()
            .filter_map(|id| t.content_types.get(id).cloned())
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }
}
