use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Processing state of a task, persisted as the `task_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Whether a task may move from `self` to `next`.
    ///
    /// `failed -> pending` is the re-dispatch path; terminal `completed` never moves.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Pending)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub task_config_id: Option<Uuid>,
    pub input_content_type_id: Option<Uuid>,
    pub output_content_type_id: Option<Uuid>,
    pub user_prompt: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a task is created. The row always starts `pending`.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: Uuid,
    pub task_config_id: Uuid,
    pub input_content_type_id: Option<Uuid>,
    pub output_content_type_id: Option<Uuid>,
    pub user_prompt: Option<String>,
}

/// Partial update merged into an existing task. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub task_config_id: Option<Uuid>,
    pub input_content_type_id: Option<Uuid>,
    pub output_content_type_id: Option<Uuid>,
    pub user_prompt: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.task_config_id.is_none()
            && self.input_content_type_id.is_none()
            && self.output_content_type_id.is_none()
            && self.user_prompt.is_none()
    }
}
