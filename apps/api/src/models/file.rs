use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Input,
    Output,
}

/// Metadata for a stored file. `stored_location` is a serialized `StoredLocation`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRecordRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub file_type_id: Option<Uuid>,
    pub file_size: Option<i64>,
    pub stored_location: Option<String>,
    pub need_ocr: bool,
    pub file_category: FileCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub task_id: Uuid,
    pub file_name: String,
    pub file_type_id: Option<Uuid>,
    pub file_size: i64,
    pub stored_location: String,
    pub need_ocr: bool,
    pub file_category: FileCategory,
}
