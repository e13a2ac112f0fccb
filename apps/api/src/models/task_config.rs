use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_length", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentLength {
    Short,
    #[default]
    Medium,
    Detailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "difficulty_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskConfigRow {
    pub id: Uuid,
    pub content_length: ContentLength,
    pub focus_area: Option<String>,
    pub difficulty_level: DifficultyLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/task/config`. Absent fields take the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTaskConfig {
    #[serde(default)]
    pub content_length: ContentLength,
    #[serde(default)]
    pub focus_area: Option<String>,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfigPatch {
    pub content_length: Option<ContentLength>,
    pub focus_area: Option<String>,
    pub difficulty_level: Option<DifficultyLevel>,
}
