//! Multipart form reading and validation for task submissions.

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;

pub const FILES_FIELD: &str = "files";

/// One file part as received.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Every part of the form, before any field is interpreted.
#[derive(Debug, Default)]
pub struct RawSubmission {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

/// A submission that passed validation and may be persisted.
#[derive(Debug)]
pub struct Submission {
    pub user_id: Uuid,
    pub task_config_id: Uuid,
    pub input_content_type_id: Option<Uuid>,
    pub output_content_type_id: Option<Uuid>,
    pub user_prompt: Option<String>,
    pub need_ocr: Option<bool>,
    pub files: Vec<UploadedFile>,
}

fn map_multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// Drains the multipart stream. Parts named `files` are kept as uploads; every
/// other part is read as text. A repeated text field keeps its last value.
pub async fn read_multipart(mut multipart: Multipart) -> Result<RawSubmission, AppError> {
    let mut raw = RawSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == FILES_FIELD {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(map_multipart_error)?;
            raw.files.push(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
        } else if !name.is_empty() {
            let value = field.text().await.map_err(map_multipart_error)?;
            raw.fields.insert(name, value);
        }
    }

    Ok(raw)
}

impl RawSubmission {
    fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn required_uuid(&self, key: &str) -> Result<Uuid, AppError> {
        let raw = self
            .text(key)
            .ok_or_else(|| AppError::Validation(format!("{key} is required")))?;
        parse_uuid(key, raw)
    }

    fn optional_uuid(&self, key: &str) -> Result<Option<Uuid>, AppError> {
        self.text(key).map(|raw| parse_uuid(key, raw)).transpose()
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>, AppError> {
        match self.text(key) {
            None => Ok(None),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(v) => Err(AppError::Validation(format!(
                "{key} must be 'true' or 'false', got '{v}'"
            ))),
        }
    }

    /// Applies the intake policy: `user_id` and `task_config_id` are required
    /// UUIDs, every file must fit in `max_upload_bytes`.
    pub fn validate(self, max_upload_bytes: usize) -> Result<Submission, AppError> {
        let user_id = self.required_uuid("user_id")?;
        let task_config_id = self.required_uuid("task_config_id")?;
        let input_content_type_id = self.optional_uuid("input_content_type_id")?;
        let output_content_type_id = self.optional_uuid("output_content_type_id")?;
        let need_ocr = self.optional_bool("need_ocr")?;
        let user_prompt = self.text("user_prompt").map(str::to_string);

        if let Some(big) = self.files.iter().find(|f| f.size() > max_upload_bytes) {
            return Err(AppError::PayloadTooLarge(format!(
                "File '{}' is {} bytes; the limit is {} bytes",
                big.file_name,
                big.size(),
                max_upload_bytes
            )));
        }

        Ok(Submission {
            user_id,
            task_config_id,
            input_content_type_id,
            output_content_type_id,
            user_prompt,
            need_ocr,
            files: self.files,
        })
    }
}

fn parse_uuid(key: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("{key} must be a UUID")))
}
