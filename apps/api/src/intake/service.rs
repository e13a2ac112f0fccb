use tracing::{error, info};

use crate::errors::AppError;
use crate::intake::form::Submission;
use crate::intake::ocr::needs_ocr;
use crate::models::content_type::infer_from_file_name;
use crate::models::file::{FileCategory, FileRecordRow, NewFileRecord};
use crate::models::task::{NewTask, TaskRow};
use crate::notifier::{DispatchQueue, Notification};
use crate::storage::{task_file_key, BlobStore};
use crate::store::TaskStore;

#[derive(Debug)]
pub struct IntakeOutcome {
    pub task: TaskRow,
    pub files: Vec<FileRecordRow>,
    /// Whether the downstream notification was accepted by the queue.
    pub queued: bool,
}

/// Persists a validated submission: task row, then each non-empty file
/// (blob first, metadata second), then queues the downstream notification.
///
/// Files are handled one at a time. A failure part-way aborts the request and
/// leaves already-written rows and blobs in place.
pub async fn submit_task(
    store: &dyn TaskStore,
    blobs: &dyn BlobStore,
    queue: &DispatchQueue,
    submission: Submission,
) -> Result<IntakeOutcome, AppError> {
    let Submission {
        user_id,
        task_config_id,
        input_content_type_id,
        output_content_type_id,
        user_prompt,
        need_ocr,
        files,
    } = submission;

    let task = store
        .create_task(NewTask {
            user_id,
            task_config_id,
            input_content_type_id,
            output_content_type_id,
            user_prompt,
        })
        .await?;
    info!(task_id = %task.id, %user_id, "Created task");

    let mut records = Vec::with_capacity(files.len());
    for (index, file) in files.into_iter().filter(|f| f.size() > 0).enumerate() {
        let key = task_file_key(task.id, index, &file.file_name);
        let ocr = needs_ocr(&file.file_name, &file.bytes, need_ocr).await;
        let size = file.size() as i64;

        let location = blobs
            .put(&key, file.bytes, file.content_type.as_deref())
            .await
            .map_err(|e| {
                error!(
                    task_id = %task.id,
                    key = %key,
                    stored = records.len(),
                    "Upload failed, earlier files are left in place: {e}"
                );
                e
            })?;

        // Prefer what the file actually is; fall back to what the form declared.
        let file_type_id = infer_from_file_name(&file.file_name)
            .map(|ct| ct.id)
            .or(input_content_type_id);

        let record = store
            .insert_file(NewFileRecord {
                task_id: task.id,
                file_name: file.file_name,
                file_type_id,
                file_size: size,
                stored_location: location.to_string(),
                need_ocr: ocr,
                file_category: FileCategory::Input,
            })
            .await?;
        records.push(record);
    }
    info!(task_id = %task.id, files = records.len(), "Stored task files");

    let queued = queue.enqueue(Notification {
        task_id: task.id,
        files: records.clone(),
    });

    Ok(IntakeOutcome {
        task,
        files: records,
        queued,
    })
}
