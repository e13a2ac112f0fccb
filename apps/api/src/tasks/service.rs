use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::file::FileRecordRow;
use crate::models::task::{TaskRow, TaskStatus};
use crate::notifier::{DispatchQueue, Notification};
use crate::storage::{BlobStore, StoredLocation};
use crate::store::TaskStore;

pub async fn require_task(store: &dyn TaskStore, id: Uuid) -> Result<TaskRow, AppError> {
    store
        .get_task(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {id} not found")))
}

pub async fn load_task_with_files(
    store: &dyn TaskStore,
    id: Uuid,
) -> Result<(TaskRow, Vec<FileRecordRow>), AppError> {
    let task = require_task(store, id).await?;
    let files = store.files_for_task(id).await?;
    Ok((task, files))
}

/// Removes a file's blob. Failures are logged and swallowed; the metadata row
/// is deleted regardless.
async fn remove_blob(blobs: &dyn BlobStore, file: &FileRecordRow) {
    let Some(raw) = file.stored_location.as_deref() else {
        return;
    };
    let location: StoredLocation = match raw.parse() {
        Ok(loc) => loc,
        Err(e) => {
            warn!(file_id = %file.id, "Skipping blob delete: {e}");
            return;
        }
    };
    if let Err(e) = blobs.delete(&location).await {
        warn!(file_id = %file.id, %location, "Blob delete failed: {e}");
    }
}

/// Deletes every file of the task (blob best-effort, then row), then the task.
/// Returns the number of file rows removed.
pub async fn delete_task(
    store: &dyn TaskStore,
    blobs: &dyn BlobStore,
    id: Uuid,
) -> Result<usize, AppError> {
    let (_, files) = load_task_with_files(store, id).await?;

    let mut removed = 0;
    for file in &files {
        remove_blob(blobs, file).await;
        if store.delete_file(file.id).await? {
            removed += 1;
        }
    }

    if !store.delete_task(id).await? {
        return Err(AppError::NotFound(format!("Task {id} not found")));
    }
    info!(task_id = %id, files = removed, "Deleted task");
    Ok(removed)
}

pub async fn delete_file(
    store: &dyn TaskStore,
    blobs: &dyn BlobStore,
    id: Uuid,
) -> Result<(), AppError> {
    let file = store
        .get_file(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {id} not found")))?;
    remove_blob(blobs, &file).await;
    if !store.delete_file(id).await? {
        return Err(AppError::NotFound(format!("File {id} not found")));
    }
    info!(file_id = %id, task_id = %file.task_id, "Deleted file");
    Ok(())
}

/// Applies a status transition if the state machine allows it.
pub async fn change_status(
    store: &dyn TaskStore,
    id: Uuid,
    next: TaskStatus,
) -> Result<TaskRow, AppError> {
    let task = require_task(store, id).await?;
    if !task.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Task {id} cannot move from {} to {next}",
            task.status
        )));
    }
    let updated = store
        .transition_status(id, task.status, next)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Task {id} changed status concurrently")))?;
    info!(task_id = %id, from = %task.status, to = %next, "Task status changed");
    Ok(updated)
}

/// Re-queues the downstream notification for a `pending` or `failed` task.
/// A `failed` task is moved back to `pending` first.
pub async fn redispatch(
    store: &dyn TaskStore,
    queue: &DispatchQueue,
    id: Uuid,
) -> Result<(TaskRow, bool), AppError> {
    let mut task = require_task(store, id).await?;
    match task.status {
        TaskStatus::Pending => {}
        TaskStatus::Failed => task = change_status(store, id, TaskStatus::Pending).await?,
        other => {
            return Err(AppError::Conflict(format!(
                "Task {id} is {other}; only pending or failed tasks can be dispatched"
            )))
        }
    }
    let files = store.files_for_task(id).await?;
    let queued = queue.enqueue(Notification {
        task_id: id,
        files,
    });
    Ok((task, queued))
}
