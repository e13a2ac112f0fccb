use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::task_config::{NewTaskConfig, TaskConfigRow};
use crate::store::TaskStore;

/// Returns the config attached to the user's most recent task.
///
/// A fresh default config is persisted and returned when the user has no
/// task, the latest task has no config, or its config row no longer exists.
pub async fn resolve_for_user(
    store: &dyn TaskStore,
    user_id: Uuid,
) -> Result<TaskConfigRow, AppError> {
    if let Some(config_id) = store.latest_task_config_id(user_id).await? {
        match store.get_task_config(config_id).await? {
            Some(config) => {
                debug!(%user_id, %config_id, "Resolved last-used task config");
                return Ok(config);
            }
            None => warn!(%user_id, %config_id, "Last-used task config is missing"),
        }
    }

    let config = store.insert_task_config(NewTaskConfig::default()).await?;
    info!(%user_id, config_id = %config.id, "Created default task config");
    Ok(config)
}
