//! Downstream notification queue.
//!
//! Request handlers call [`DispatchQueue::enqueue`], which never waits on the
//! network. A background dispatcher drains the queue and runs up to
//! `max_in_flight` deliveries at once. Each delivery POSTs to the processor
//! with bounded retries and records the outcome on the task's status
//! (`pending -> processing` on delivery, `pending -> failed` once attempts
//! run out).

pub mod sink;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::NotifierSettings;
use crate::models::file::FileRecordRow;
use crate::models::task::TaskStatus;
use crate::store::TaskStore;

pub use sink::{HttpProcessorSink, NotifyError, ProcessorSink};

const QUEUE_CAPACITY: usize = 256;

/// Wire payload sent to the downstream processor.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(rename = "taskId")]
    pub task_id: Uuid,
    pub files: Vec<FileRecordRow>,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt number `attempt` (0-based). Attempt 0 runs immediately,
    /// later attempts back off exponentially.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.initial_backoff
            .saturating_mul(1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX))
    }
}

impl From<&NotifierSettings> for RetryPolicy {
    fn from(settings: &NotifierSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: settings.initial_backoff,
        }
    }
}

/// Handle used by request handlers. Cheap to clone.
#[derive(Clone)]
pub struct DispatchQueue {
    tx: Option<mpsc::Sender<Notification>>,
}

impl DispatchQueue {
    /// A queue that drops everything (no processor configured).
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queues a notification without waiting. Returns whether it was accepted.
    pub fn enqueue(&self, notification: Notification) -> bool {
        let Some(tx) = &self.tx else {
            debug!(task_id = %notification.task_id, "No processor configured, skipping notification");
            return false;
        };
        let task_id = notification.task_id;
        match tx.try_send(notification) {
            Ok(()) => {
                debug!(%task_id, "Notification queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%task_id, "Notification queue full, dropping; task stays pending");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(%task_id, "Notification dispatcher has stopped");
                false
            }
        }
    }
}

/// Builds the queue from settings, spawning the dispatcher when a processor URL is set.
pub fn from_settings(
    settings: &NotifierSettings,
    store: Arc<dyn TaskStore>,
) -> Result<DispatchQueue, NotifyError> {
    match &settings.processor_url {
        Some(url) => {
            let sink = HttpProcessorSink::new(url.clone())?;
            info!("Task processor notifications enabled ({url})");
            Ok(spawn_dispatcher(
                Arc::new(sink),
                store,
                settings.into(),
                settings.max_in_flight,
            ))
        }
        None => {
            warn!("TASK_PROCESSOR_URL not set, task notifications disabled");
            Ok(DispatchQueue::disabled())
        }
    }
}

/// Spawns the background dispatcher and returns the queue feeding it.
/// The dispatcher exits once every `DispatchQueue` clone is dropped and the
/// deliveries it started have finished.
pub fn spawn_dispatcher(
    sink: Arc<dyn ProcessorSink>,
    store: Arc<dyn TaskStore>,
    policy: RetryPolicy,
    max_in_flight: usize,
) -> DispatchQueue {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    tokio::spawn(run_dispatcher(rx, sink, store, policy, max_in_flight.max(1)));
    DispatchQueue { tx: Some(tx) }
}

async fn run_dispatcher(
    mut rx: mpsc::Receiver<Notification>,
    sink: Arc<dyn ProcessorSink>,
    store: Arc<dyn TaskStore>,
    policy: RetryPolicy,
    max_in_flight: usize,
) {
    info!(sink = sink.name(), max_in_flight, "Notification dispatcher started");
    let slots = Arc::new(Semaphore::new(max_in_flight));

    while let Some(notification) = rx.recv().await {
        // Waiting here only holds back the queue, never a request.
        let Ok(permit) = slots.clone().acquire_owned().await else {
            break;
        };
        let sink = sink.clone();
        let store = store.clone();
        tokio::spawn(async move {
            let delivered = deliver_with_retry(sink.as_ref(), &notification, policy).await;
            record_outcome(store.as_ref(), notification.task_id, delivered).await;
            drop(permit);
        });
    }

    // Let in-flight deliveries finish before reporting the stop.
    let _ = slots.acquire_many(max_in_flight as u32).await;
    info!("Notification dispatcher stopped");
}

async fn deliver_with_retry(
    sink: &dyn ProcessorSink,
    notification: &Notification,
    policy: RetryPolicy,
) -> bool {
    let task_id = notification.task_id;
    for attempt in 0..policy.max_attempts {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match sink.deliver(notification).await {
            Ok(()) => {
                info!(%task_id, attempt = attempt + 1, "Task notification delivered");
                return true;
            }
            Err(e) => {
                warn!(
                    %task_id,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Task notification attempt failed"
                );
            }
        }
    }
    error!(%task_id, "Task notification undeliverable after {} attempts", policy.max_attempts);
    false
}

async fn record_outcome(store: &dyn TaskStore, task_id: Uuid, delivered: bool) {
    let next = if delivered {
        TaskStatus::Processing
    } else {
        TaskStatus::Failed
    };
    match store
        .transition_status(task_id, TaskStatus::Pending, next)
        .await
    {
        Ok(Some(_)) => debug!(%task_id, "Task status -> {next}"),
        // The processor may already have reported progress, or the task was deleted.
        Ok(None) => debug!(%task_id, "Task no longer pending, status left unchanged"),
        Err(e) => error!(%task_id, error = %e, "Failed to record notification outcome"),
    }
}
