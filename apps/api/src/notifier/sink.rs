use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::Notification;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Processor responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Destination for task notifications.
#[async_trait]
pub trait ProcessorSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// POSTs `{ taskId, files }` to the downstream processor. The response body
/// is not interpreted; any 2xx counts as delivered.
#[derive(Clone)]
pub struct HttpProcessorSink {
    client: Client,
    url: String,
}

impl HttpProcessorSink {
    pub fn new(url: String) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ProcessorSink for HttpProcessorSink {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(task_id = %notification.task_id, "Processor accepted notification ({status})");
        Ok(())
    }
}
