//! Registry senders.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::heartbeat::announcement::Announcement;

/// Transient failure of a single heartbeat send. Never fatal.
#[derive(Debug, Error)]
pub enum HeartbeatSendError {
    /// Network failure talking to the registry.
    #[error("registry unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Registry answered with a non-success status.
    #[error("registry returned status {0}")]
    Status(u16),

    /// The send did not finish within the configured bound.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers announcements to the external registry.
#[async_trait]
pub trait HeartbeatSender: Send + Sync + 'static {
    async fn send(&self, announcement: &Announcement) -> Result<(), HeartbeatSendError>;
}

/// Graph-storable handle to the configured sender.
#[derive(Clone)]
pub struct HeartbeatSink(Arc<dyn HeartbeatSender>);

impl HeartbeatSink {
    pub fn new(sender: Arc<dyn HeartbeatSender>) -> Self {
        Self(sender)
    }

    pub fn sender(&self) -> Arc<dyn HeartbeatSender> {
        self.0.clone()
    }
}

/// POSTs announcements as JSON to the registry endpoint.
pub struct HttpRegistrySender {
    client: reqwest::Client,
    url: Url,
}

impl HttpRegistrySender {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl HeartbeatSender for HttpRegistrySender {
    async fn send(&self, announcement: &Announcement) -> Result<(), HeartbeatSendError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(announcement)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HeartbeatSendError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Used when no registry is configured: announcements only reach the log.
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait]
impl HeartbeatSender for LogSender {
    async fn send(&self, announcement: &Announcement) -> Result<(), HeartbeatSendError> {
        tracing::debug!(
            module = %announcement.module,
            component = %announcement.component,
            timestamp = announcement.timestamp,
            "Heartbeat (no registry configured)"
        );
        Ok(())
    }
}
