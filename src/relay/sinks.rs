//! In-process relay sinks

use super::{PublishError, RelaySink};
use crate::message::ApplicationMessage;
use async_trait::async_trait;
use log::info;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// One published message
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub topic: String,
    pub message: ApplicationMessage,
}

/// Forwards publications into a bounded tokio channel
///
/// Delivery never waits: a full channel rejects the publication. The sink
/// reports itself disconnected once the receiving half is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Publication>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Publication>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RelaySink for ChannelSink {
    async fn publish(&self, topic: &str, message: &ApplicationMessage) -> Result<(), PublishError> {
        let publication = Publication {
            topic: topic.to_string(),
            message: message.clone(),
        };
        self.tx.try_send(publication).map_err(|e| match e {
            TrySendError::Full(_) => PublishError::Rejected {
                topic: topic.to_string(),
                reason: "consumer queue full".to_string(),
            },
            TrySendError::Closed(_) => PublishError::Disconnected,
        })
    }

    fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Logs every publication as a JSON line at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl RelaySink for LogSink {
    async fn publish(&self, topic: &str, message: &ApplicationMessage) -> Result<(), PublishError> {
        let body = serde_json::to_string(message)?;
        info!("[{topic}] {body}");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
