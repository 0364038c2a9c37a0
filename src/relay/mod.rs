//! # Relay Sink
//!
//! The downstream message bus is reached through the narrow [`RelaySink`]
//! contract: publish one message on one topic. Delivery guarantees belong
//! to the bus; the gateway treats every publish as best effort and never
//! retries the same call.
//!
//! [`TopicScheme`] maps message kinds and node identifiers to topic paths.
//! [`ChannelSink`] hands publications to an in-process consumer and
//! [`LogSink`] simply logs them.

use crate::message::ApplicationMessage;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub mod sinks;
pub mod topics;

pub use sinks::{ChannelSink, LogSink, Publication};
pub use topics::TopicScheme;

/// Publish failures
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Message bus is not connected")]
    Disconnected,

    #[error("Publish to {topic} rejected: {reason}")]
    Rejected { topic: String, reason: String },

    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Downstream publish contract
#[async_trait]
pub trait RelaySink: Send + Sync {
    /// Publish `message` on `topic`.
    async fn publish(&self, topic: &str, message: &ApplicationMessage) -> Result<(), PublishError>;

    /// Whether the bus connection is currently up.
    fn is_connected(&self) -> bool;
}

#[async_trait]
impl<S: RelaySink + ?Sized> RelaySink for Arc<S> {
    async fn publish(&self, topic: &str, message: &ApplicationMessage) -> Result<(), PublishError> {
        (**self).publish(topic, message).await
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
