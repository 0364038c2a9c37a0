//! Topic routing
//!
//! ```text
//! <root>/nodes/<node_id>/data        sensor_data
//! <root>/nodes/<node_id>/heartbeat   heartbeat
//! <root>/nodes/<node_id>/alert       alert
//! <root>/nodes/<node_id>/status      status
//! <root>/nodes/<node_id>/raw         anything else
//! <root>/nodes/<node_id>/command     outbound commands
//! <root>/gateway/<gateway_id>/status gateway status
//! ```

use crate::constants::UNKNOWN_NODE_ID;
use crate::message::{ApplicationMessage, MessageKind};

/// Topic paths for one gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    root: String,
    gateway_id: String,
}

impl TopicScheme {
    pub fn new(root: impl Into<String>, gateway_id: impl Into<String>) -> Self {
        let root: String = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
            gateway_id: gateway_id.into(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn gateway_id(&self) -> &str {
        &self.gateway_id
    }

    fn suffix(kind: MessageKind) -> &'static str {
        match kind {
            MessageKind::SensorData => "data",
            MessageKind::Heartbeat => "heartbeat",
            MessageKind::Alert => "alert",
            MessageKind::Status => "status",
            MessageKind::Unknown => "raw",
        }
    }

    /// Topic for a message of `kind` originating at `node_id`.
    pub fn node_topic(&self, kind: MessageKind, node_id: &str) -> String {
        format!("{}/nodes/{}/{}", self.root, node_id, Self::suffix(kind))
    }

    /// Topic for a decoded inbound message; a missing node id routes to `unknown`.
    pub fn route(&self, message: &ApplicationMessage) -> String {
        let node_id = message.node_id().unwrap_or(UNKNOWN_NODE_ID);
        self.node_topic(message.kind(), node_id)
    }

    pub fn command_topic(&self, node_id: &str) -> String {
        format!("{}/nodes/{}/command", self.root, node_id)
    }

    pub fn gateway_status_topic(&self) -> String {
        format!("{}/gateway/{}/status", self.root, self.gateway_id)
    }
}
