//! # Application Messages
//!
//! Radio payloads are UTF-8 JSON objects. [`ApplicationMessage`] keeps the
//! decoded field map intact and exposes the two fields the gateway routes on:
//! `type` (the message kind) and `node_id` (the originating node).
//!
//! ```json
//! {"type":"heartbeat","node_id":"n1","battery":3.7}
//! ```
//!
//! Metadata is additive. After a successful decode the listener stamps
//! `received_at`, `rssi` and `snr`; before encoding an outbound message it
//! stamps `sent_at` and `gateway_id`.

use crate::constants::MAX_PAYLOAD_LEN;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub const FIELD_TYPE: &str = "type";
pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_RECEIVED_AT: &str = "received_at";
pub const FIELD_RSSI: &str = "rssi";
pub const FIELD_SNR: &str = "snr";
pub const FIELD_SENT_AT: &str = "sent_at";
pub const FIELD_GATEWAY_ID: &str = "gateway_id";

/// Wire decode/encode failures
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload is JSON but not an object")]
    NotAnObject,

    #[error("Encoded message is {0} bytes, limit is 255")]
    TooLarge(usize),
}

/// Message kinds the gateway routes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    SensorData,
    Heartbeat,
    Alert,
    Status,
    /// Missing, non-string or unrecognised `type`
    Unknown,
}

impl MessageKind {
    pub fn from_type_field(value: Option<&str>) -> Self {
        match value {
            Some("sensor_data") => MessageKind::SensorData,
            Some("heartbeat") => MessageKind::Heartbeat,
            Some("alert") => MessageKind::Alert,
            Some("status") => MessageKind::Status,
            _ => MessageKind::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::SensorData => "sensor_data",
            MessageKind::Heartbeat => "heartbeat",
            MessageKind::Alert => "alert",
            MessageKind::Status => "status",
            MessageKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded application message: an ordered JSON field map
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationMessage {
    fields: Map<String, Value>,
}

impl ApplicationMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Accepts only JSON objects.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(DecodeError::NotAnObject),
        }
    }

    /// Decode a radio payload. Either the whole payload decodes or nothing does.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(bytes)?;
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Encode for the radio, refusing anything the FIFO cannot hold.
    pub fn to_wire(&self) -> Result<Vec<u8>, DecodeError> {
        let bytes = serde_json::to_vec(&self.fields)?;
        if bytes.len() > MAX_PAYLOAD_LEN {
            return Err(DecodeError::TooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    pub fn kind(&self) -> MessageKind {
        MessageKind::from_type_field(self.get_str(FIELD_TYPE))
    }

    pub fn node_id(&self) -> Option<&str> {
        self.get_str(FIELD_NODE_ID)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Add reception metadata. `rssi`/`snr` are written as `null` when unknown.
    pub fn stamp_reception(
        &mut self,
        received_at: DateTime<Utc>,
        rssi_dbm: Option<i16>,
        snr_db: Option<f32>,
    ) {
        self.insert(FIELD_RECEIVED_AT, timestamp(received_at));
        self.insert(FIELD_RSSI, rssi_dbm.map_or(Value::Null, Value::from));
        self.insert(FIELD_SNR, snr_db.map_or(Value::Null, |snr| Value::from(snr as f64)));
    }

    /// Add send metadata.
    pub fn stamp_send(&mut self, sent_at: DateTime<Utc>, gateway_id: &str) {
        self.insert(FIELD_SENT_AT, timestamp(sent_at));
        self.insert(FIELD_GATEWAY_ID, gateway_id);
    }

    /// Sensor readings reported by a node.
    pub fn sensor_data(node_id: &str, data: Value) -> Self {
        let mut message = Self::new()
            .with(FIELD_TYPE, MessageKind::SensorData.as_str())
            .with(FIELD_NODE_ID, node_id);
        if let Some(ts) = data.get("timestamp").cloned() {
            message.insert("timestamp", ts);
        }
        message.with("data", data)
    }

    /// Node status change with free-form details.
    pub fn node_status(node_id: &str, status: &str, details: Option<Value>) -> Self {
        Self::new()
            .with(FIELD_TYPE, MessageKind::Status.as_str())
            .with(FIELD_NODE_ID, node_id)
            .with("status", status)
            .with("details", details.unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Alert raised for a node; severity defaults to `warning`.
    pub fn alert(node_id: &str, alert_type: &str, text: &str, severity: Option<&str>) -> Self {
        Self::new()
            .with(FIELD_TYPE, MessageKind::Alert.as_str())
            .with(FIELD_NODE_ID, node_id)
            .with("alert_type", alert_type)
            .with("message", text)
            .with("severity", severity.unwrap_or("warning"))
    }
}

impl From<Map<String, Value>> for ApplicationMessage {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(fields)
    }
}

impl TryFrom<Value> for ApplicationMessage {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
