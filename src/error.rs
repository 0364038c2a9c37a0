//! # Gateway Error Handling
//!
//! [`GatewayError`] gathers the errors of every layer so callers that cross
//! layers (the gateway shell, the binary) can use a single `Result` type.
//! Each layer keeps its own error enum for local handling.

use crate::config::ConfigError;
use crate::message::DecodeError;
use crate::radio::{DriverError, TransportError};
use crate::relay::PublishError;
use thiserror::Error;

/// Errors that can occur anywhere in the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bus or control-line I/O failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The radio driver reported a failure.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A radio payload could not be decoded or encoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The relay sink refused a publication.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The configuration is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Radio initialization gave up after the configured number of attempts.
    #[error("Radio initialization failed after {attempts} attempt(s)")]
    StartupFailed { attempts: u32 },
}
