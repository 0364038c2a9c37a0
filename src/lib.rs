//! # lora-gateway - LoRa to Message-Bus Gateway
//!
//! Drives a Semtech SX1276/77/78 (SX1278) LoRa transceiver at the register
//! level, listens continuously for inbound packets, decodes them into
//! structured messages enriched with link-quality telemetry and republishes
//! them on a topic-addressed message bus. Outbound messages travel the other
//! way over the same radio.
//!
//! ## Layers
//!
//! - [`radio::hal`]: the [`Transport`] trait for register access and control
//!   lines, with a simulated and a Raspberry Pi implementation
//! - [`radio::sx1278`]: the [`Sx1278Driver`] (configuration, send, receive,
//!   counters)
//! - [`listener`]: the [`PacketListener`] receive cycle and send path
//! - [`relay`]: the [`RelaySink`] publish contract and topic routing
//! - [`gateway`]: the [`Gateway`] shell that wires everything together
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lora_gateway::relay::LogSink;
//! use lora_gateway::{ApplicationMessage, Gateway, GatewayConfig, SimulatedTransport};
//!
//! # async fn demo() -> Result<(), lora_gateway::GatewayError> {
//! let config = GatewayConfig::for_environment("development");
//! let gateway = Gateway::start(config, SimulatedTransport::new(), LogSink).await?;
//!
//! let alert = ApplicationMessage::alert("n2", "battery", "low battery", None);
//! gateway.submit(alert).await;
//!
//! println!("{:?}", gateway.health().status);
//! gateway.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod logging;
pub mod message;
pub mod radio;
pub mod relay;
pub mod util;

pub use crate::config::{BusConfig, ConfigError, GatewayConfig, RadioConfig, RetryPolicy, TimingConfig};
pub use crate::error::GatewayError;
pub use crate::gateway::{Gateway, HealthReport, HealthStatus};
pub use crate::listener::{PacketListener, StatsSnapshot};
pub use crate::logging::{init_logger, log_info};
pub use crate::message::{ApplicationMessage, DecodeError, MessageKind};
pub use crate::radio::{
    DriverError, RadioMode, RawPacket, SimulatedTransport, Sx1278Driver, Transport, TransportError,
};
pub use crate::relay::{PublishError, RelaySink, TopicScheme};
