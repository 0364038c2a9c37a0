//! # Register Transport for Radio Hardware
//!
//! This module defines the [`Transport`] trait the SX127x driver is built on:
//! two-byte register transfers over a synchronous SPI bus plus the two
//! discrete control lines the driver needs (reset and the DIO0 packet-ready
//! signal).
//!
//! The transport is chosen once, when the driver is constructed:
//! [`SimulatedTransport`] runs entirely in memory, `RaspberryPiTransport`
//! (feature `raspberry-pi`) talks to `/dev/spidev*` and the BCM GPIO block.

use crate::config::BusConfig;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport is not open")]
    NotOpen,

    #[error("SPI transfer failed: {0}")]
    Spi(String),

    #[error("GPIO operation failed: {0}")]
    Gpio(String),

    #[error("Control line {0:?} is not available")]
    LineUnavailable(ControlLine),

    #[error("Invalid bus configuration: {0}")]
    InvalidConfig(String),
}

/// Discrete control lines between host and transceiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLine {
    /// NRESET, driven by the host, active low
    Reset,
    /// DIO0, driven by the radio: RxDone or TxDone depending on mapping
    PacketReady,
}

/// Byte-level access to the transceiver registers
///
/// Implementations perform exactly one SPI transaction per call. The driver
/// waits [`Transport::settle_delay`] after every register transfer.
pub trait Transport: Send {
    /// Acquire the bus and control lines.
    ///
    /// Opening an already open transport re-acquires its resources.
    fn open(&mut self, bus: &BusConfig) -> Result<(), TransportError>;

    /// Release the bus and control lines. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Write `value` to register `address` (address byte sent with MSB set).
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), TransportError>;

    /// Read register `address` (address byte sent with MSB cleared).
    fn read_register(&mut self, address: u8) -> Result<u8, TransportError>;

    /// Drive an output line high (`true`) or low (`false`).
    fn set_control_line(&mut self, line: ControlLine, high: bool) -> Result<(), TransportError>;

    /// Sample an input line.
    fn read_control_line(&mut self, line: ControlLine) -> Result<bool, TransportError>;

    /// Delay the driver observes after each register transfer.
    fn settle_delay(&self) -> Duration {
        crate::constants::REGISTER_SETTLE
    }
}

pub mod simulated;

// Platform implementations
#[cfg(feature = "raspberry-pi")]
pub mod raspberry_pi;

pub use simulated::{SimulatedTransport, TransmittedFrame};

#[cfg(feature = "raspberry-pi")]
pub use raspberry_pi::RaspberryPiTransport;
