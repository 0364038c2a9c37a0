//! # Radio Subsystem
//!
//! SX127x transceiver support: the register transport abstraction, the
//! register map, the interrupt flags and the LoRa driver itself.

pub mod hal;
pub mod irq;
pub mod registers;
pub mod sx1278;

pub use hal::{ControlLine, SimulatedTransport, TransmittedFrame, Transport, TransportError};
pub use irq::IrqFlags;
pub use sx1278::{
    DriverError, DriverState, DriverStats, RadioCounters, RadioMode, RawPacket, Sx1278Driver,
};

#[cfg(feature = "raspberry-pi")]
pub use hal::RaspberryPiTransport;
