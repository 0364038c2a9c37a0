//! Gateway Constants
//!
//! Fixed limits and defaults shared by the radio driver, the packet listener
//! and the gateway shell.

use std::time::Duration;

/// Hardware FIFO limit of the SX127x; no frame may exceed it.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Crystal frequency used by the frequency synthesizer formula.
pub const FXOSC_HZ: u64 = 32_000_000;

/// Default label identifying this gateway instance.
pub const DEFAULT_GATEWAY_ID: &str = "raspi_gateway_01";

/// Default root of every published topic.
pub const DEFAULT_TOPIC_ROOT: &str = "gardenconnect";

/// Service name reported by the health surface.
pub const SERVICE_NAME: &str = "lora-gateway";

/// Crate version reported by the health surface.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fallback used when a message carries no node identifier.
pub const UNKNOWN_NODE_ID: &str = "unknown";

/// Reset pulse: time the reset line is held low, then the time allowed for
/// the chip to boot after release.
pub const RESET_PULSE: Duration = Duration::from_millis(10);

/// Settling delay after each register transfer on real hardware.
pub const REGISTER_SETTLE: Duration = Duration::from_millis(1);

/// Default bounded wait applied to a single receive poll.
pub const DEFAULT_RX_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Default hard ceiling on transmit completion.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep between polls of the TX-done line.
pub const DEFAULT_TX_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Sleep between receive-loop iterations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sleep after a failed receive-loop iteration.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Interval between gateway status publications.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(30);
