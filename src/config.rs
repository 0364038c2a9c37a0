//! # Gateway Configuration
//!
//! Immutable configuration values consumed at construction time by the radio
//! driver, the packet listener and the gateway shell.
//!
//! The configuration can be loaded from JSON. Every field has a default, so a
//! partial document only overrides what it names:
//! ```json
//! {
//!   "gateway_id": "garden_gw",
//!   "radio": { "frequency_hz": 433000000, "spreading_factor": 9 },
//!   "timing": { "tx_timeout_ms": 3000 }
//! }
//! ```

use crate::constants::*;
use crate::radio::registers::bandwidth_index;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// SPI bus addressing and GPIO pin assignment (BCM numbering)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// SPI controller (0 = SPI0, 1 = SPI1)
    pub spi_bus: u8,
    /// Chip select on that controller
    pub spi_device: u8,
    /// SPI clock in Hz
    pub spi_speed_hz: u32,
    /// Reset line (output, active low)
    pub reset_pin: u8,
    /// DIO0: RxDone / TxDone packet-ready signal (input)
    pub dio0_pin: u8,
    /// DIO1: reserved for RxTimeout (input)
    pub dio1_pin: u8,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            spi_device: 0,
            spi_speed_hz: 500_000,
            reset_pin: 22,
            dio0_pin: 18,
            dio1_pin: 23,
        }
    }
}

/// Radio parameters for the SX127x LoRa modem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Bus and pin assignment
    pub bus: BusConfig,
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
    /// Spreading factor (6-12)
    pub spreading_factor: u8,
    /// Signal bandwidth in Hz
    pub bandwidth_hz: u32,
    /// Coding rate denominator: 5 means 4/5, 8 means 4/8
    pub coding_rate: u8,
    /// Preamble length in symbols
    pub preamble_length: u16,
    /// Sync word (0x12 private, 0x34 LoRaWAN)
    pub sync_word: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            frequency_hz: 868_000_000,
            tx_power_dbm: 14,
            spreading_factor: 7,
            bandwidth_hz: 125_000,
            coding_rate: 5,
            preamble_length: 8,
            sync_word: 0x12,
        }
    }
}

impl RadioConfig {
    /// Check every parameter against what the SX127x can be programmed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(137_000_000..=1_020_000_000).contains(&self.frequency_hz) {
            return Err(ConfigError::invalid(
                "frequency_hz",
                format!("{} Hz outside 137-1020 MHz", self.frequency_hz),
            ));
        }
        if !(6..=12).contains(&self.spreading_factor) {
            return Err(ConfigError::invalid(
                "spreading_factor",
                format!("SF{} outside SF6-SF12", self.spreading_factor),
            ));
        }
        if bandwidth_index(self.bandwidth_hz).is_none() {
            return Err(ConfigError::invalid(
                "bandwidth_hz",
                format!("{} Hz is not a supported LoRa bandwidth", self.bandwidth_hz),
            ));
        }
        if !(5..=8).contains(&self.coding_rate) {
            return Err(ConfigError::invalid(
                "coding_rate",
                format!("4/{} outside 4/5-4/8", self.coding_rate),
            ));
        }
        // PA_BOOST without the +20 dBm high-power mode tops out at 17 dBm
        if !(2..=17).contains(&self.tx_power_dbm) {
            return Err(ConfigError::invalid(
                "tx_power_dbm",
                format!("{} dBm outside 2-17 dBm", self.tx_power_dbm),
            ));
        }
        if self.preamble_length < 6 {
            return Err(ConfigError::invalid(
                "preamble_length",
                format!("{} symbols, minimum is 6", self.preamble_length),
            ));
        }
        Ok(())
    }

    /// Duration of one LoRa symbol: 2^SF / BW.
    pub fn symbol_duration(&self) -> Duration {
        let bw = self.bandwidth_hz.max(1) as u64;
        Duration::from_micros((1u64 << self.spreading_factor) * 1_000_000 / bw)
    }

    /// Whether low-data-rate optimisation must be enabled (symbol > 16 ms).
    pub fn low_data_rate_optimize(&self) -> bool {
        self.symbol_duration() > Duration::from_millis(16)
    }
}

/// Receive-loop and transmit timing, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound on reading one received packet out of the FIFO
    pub rx_poll_timeout_ms: u64,
    /// Hard ceiling on transmit completion
    pub tx_timeout_ms: u64,
    /// Sleep between TX-done line polls
    pub tx_poll_interval_ms: u64,
    /// Sleep between receive-loop iterations
    pub poll_interval_ms: u64,
    /// Sleep after a failed receive-loop iteration
    pub error_backoff_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            rx_poll_timeout_ms: DEFAULT_RX_POLL_TIMEOUT.as_millis() as u64,
            tx_timeout_ms: DEFAULT_TX_TIMEOUT.as_millis() as u64,
            tx_poll_interval_ms: DEFAULT_TX_POLL_INTERVAL.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            error_backoff_ms: DEFAULT_ERROR_BACKOFF.as_millis() as u64,
        }
    }
}

impl TimingConfig {
    pub fn rx_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.rx_poll_timeout_ms)
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_millis(self.tx_timeout_ms)
    }

    pub fn tx_poll_interval(&self) -> Duration {
        Duration::from_millis(self.tx_poll_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    /// Timeouts and the TX-done poll must be non-zero; loop sleeps may be.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rx_poll_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "timing.rx_poll_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.tx_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "timing.tx_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.tx_poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "timing.tx_poll_interval_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Bounded retry with exponential backoff for radio initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.initial_backoff_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay.min(self.max_backoff_ms))
    }
}

/// Complete gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Label stamped on outbound messages and used in the gateway status topic
    pub gateway_id: String,
    /// Root segment of every published topic
    pub topic_root: String,
    /// Transceiver parameters
    pub radio: RadioConfig,
    /// Loop and transmit timing
    pub timing: TimingConfig,
    /// Radio initialization retry policy
    pub init_retry: RetryPolicy,
    /// Seconds between gateway status publications (0 disables them)
    pub status_interval_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_id: DEFAULT_GATEWAY_ID.to_string(),
            topic_root: DEFAULT_TOPIC_ROOT.to_string(),
            radio: RadioConfig::default(),
            timing: TimingConfig::default(),
            init_retry: RetryPolicy::default(),
            status_interval_secs: DEFAULT_STATUS_INTERVAL.as_secs(),
        }
    }
}

impl GatewayConfig {
    /// Predefined configuration for a named environment.
    ///
    /// `development` and `test` run on 433 MHz at reduced power; `production`
    /// uses the EU 868 MHz band. Unknown names fall back to the defaults.
    pub fn for_environment(name: &str) -> Self {
        let mut config = Self::default();
        match name {
            "development" => {
                config.radio.frequency_hz = 433_000_000;
                config.radio.tx_power_dbm = 10;
            }
            "production" => {
                config.radio.frequency_hz = 868_000_000;
                config.radio.tx_power_dbm = 14;
            }
            "test" => {
                config.radio.frequency_hz = 433_000_000;
                config.radio.tx_power_dbm = 5;
                config.timing.rx_poll_timeout_ms = 100;
            }
            other => {
                log::warn!("Unknown environment '{other}', using default configuration");
            }
        }
        config
    }

    /// Parse a (possibly partial) JSON document over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway_id.trim().is_empty() {
            return Err(ConfigError::invalid("gateway_id", "must not be empty"));
        }
        if self.topic_root.trim().is_empty() {
            return Err(ConfigError::invalid("topic_root", "must not be empty"));
        }
        if self.init_retry.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "init_retry.max_attempts",
                "at least one attempt is required",
            ));
        }
        self.timing.validate()?;
        self.radio.validate()
    }

    /// Interval between gateway status publications, if enabled.
    pub fn status_interval(&self) -> Option<Duration> {
        (self.status_interval_secs > 0).then(|| Duration::from_secs(self.status_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_radio_config_is_valid() {
        let config = RadioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frequency_hz, 868_000_000);
        assert_eq!(config.sync_word, 0x12);
    }

    #[test]
    fn test_rejects_out_of_range_parameters() {
        let mut config = RadioConfig::default();
        config.spreading_factor = 13;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "spreading_factor", .. })
        ));

        let mut config = RadioConfig::default();
        config.bandwidth_hz = 100_000;
        assert!(config.validate().is_err());

        let mut config = RadioConfig::default();
        config.coding_rate = 4;
        assert!(config.validate().is_err());

        let mut config = RadioConfig::default();
        config.frequency_hz = 2_400_000_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_power_limited_to_pa_boost_range() {
        let mut config = RadioConfig::default();
        config.tx_power_dbm = 17;
        assert!(config.validate().is_ok());
        config.tx_power_dbm = 18;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "tx_power_dbm", .. })
        ));
        config.tx_power_dbm = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = GatewayConfig::default();
        config.timing.rx_poll_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "timing.rx_poll_timeout_ms", .. })
        ));

        let mut config = GatewayConfig::default();
        config.timing.tx_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "timing.tx_timeout_ms", .. })
        ));

        let mut config = GatewayConfig::default();
        config.timing.tx_poll_interval_ms = 0;
        assert!(config.validate().is_err());

        // Zero loop sleeps are allowed
        let mut config = GatewayConfig::default();
        config.timing.poll_interval_ms = 0;
        config.timing.error_backoff_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_low_data_rate_optimize_threshold() {
        let mut config = RadioConfig::default();
        assert!(!config.low_data_rate_optimize());

        // SF12 at 125 kHz: 32.768 ms per symbol
        config.spreading_factor = 12;
        assert!(config.low_data_rate_optimize());

        // SF11 at 250 kHz: 8.192 ms per symbol
        config.spreading_factor = 11;
        config.bandwidth_hz = 250_000;
        assert!(!config.low_data_rate_optimize());
    }

    #[test]
    fn test_retry_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_for(10), Duration::from_millis(5_000));
    }

    #[test]
    fn test_environment_presets() {
        assert_eq!(
            GatewayConfig::for_environment("development").radio.frequency_hz,
            433_000_000
        );
        assert_eq!(GatewayConfig::for_environment("test").radio.tx_power_dbm, 5);
        assert_eq!(
            GatewayConfig::for_environment("staging"),
            GatewayConfig::default()
        );
    }

    #[test]
    fn test_status_interval_disabled_at_zero() {
        let mut config = GatewayConfig::default();
        assert_eq!(config.status_interval(), Some(Duration::from_secs(30)));
        config.status_interval_secs = 0;
        assert_eq!(config.status_interval(), None);
    }
}
