//! # SX1278 LoRa Driver
//!
//! Register-level driver for the Semtech SX1276/77/78 family in LoRa mode,
//! built on any [`Transport`].
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──initialize──▶ Receive ⇄ Transmit
//!                                   │
//!                                 close
//!                                   ▼
//!                                 Closed
//! ```
//!
//! [`Sx1278Driver::initialize`] opens the transport, pulses the reset line
//! and writes the configuration sequence, leaving the radio in continuous
//! receive with DIO0 mapped to RxDone. [`Sx1278Driver::send`] switches to
//! transmit and back; [`Sx1278Driver::receive`] is a non-blocking poll of
//! DIO0.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lora_gateway::config::RadioConfig;
//! use lora_gateway::radio::{SimulatedTransport, Sx1278Driver};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), lora_gateway::radio::DriverError> {
//! let mut driver = Sx1278Driver::new(SimulatedTransport::new(), RadioConfig::default());
//! driver.initialize().await?;
//!
//! driver.send(br#"{"type":"status"}"#).await;
//! if let Some(packet) = driver.receive(Duration::from_secs(1)).await {
//!     println!("{} bytes at {} dBm", packet.len(), packet.rssi_dbm);
//! }
//! driver.close();
//! # Ok(())
//! # }
//! ```

use super::hal::{ControlLine, Transport, TransportError};
use super::irq::IrqFlags;
use super::registers::*;
use crate::config::RadioConfig;
use crate::constants::{DEFAULT_TX_POLL_INTERVAL, DEFAULT_TX_TIMEOUT, MAX_PAYLOAD_LEN, RESET_PULSE};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

/// Driver errors
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid radio configuration: {0}")]
    InvalidConfig(String),

    #[error("Radio is not ready")]
    NotReady,

    #[error("Payload of {0} bytes exceeds the 255-byte FIFO")]
    PayloadTooLarge(usize),

    #[error("Transmission did not complete within {0:?}")]
    TxTimeout(Duration),

    #[error("Radio initialization failed: {0}")]
    Initialization(String),
}

/// Operating modes tracked by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioMode {
    Uninitialized,
    Sleep,
    Standby,
    Receive,
    Transmit,
    Closed,
}

impl RadioMode {
    fn opmode_bits(self) -> Option<u8> {
        match self {
            RadioMode::Sleep => Some(MODE_SLEEP),
            RadioMode::Standby => Some(MODE_STANDBY),
            RadioMode::Transmit => Some(MODE_TX),
            RadioMode::Receive => Some(MODE_RX_CONTINUOUS),
            RadioMode::Uninitialized | RadioMode::Closed => None,
        }
    }
}

/// Cumulative radio counters
///
/// Shared through an `Arc` so readers never need access to the driver
/// itself. Every counter only ever increases.
#[derive(Debug, Default)]
pub struct RadioCounters {
    packets_sent: AtomicU64,
    packets_received: AtomicU64,
    crc_errors: AtomicU64,
    timeouts: AtomicU64,
}

impl RadioCounters {
    pub fn snapshot(&self) -> DriverStats {
        DriverStats {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            crc_errors: self.crc_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`RadioCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub crc_errors: u64,
    pub timeouts: u64,
}

/// Mutable driver state: mode and last link-quality readings
#[derive(Debug, Clone, Copy)]
pub struct DriverState {
    pub mode: RadioMode,
    pub last_rssi_dbm: Option<i16>,
    pub last_snr_db: Option<f32>,
}

impl Default for DriverState {
    fn default() -> Self {
        Self {
            mode: RadioMode::Uninitialized,
            last_rssi_dbm: None,
            last_snr_db: None,
        }
    }
}

/// A packet read out of the FIFO
#[derive(Debug, Clone, PartialEq)]
pub struct RawPacket {
    /// Payload bytes, at most 255
    pub data: Vec<u8>,
    /// Packet RSSI in dBm
    pub rssi_dbm: i16,
    /// Packet SNR in dB
    pub snr_db: f32,
}

impl RawPacket {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// RSSI in dBm from `RegPktRssiValue`.
pub fn rssi_from_raw(raw: u8) -> i16 {
    raw as i16 - RSSI_OFFSET_DBM
}

/// SNR in dB from `RegPktSnrValue` (two's complement, quarter-dB steps).
pub fn snr_from_raw(raw: u8) -> f32 {
    (raw as i8) as f32 / 4.0
}

/// SX1278 driver over a register transport
pub struct Sx1278Driver<T: Transport> {
    transport: T,
    config: RadioConfig,
    state: DriverState,
    counters: Arc<RadioCounters>,
    tx_timeout: Duration,
    tx_poll_interval: Duration,
}

impl<T: Transport> Sx1278Driver<T> {
    /// Create a driver; nothing touches the hardware until `initialize`.
    pub fn new(transport: T, config: RadioConfig) -> Self {
        Self {
            transport,
            config,
            state: DriverState::default(),
            counters: Arc::new(RadioCounters::default()),
            tx_timeout: DEFAULT_TX_TIMEOUT,
            tx_poll_interval: DEFAULT_TX_POLL_INTERVAL,
        }
    }

    /// Override the transmit-completion ceiling and poll cadence.
    pub fn with_tx_timing(mut self, tx_timeout: Duration, tx_poll_interval: Duration) -> Self {
        self.tx_timeout = tx_timeout;
        self.tx_poll_interval = tx_poll_interval;
        self
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn mode(&self) -> RadioMode {
        self.state.mode
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Shared handle to the cumulative counters.
    pub fn counters(&self) -> Arc<RadioCounters> {
        Arc::clone(&self.counters)
    }

    pub fn stats(&self) -> DriverStats {
        self.counters.snapshot()
    }

    /// RSSI of the last successfully received packet.
    pub fn signal_strength(&self) -> Option<i16> {
        self.state.last_rssi_dbm
    }

    /// SNR of the last successfully received packet.
    pub fn signal_to_noise(&self) -> Option<f32> {
        self.state.last_snr_db
    }

    /// True after a successful `initialize` and before `close`.
    pub fn is_ready(&self) -> bool {
        !matches!(self.state.mode, RadioMode::Uninitialized | RadioMode::Closed)
            && self.transport.is_open()
    }

    /// Open the transport, reset the chip and program the configuration.
    ///
    /// On failure the transport is released again and the driver stays
    /// uninitialized, so the call can be retried.
    pub async fn initialize(&mut self) -> Result<(), DriverError> {
        self.config
            .validate()
            .map_err(|e| DriverError::InvalidConfig(e.to_string()))?;

        info!(
            "Initializing SX1278: {} Hz, SF{}, {} Hz BW, CR 4/{}, {} dBm",
            self.config.frequency_hz,
            self.config.spreading_factor,
            self.config.bandwidth_hz,
            self.config.coding_rate,
            self.config.tx_power_dbm
        );

        if let Err(e) = self.bring_up().await {
            self.transport.close();
            self.state.mode = RadioMode::Uninitialized;
            return Err(DriverError::Initialization(e.to_string()));
        }

        info!("SX1278 initialized, listening in continuous receive mode");
        Ok(())
    }

    async fn bring_up(&mut self) -> Result<(), DriverError> {
        self.transport.open(&self.config.bus)?;
        self.reset().await?;

        let version = self.read_register(REG_VERSION).await?;
        debug!("SX1278 silicon revision 0x{version:02X}");

        self.configure().await?;
        self.enter_receive().await
    }

    async fn reset(&mut self) -> Result<(), DriverError> {
        debug!("Pulsing reset line");
        self.transport.set_control_line(ControlLine::Reset, false)?;
        sleep(RESET_PULSE).await;
        self.transport.set_control_line(ControlLine::Reset, true)?;
        sleep(RESET_PULSE).await;
        Ok(())
    }

    async fn configure(&mut self) -> Result<(), DriverError> {
        // LongRangeMode can only be changed in sleep
        self.write_register(REG_OPMODE, MODE_SLEEP).await?;
        self.set_mode(RadioMode::Sleep).await?;

        let frf = frf_from_frequency(self.config.frequency_hz);
        debug!("Carrier {} Hz -> frf 0x{frf:06X}", self.config.frequency_hz);
        self.write_register(REG_FRF_MSB, (frf >> 16) as u8).await?;
        self.write_register(REG_FRF_MID, (frf >> 8) as u8).await?;
        self.write_register(REG_FRF_LSB, frf as u8).await?;

        let power = self.config.tx_power_dbm.clamp(2, 17) as u8;
        self.write_register(REG_PA_CONFIG, PA_BOOST | PA_MAX_POWER | (power - 2))
            .await?;

        let bw = bandwidth_index(self.config.bandwidth_hz).ok_or_else(|| {
            DriverError::InvalidConfig(format!("bandwidth {} Hz", self.config.bandwidth_hz))
        })?;
        let modem_config_1 = (bw << 4) | ((self.config.coding_rate - 4) << 1);
        self.write_register(REG_MODEM_CONFIG_1, modem_config_1).await?;

        let mut modem_config_3 = AGC_AUTO_ON;
        if self.config.low_data_rate_optimize() {
            modem_config_3 |= LOW_DATA_RATE_OPTIMIZE;
        }
        self.write_register(REG_MODEM_CONFIG_3, modem_config_3).await?;

        let modem_config_2 = (self.config.spreading_factor << 4) | RX_PAYLOAD_CRC_ON;
        self.write_register(REG_MODEM_CONFIG_2, modem_config_2).await?;

        let [preamble_msb, preamble_lsb] = self.config.preamble_length.to_be_bytes();
        self.write_register(REG_PREAMBLE_MSB, preamble_msb).await?;
        self.write_register(REG_PREAMBLE_LSB, preamble_lsb).await?;

        self.write_register(REG_SYNC_WORD, self.config.sync_word).await?;

        // Disjoint halves so staging a send never clobbers an unread packet
        self.write_register(REG_FIFO_TX_BASE_ADDR, FIFO_TX_BASE).await?;
        self.write_register(REG_FIFO_RX_BASE_ADDR, FIFO_RX_BASE).await?;

        self.set_mode(RadioMode::Standby).await
    }

    async fn enter_receive(&mut self) -> Result<(), DriverError> {
        self.write_register(REG_DIO_MAPPING_1, DIO0_RX_DONE).await?;
        self.set_mode(RadioMode::Receive).await
    }

    async fn set_mode(&mut self, mode: RadioMode) -> Result<(), DriverError> {
        let Some(bits) = mode.opmode_bits() else {
            return Err(DriverError::InvalidConfig(format!("{mode:?} is not a chip mode")));
        };
        self.write_register(REG_OPMODE, MODE_LONG_RANGE | bits).await?;
        debug!("Mode {:?} -> {:?}", self.state.mode, mode);
        self.state.mode = mode;
        Ok(())
    }

    async fn write_register(&mut self, address: u8, value: u8) -> Result<(), DriverError> {
        self.transport.write_register(address, value)?;
        settle(self.transport.settle_delay()).await;
        Ok(())
    }

    async fn read_register(&mut self, address: u8) -> Result<u8, DriverError> {
        let value = self.transport.read_register(address)?;
        settle(self.transport.settle_delay()).await;
        Ok(value)
    }

    /// Transmit one packet; `false` on any failure.
    ///
    /// Payloads over 255 bytes are refused before anything is written.
    pub async fn send(&mut self, payload: &[u8]) -> bool {
        match self.try_send(payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Send failed: {e}");
                false
            }
        }
    }

    /// Transmit one packet, reporting why it failed.
    pub async fn try_send(&mut self, payload: &[u8]) -> Result<(), DriverError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(DriverError::PayloadTooLarge(payload.len()));
        }
        if !self.is_ready() {
            return Err(DriverError::NotReady);
        }

        match self.transmit(payload).await {
            Ok(()) => {
                RadioCounters::bump(&self.counters.packets_sent);
                debug!("Sent {} bytes", payload.len());
                Ok(())
            }
            Err(e) => {
                if matches!(e, DriverError::TxTimeout(_)) {
                    RadioCounters::bump(&self.counters.timeouts);
                }
                // Try to get back to listening even though this send failed
                if let Err(restore) = self.enter_receive().await {
                    warn!("Could not return to receive mode: {restore}");
                }
                Err(e)
            }
        }
    }

    async fn transmit(&mut self, payload: &[u8]) -> Result<(), DriverError> {
        self.set_mode(RadioMode::Standby).await?;
        self.write_register(REG_FIFO_TX_BASE_ADDR, FIFO_TX_BASE).await?;
        self.write_register(REG_FIFO_ADDR_PTR, FIFO_TX_BASE).await?;
        self.write_register(REG_PAYLOAD_LENGTH, payload.len() as u8)
            .await?;
        for &byte in payload {
            self.write_register(REG_FIFO, byte).await?;
        }

        self.write_register(REG_DIO_MAPPING_1, DIO0_TX_DONE).await?;
        self.set_mode(RadioMode::Transmit).await?;

        let deadline = Instant::now() + self.tx_timeout;
        while !self.transport.read_control_line(ControlLine::PacketReady)? {
            if Instant::now() >= deadline {
                return Err(DriverError::TxTimeout(self.tx_timeout));
            }
            sleep(self.tx_poll_interval).await;
        }

        // Only TxDone: a packet that arrived meanwhile must stay flagged
        self.write_register(REG_IRQ_FLAGS, IrqFlags::TX_DONE.bits())
            .await?;
        self.enter_receive().await
    }

    /// Poll for a received packet.
    ///
    /// Returns `None` at once when DIO0 is low. Otherwise the packet is read
    /// out of the FIFO, bounded by `poll_timeout`. CRC failures, transport
    /// errors and empty packets also yield `None`.
    pub async fn receive(&mut self, poll_timeout: Duration) -> Option<RawPacket> {
        if !self.is_ready() {
            return None;
        }

        match tokio::time::timeout(poll_timeout, self.read_packet()).await {
            Ok(Ok(packet)) => packet,
            Ok(Err(e)) => {
                warn!("Receive failed: {e}");
                None
            }
            Err(_) => {
                warn!("Reading packet took longer than {poll_timeout:?}");
                None
            }
        }
    }

    async fn read_packet(&mut self) -> Result<Option<RawPacket>, DriverError> {
        if !self.transport.read_control_line(ControlLine::PacketReady)? {
            return Ok(None);
        }

        let flags = IrqFlags::from_bits_retain(self.read_register(REG_IRQ_FLAGS).await?);
        if !flags.rx_done() {
            return Ok(None);
        }

        if flags.crc_error() {
            RadioCounters::bump(&self.counters.crc_errors);
            self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL).await?;
            warn!("Dropped packet with CRC error");
            return Ok(None);
        }

        let current_addr = self.read_register(REG_FIFO_RX_CURRENT_ADDR).await?;
        let len = self.read_register(REG_RX_NB_BYTES).await? as usize;
        if len == 0 {
            self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL).await?;
            debug!("Ignoring zero-length packet");
            return Ok(None);
        }

        self.write_register(REG_FIFO_ADDR_PTR, current_addr).await?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(self.read_register(REG_FIFO).await?);
        }

        let rssi_dbm = rssi_from_raw(self.read_register(REG_PKT_RSSI_VALUE).await?);
        let snr_db = snr_from_raw(self.read_register(REG_PKT_SNR_VALUE).await?);
        self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL).await?;

        self.state.last_rssi_dbm = Some(rssi_dbm);
        self.state.last_snr_db = Some(snr_db);
        RadioCounters::bump(&self.counters.packets_received);
        debug!("Received {len} bytes, RSSI {rssi_dbm} dBm, SNR {snr_db:.2} dB");

        Ok(Some(RawPacket {
            data,
            rssi_dbm,
            snr_db,
        }))
    }

    /// Put the radio to sleep and release the transport. Idempotent.
    pub fn close(&mut self) {
        if self.state.mode == RadioMode::Closed {
            return;
        }
        if self.transport.is_open() {
            if let Err(e) = self
                .transport
                .write_register(REG_OPMODE, MODE_LONG_RANGE | MODE_SLEEP)
            {
                debug!("Could not put radio to sleep on close: {e}");
            }
            self.transport.close();
        }
        self.state.mode = RadioMode::Closed;
        info!("SX1278 driver closed");
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

impl<T: Transport> Drop for Sx1278Driver<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::hal::SimulatedTransport;

    fn config_433() -> RadioConfig {
        RadioConfig {
            frequency_hz: 433_000_000,
            ..RadioConfig::default()
        }
    }

    fn written(log: &[(u8, u8)], address: u8) -> Vec<u8> {
        log.iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, v)| *v)
            .collect()
    }

    #[test]
    fn test_link_quality_conversion() {
        assert_eq!(rssi_from_raw(100), -64);
        assert_eq!(rssi_from_raw(0), -164);
        assert_eq!(snr_from_raw(40), 10.0);
        // 0xF8 is -8 quarter-dB steps
        assert_eq!(snr_from_raw(0xF8), -2.0);
    }

    #[tokio::test]
    async fn test_configuration_sequence() {
        let sim = SimulatedTransport::new();
        let mut driver = Sx1278Driver::new(sim.clone(), config_433());
        driver.initialize().await.unwrap();

        let log = sim.write_log();
        assert_eq!(written(&log, REG_FRF_MSB), vec![0x6C]);
        assert_eq!(written(&log, REG_FRF_MID), vec![0x40]);
        assert_eq!(written(&log, REG_FRF_LSB), vec![0x00]);
        assert_eq!(written(&log, REG_PA_CONFIG), vec![0xFC]);
        assert_eq!(written(&log, REG_MODEM_CONFIG_1), vec![0x72]);
        assert_eq!(written(&log, REG_MODEM_CONFIG_2), vec![0x74]);
        assert_eq!(written(&log, REG_MODEM_CONFIG_3), vec![0x04]);
        assert_eq!(written(&log, REG_PREAMBLE_MSB), vec![0x00]);
        assert_eq!(written(&log, REG_PREAMBLE_LSB), vec![0x08]);
        assert_eq!(written(&log, REG_SYNC_WORD), vec![0x12]);
        assert_eq!(written(&log, REG_FIFO_TX_BASE_ADDR), vec![0x80]);
        assert_eq!(written(&log, REG_FIFO_RX_BASE_ADDR), vec![0x00]);

        let opmodes = written(&log, REG_OPMODE);
        assert_eq!(opmodes.first(), Some(&MODE_SLEEP));
        assert_eq!(opmodes.get(1), Some(&(MODE_LONG_RANGE | MODE_SLEEP)));
        assert_eq!(opmodes.last(), Some(&(MODE_LONG_RANGE | MODE_RX_CONTINUOUS)));

        assert_eq!(sim.reset_pulses(), 1);
        assert_eq!(driver.mode(), RadioMode::Receive);
        assert!(driver.is_ready());
    }

    #[tokio::test]
    async fn test_send_stages_payload_in_tx_half() {
        let sim = SimulatedTransport::new();
        let mut driver = Sx1278Driver::new(sim.clone(), RadioConfig::default());
        driver.initialize().await.unwrap();
        sim.clear_write_log();

        assert!(driver.send(b"ab").await);
        let log = sim.write_log();
        assert_eq!(written(&log, REG_FIFO_ADDR_PTR), vec![FIFO_TX_BASE]);
        assert_eq!(sim.transmitted()[0].payload, b"ab");
    }

    #[test]
    fn test_driver_futures_are_send() {
        fn assert_send<F: std::future::Future + Send>(_: F) {}

        let mut driver = Sx1278Driver::new(SimulatedTransport::new(), RadioConfig::default());
        assert_send(driver.initialize());
        assert_send(driver.receive(Duration::from_millis(1)));
        assert_send(driver.send(b"x"));
    }

    #[tokio::test]
    async fn test_low_data_rate_bit_at_sf12() {
        let sim = SimulatedTransport::new();
        let config = RadioConfig {
            spreading_factor: 12,
            ..config_433()
        };
        let mut driver = Sx1278Driver::new(sim.clone(), config);
        driver.initialize().await.unwrap();

        assert_eq!(sim.register(REG_MODEM_CONFIG_3), AGC_AUTO_ON | LOW_DATA_RATE_OPTIMIZE);
        assert_eq!(sim.register(REG_MODEM_CONFIG_2), 0xC4);
    }

    #[tokio::test]
    async fn test_initialize_failure_releases_transport() {
        let sim = SimulatedTransport::new();
        sim.fail_transfers(true);
        let mut driver = Sx1278Driver::new(sim.clone(), RadioConfig::default());

        let err = driver.initialize().await.unwrap_err();
        assert!(matches!(err, DriverError::Initialization(_)));
        assert!(!driver.is_ready());
        assert!(!sim.is_open());
        assert_eq!(driver.mode(), RadioMode::Uninitialized);

        // Retry succeeds once the bus recovers
        sim.fail_transfers(false);
        driver.initialize().await.unwrap();
        assert!(driver.is_ready());
        assert_eq!(sim.open_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_config_never_opens_transport() {
        let sim = SimulatedTransport::new();
        let config = RadioConfig {
            spreading_factor: 4,
            ..RadioConfig::default()
        };
        let mut driver = Sx1278Driver::new(sim.clone(), config);
        assert!(matches!(
            driver.initialize().await,
            Err(DriverError::InvalidConfig(_))
        ));
        assert_eq!(sim.open_count(), 0);
    }

    #[tokio::test]
    async fn test_tx_timeout_counts_and_returns_to_receive() {
        let sim = SimulatedTransport::new();
        sim.set_auto_tx_done(false);
        let mut driver = Sx1278Driver::new(sim.clone(), RadioConfig::default())
            .with_tx_timing(Duration::from_millis(30), Duration::from_millis(5));
        driver.initialize().await.unwrap();

        assert!(!driver.send(b"hello").await);
        let stats = driver.stats();
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.packets_sent, 0);
        assert_eq!(driver.mode(), RadioMode::Receive);
        assert!(sim.transmitted().is_empty());
    }

    #[tokio::test]
    async fn test_zero_length_packet_is_ignored() {
        let sim = SimulatedTransport::new();
        let mut driver = Sx1278Driver::new(sim.clone(), RadioConfig::default());
        driver.initialize().await.unwrap();

        sim.inject_frame(&[]);
        assert!(driver.receive(Duration::from_secs(1)).await.is_none());
        assert_eq!(driver.stats().packets_received, 0);
        assert_eq!(sim.pending_frames(), 0);
        assert_eq!(driver.signal_strength(), None);
    }

    #[tokio::test]
    async fn test_receive_before_initialize() {
        let sim = SimulatedTransport::new();
        sim.inject_frame(b"early");
        let mut driver = Sx1278Driver::new(sim, RadioConfig::default());
        assert!(driver.receive(Duration::from_millis(10)).await.is_none());
        assert!(!driver.send(b"x").await);
    }
}
