//! # Packet Listener
//!
//! Owns the continuous receive cycle and the outbound send path.
//!
//! ```text
//! radio ──receive──▶ decode ──stamp──▶ route ──publish──▶ RelaySink
//! caller ──send_message──▶ stamp ──encode──▶ radio
//! ```
//!
//! The listener is shared as `Arc<PacketListener<_, _>>` between the receive
//! task, callers of [`PacketListener::send_message`] and reporting. The
//! driver sits behind an async mutex, so a send waits for the current
//! receive poll to finish and vice versa. Statistics are atomics and can be
//! read at any time without touching the driver.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::message::ApplicationMessage;
use crate::radio::{DriverError, DriverStats, RadioCounters, RawPacket, Sx1278Driver, Transport};
use crate::relay::{RelaySink, TopicScheme};
use crate::util::{hex_preview, LogThrottle};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};

/// Hex bytes shown when a payload fails to decode
const PREVIEW_BYTES: usize = 32;

/// Listener counters, updated lock-free
#[derive(Debug)]
pub struct ListenerStats {
    messages_received: AtomicU64,
    messages_sent: AtomicU64,
    errors: AtomicU64,
    /// Milliseconds since the Unix epoch, 0 until the first message
    last_message_ms: AtomicI64,
    start_time: DateTime<Utc>,
    started: Instant,
}

impl Default for ListenerStats {
    fn default() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            last_message_ms: AtomicI64::new(0),
            start_time: Utc::now(),
            started: Instant::now(),
        }
    }
}

impl ListenerStats {
    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_received(&self, at: DateTime<Utc>) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.last_message_ms
            .store(at.timestamp_millis(), Ordering::Relaxed);
    }

    fn record_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    fn last_message_time(&self) -> Option<DateTime<Utc>> {
        match self.last_message_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }
}

/// Copy of the listener statistics at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub messages_received: u64,
    pub messages_sent: u64,
    pub errors: u64,
    pub last_message_time: Option<DateTime<Utc>>,
    pub start_time: DateTime<Utc>,
    pub uptime_secs: f64,
    pub is_listening: bool,
    pub is_connected: bool,
    pub radio: DriverStats,
}

/// Clears the listening flag however the receive loop exits, abort included
struct ListeningGuard<'a>(&'a AtomicBool);

impl Drop for ListeningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Receive cycle and send path over one radio and one relay sink
pub struct PacketListener<T: Transport, S: RelaySink> {
    config: GatewayConfig,
    topics: TopicScheme,
    driver: Mutex<Sx1278Driver<T>>,
    radio_counters: Arc<RadioCounters>,
    radio_ready: AtomicBool,
    sink: S,
    stats: ListenerStats,
    listening: AtomicBool,
    wake: Notify,
    throttle: StdMutex<LogThrottle>,
}

impl<T: Transport, S: RelaySink> PacketListener<T, S> {
    pub fn new(config: GatewayConfig, transport: T, sink: S) -> Self {
        let driver = Sx1278Driver::new(transport, config.radio.clone())
            .with_tx_timing(config.timing.tx_timeout(), config.timing.tx_poll_interval());
        let radio_counters = driver.counters();
        let topics = TopicScheme::new(config.topic_root.clone(), config.gateway_id.clone());

        Self {
            config,
            topics,
            driver: Mutex::new(driver),
            radio_counters,
            radio_ready: AtomicBool::new(false),
            sink,
            stats: ListenerStats::default(),
            listening: AtomicBool::new(false),
            wake: Notify::new(),
            // 5 warnings per minute
            throttle: StdMutex::new(LogThrottle::new(60_000, 5)),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Bring up the radio. Failure is counted and reported as `false`.
    pub async fn initialize(&self) -> bool {
        let result = self.driver.lock().await.initialize().await;
        match result {
            Ok(()) => {
                self.radio_ready.store(true, Ordering::SeqCst);
                info!("Packet listener ready");
                true
            }
            Err(e) => {
                self.radio_ready.store(false, Ordering::SeqCst);
                self.stats.record_error();
                error!("Radio initialization failed: {e}");
                false
            }
        }
    }

    /// The radio was initialized and has not been released.
    pub fn is_connected(&self) -> bool {
        self.radio_ready.load(Ordering::SeqCst)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Run the receive cycle until [`stop_listening`](Self::stop_listening).
    ///
    /// Each iteration polls the radio once, then sleeps `poll_interval`. A
    /// failed iteration is counted and followed by `error_backoff` instead.
    /// Returns immediately when the radio is not connected.
    pub async fn start_listening(&self) {
        if !self.is_connected() {
            warn!("Radio not connected, not starting receive loop");
            return;
        }
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!("Receive loop already running");
            return;
        }

        let _listening = ListeningGuard(&self.listening);

        info!("Receive loop started");
        let poll_interval = self.config.timing.poll_interval();
        let error_backoff = self.config.timing.error_backoff();

        while self.is_listening() {
            match self.poll_once().await {
                Ok(_) => self.pause(poll_interval).await,
                Err(e) => {
                    self.stats.record_error();
                    self.warn_throttled(&format!("Receive iteration failed: {e}"));
                    self.pause(error_backoff).await;
                }
            }
        }
        info!("Receive loop stopped");
    }

    /// Ask the receive loop to exit after its current poll.
    pub fn stop_listening(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!("Stopping receive loop");
        }
        // Stores a permit if the loop is not parked yet
        self.wake.notify_one();
    }

    async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.wake.notified() => {}
        }
    }

    /// One receive iteration; `Ok(true)` when a message was dispatched.
    async fn poll_once(&self) -> Result<bool, GatewayError> {
        let packet = {
            let mut driver = self.driver.lock().await;
            if !driver.is_ready() {
                return Err(DriverError::NotReady.into());
            }
            driver.receive(self.config.timing.rx_poll_timeout()).await
        };

        let Some(packet) = packet else {
            return Ok(false);
        };
        let message = self.decode(&packet)?;
        self.dispatch(message).await;
        Ok(true)
    }

    fn decode(&self, packet: &RawPacket) -> Result<ApplicationMessage, GatewayError> {
        let mut message = ApplicationMessage::from_wire(packet.as_bytes()).map_err(|e| {
            debug!(
                "Undecodable payload: {}",
                hex_preview(packet.as_bytes(), PREVIEW_BYTES)
            );
            e
        })?;

        let received_at = Utc::now();
        message.stamp_reception(received_at, Some(packet.rssi_dbm), Some(packet.snr_db));
        self.stats.record_received(received_at);
        debug!(
            "Decoded {} message from node {}",
            message.kind(),
            message.node_id().unwrap_or("?")
        );
        Ok(message)
    }

    async fn dispatch(&self, message: ApplicationMessage) {
        let topic = self.topics.route(&message);
        match self.sink.publish(&topic, &message).await {
            Ok(()) => debug!("Published to {topic}"),
            Err(e) => {
                self.stats.record_error();
                self.warn_throttled(&format!("Publish to {topic} failed: {e}"));
            }
        }
    }

    fn warn_throttled(&self, line: &str) {
        let mut throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);
        if throttle.allow() {
            let suppressed = throttle.take_suppressed();
            if suppressed > 0 {
                warn!("{line} ({suppressed} similar messages suppressed)");
            } else {
                warn!("{line}");
            }
        }
    }

    /// Stamp, encode and transmit one message.
    pub async fn send_message(&self, message: ApplicationMessage) -> bool {
        if !self.is_connected() {
            warn!("Cannot send: radio not connected");
            return false;
        }

        let mut message = message;
        message.stamp_send(Utc::now(), &self.config.gateway_id);
        let bytes = match message.to_wire() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.stats.record_error();
                warn!("Outbound message rejected: {e}");
                return false;
            }
        };

        let sent = self.driver.lock().await.send(&bytes).await;
        if sent {
            self.stats.record_sent();
            debug!("Sent {} message ({} bytes)", message.kind(), bytes.len());
        } else {
            self.stats.record_error();
        }
        sent
    }

    pub fn get_stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages_received: self.stats.messages_received.load(Ordering::Relaxed),
            messages_sent: self.stats.messages_sent.load(Ordering::Relaxed),
            errors: self.stats.errors(),
            last_message_time: self.stats.last_message_time(),
            start_time: self.stats.start_time,
            uptime_secs: self.stats.started.elapsed().as_secs_f64(),
            is_listening: self.is_listening(),
            is_connected: self.is_connected(),
            radio: self.radio_counters.snapshot(),
        }
    }

    /// Stop the loop and release the radio. Safe to call repeatedly.
    pub async fn cleanup(&self) {
        self.stop_listening();
        self.radio_ready.store(false, Ordering::SeqCst);
        self.driver.lock().await.close();
    }
}
