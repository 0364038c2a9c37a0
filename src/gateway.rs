//! # Gateway Process Shell
//!
//! Wires a transport, the packet listener and a relay sink together and owns
//! their lifetime:
//!
//! 1. [`Gateway::start`] validates the configuration, initializes the radio
//!    with bounded retry and spawns the receive task (plus the periodic
//!    gateway status task when enabled).
//! 2. [`Gateway::submit`], [`Gateway::health`] and [`Gateway::stats`] form
//!    the control surface.
//! 3. [`Gateway::shutdown`] stops the loop, waits for the task and releases
//!    the radio.

use crate::config::GatewayConfig;
use crate::constants::{SERVICE_NAME, SERVICE_VERSION};
use crate::error::GatewayError;
use crate::listener::{PacketListener, StatsSnapshot};
use crate::message::{ApplicationMessage, FIELD_GATEWAY_ID, FIELD_TYPE};
use crate::radio::Transport;
use crate::relay::{PublishError, RelaySink};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant};

/// Message type of the periodic gateway status publication
pub const GATEWAY_STATUS_TYPE: &str = "gateway_status";

/// Overall health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Radio or bus connectivity is down
    Degraded,
}

/// Health snapshot for the control surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub radio_connected: bool,
    pub bus_connected: bool,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub service_name: String,
}

/// A running gateway
pub struct Gateway<T, S>
where
    T: Transport + 'static,
    S: RelaySink + 'static,
{
    listener: Arc<PacketListener<T, S>>,
    receive_task: Option<JoinHandle<()>>,
    status_task: Option<JoinHandle<()>>,
}

impl<T, S> Gateway<T, S>
where
    T: Transport + 'static,
    S: RelaySink + 'static,
{
    /// Bring the radio up and start listening.
    ///
    /// Initialization is attempted up to `init_retry.max_attempts` times with
    /// exponential backoff. If every attempt fails the radio is released and
    /// [`GatewayError::StartupFailed`] is returned.
    pub async fn start(config: GatewayConfig, transport: T, sink: S) -> Result<Self, GatewayError> {
        config.validate()?;
        let policy = config.init_retry.clone();
        let status_interval = config.status_interval();

        info!(
            "Starting {SERVICE_NAME} {SERVICE_VERSION} as '{}'",
            config.gateway_id
        );
        let listener = Arc::new(PacketListener::new(config, transport, sink));

        let mut attempt = 1;
        while !listener.initialize().await {
            if attempt >= policy.max_attempts {
                error!("Giving up on radio initialization after {attempt} attempt(s)");
                listener.cleanup().await;
                return Err(GatewayError::StartupFailed { attempts: attempt });
            }
            let backoff = policy.backoff_for(attempt);
            warn!(
                "Radio initialization attempt {attempt}/{} failed, retrying in {backoff:?}",
                policy.max_attempts
            );
            sleep(backoff).await;
            attempt += 1;
        }

        let receive_task = {
            let listener = Arc::clone(&listener);
            tokio::spawn(async move { listener.start_listening().await })
        };
        // Let the loop raise its listening flag so an early shutdown can clear it
        while !listener.is_listening() && !receive_task.is_finished() {
            tokio::task::yield_now().await;
        }
        let status_task = status_interval.map(|period| {
            let listener = Arc::clone(&listener);
            tokio::spawn(publish_status_periodically(listener, period))
        });

        info!("Gateway started");
        Ok(Self {
            listener,
            receive_task: Some(receive_task),
            status_task,
        })
    }

    pub fn listener(&self) -> &Arc<PacketListener<T, S>> {
        &self.listener
    }

    /// Transmit one outbound message.
    pub async fn submit(&self, message: ApplicationMessage) -> bool {
        self.listener.send_message(message).await
    }

    pub fn health(&self) -> HealthReport {
        let radio_connected = self.listener.is_connected();
        let bus_connected = self.listener.sink().is_connected();
        let status = if radio_connected && bus_connected {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        HealthReport {
            status,
            radio_connected,
            bus_connected,
            timestamp: Utc::now(),
            version: SERVICE_VERSION.to_string(),
            service_name: SERVICE_NAME.to_string(),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.listener.get_stats()
    }

    /// Publish the gateway status once, outside the periodic schedule.
    pub async fn publish_status(&self) -> bool {
        let listener: &PacketListener<T, S> = &self.listener;
        publish_status(listener).await
    }

    /// Stop listening, wait for the receive task and release the radio.
    pub async fn shutdown(mut self) {
        info!("Shutting down gateway");
        self.listener.stop_listening();

        if let Some(task) = self.status_task.take() {
            task.abort();
        }
        if let Some(mut task) = self.receive_task.take() {
            let timing = &self.listener.config().timing;
            let grace = timing.rx_poll_timeout() + timing.poll_interval() + Duration::from_secs(1);
            if timeout(grace, &mut task).await.is_err() {
                warn!("Receive task did not stop within {grace:?}, aborting it");
                task.abort();
            }
        }

        self.listener.cleanup().await;
        info!("Gateway stopped");
    }
}

impl<T, S> Drop for Gateway<T, S>
where
    T: Transport + 'static,
    S: RelaySink + 'static,
{
    fn drop(&mut self) {
        if let Some(task) = self.status_task.take() {
            task.abort();
        }
        if let Some(task) = self.receive_task.take() {
            self.listener.stop_listening();
            task.abort();
        }
    }
}

/// Gateway status message built from the current statistics.
pub fn status_message(
    gateway_id: &str,
    stats: &StatsSnapshot,
) -> Result<ApplicationMessage, GatewayError> {
    let value = serde_json::to_value(stats).map_err(PublishError::from)?;
    let message = ApplicationMessage::from_value(value)?
        .with(FIELD_TYPE, GATEWAY_STATUS_TYPE)
        .with(FIELD_GATEWAY_ID, gateway_id);
    Ok(message)
}

async fn publish_status<T: Transport, S: RelaySink>(listener: &PacketListener<T, S>) -> bool {
    let topic = listener.topics().gateway_status_topic();
    let message = match status_message(&listener.config().gateway_id, &listener.get_stats()) {
        Ok(message) => message,
        Err(e) => {
            warn!("Could not build gateway status: {e}");
            return false;
        }
    };
    match listener.sink().publish(&topic, &message).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Gateway status publish to {topic} failed: {e}");
            false
        }
    }
}

async fn publish_status_periodically<T: Transport, S: RelaySink>(
    listener: Arc<PacketListener<T, S>>,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    loop {
        ticker.tick().await;
        publish_status(listener.as_ref()).await;
    }
}
