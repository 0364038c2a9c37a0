//! # SX1278 Driver Tests
//!
//! Driver behaviour against the simulated transport: initialization,
//! transmit, receive, link quality, counters and close.

use lora_gateway::config::RadioConfig;
use lora_gateway::radio::registers::{BANDWIDTHS_HZ, REG_FIFO};
use lora_gateway::radio::{RadioMode, SimulatedTransport, Sx1278Driver, Transport};
use proptest::prelude::*;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(200);

async fn ready_driver(config: RadioConfig) -> (SimulatedTransport, Sx1278Driver<SimulatedTransport>) {
    let sim = SimulatedTransport::new();
    let mut driver = Sx1278Driver::new(sim.clone(), config);
    driver.initialize().await.expect("simulated radio initializes");
    (sim, driver)
}

fn fifo_writes(sim: &SimulatedTransport) -> usize {
    sim.write_log().iter().filter(|(addr, _)| *addr == REG_FIFO).count()
}

#[tokio::test]
async fn test_initialize_reaches_receive_mode() {
    let (sim, driver) = ready_driver(RadioConfig::default()).await;
    assert!(driver.is_ready());
    assert_eq!(driver.mode(), RadioMode::Receive);
    assert!(sim.is_open());
    assert_eq!(driver.signal_strength(), None);
    assert_eq!(driver.signal_to_noise(), None);
}

#[tokio::test]
async fn test_send_transmits_payload_on_configured_carrier() {
    let config = RadioConfig {
        frequency_hz: 433_000_000,
        ..RadioConfig::default()
    };
    let (sim, mut driver) = ready_driver(config).await;

    assert!(driver.send(b"{\"type\":\"status\"}").await);

    let frames = sim.transmitted();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload, b"{\"type\":\"status\"}".to_vec());
    assert_eq!(frames[0].frf, 0x6C_4000);
    assert_eq!(driver.stats().packets_sent, 1);
    assert_eq!(driver.mode(), RadioMode::Receive);
}

#[tokio::test]
async fn test_oversize_payload_is_refused_without_fifo_writes() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    sim.clear_write_log();

    assert!(!driver.send(&[0x41; 256]).await);

    assert_eq!(fifo_writes(&sim), 0);
    assert!(sim.write_log().is_empty());
    assert!(sim.transmitted().is_empty());
    assert_eq!(driver.stats().packets_sent, 0);
}

#[tokio::test]
async fn test_maximum_payload_is_accepted() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    sim.clear_write_log();

    let payload = vec![0x5A; 255];
    assert!(driver.send(&payload).await);
    assert_eq!(fifo_writes(&sim), 255);
    assert_eq!(sim.transmitted()[0].payload, payload);
}

#[tokio::test]
async fn test_receive_reads_payload_and_link_quality() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;

    // RSSI 120 - 164 = -44 dBm, SNR 0xEC = -20 quarter dB = -5 dB
    sim.inject_frame_with_quality(b"{\"type\":\"heartbeat\"}", 120, 0xEC);

    let packet = driver.receive(POLL).await.expect("packet available");
    assert_eq!(packet.as_bytes(), b"{\"type\":\"heartbeat\"}");
    assert_eq!(packet.rssi_dbm, -44);
    assert_eq!(packet.snr_db, -5.0);
    assert_eq!(driver.signal_strength(), Some(-44));
    assert_eq!(driver.signal_to_noise(), Some(-5.0));
    assert_eq!(driver.stats().packets_received, 1);

    // Flags were cleared, nothing left to read
    assert!(driver.receive(POLL).await.is_none());
    assert_eq!(sim.pending_frames(), 0);
}

#[tokio::test]
async fn test_receive_without_packet_returns_none() {
    let (_sim, mut driver) = ready_driver(RadioConfig::default()).await;
    assert!(driver.receive(POLL).await.is_none());
    assert_eq!(driver.stats().packets_received, 0);
}

#[tokio::test]
async fn test_crc_error_is_counted_and_dropped() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    sim.inject_crc_error(b"garbled");

    assert!(driver.receive(POLL).await.is_none());

    let stats = driver.stats();
    assert_eq!(stats.crc_errors, 1);
    assert_eq!(stats.packets_received, 0);
    assert_eq!(driver.signal_strength(), None);
    assert_eq!(sim.pending_frames(), 0);
}

#[tokio::test]
async fn test_transport_failure_during_receive_is_not_fatal() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    sim.inject_frame(b"{\"type\":\"status\"}");

    sim.fail_transfers(true);
    assert!(driver.receive(POLL).await.is_none());
    assert_eq!(driver.stats().packets_received, 0);

    // The packet is still flagged once the bus recovers
    sim.fail_transfers(false);
    assert!(driver.receive(POLL).await.is_some());
    assert_eq!(driver.stats().packets_received, 1);
}

#[tokio::test]
async fn test_pending_packet_survives_a_transmission() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    sim.inject_frame(b"{\"type\":\"heartbeat\",\"node_id\":\"n5\"}");

    assert!(driver.send(b"{\"type\":\"status\"}").await);

    let packet = driver.receive(POLL).await.expect("inbound packet kept");
    assert_eq!(packet.as_bytes(), b"{\"type\":\"heartbeat\",\"node_id\":\"n5\"}");
}

#[tokio::test]
async fn test_queued_packets_arrive_in_order() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    sim.inject_frame(b"first");
    sim.inject_frame(b"second");

    assert_eq!(driver.receive(POLL).await.unwrap().as_bytes(), b"first");
    assert_eq!(driver.receive(POLL).await.unwrap().as_bytes(), b"second");
    assert_eq!(driver.stats().packets_received, 2);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    assert!(driver.send(b"x").await);
    let before = driver.stats();

    driver.close();
    driver.close();

    assert!(!driver.is_ready());
    assert_eq!(driver.mode(), RadioMode::Closed);
    assert_eq!(sim.close_count(), 1);
    assert_eq!(driver.stats(), before);
    assert!(!driver.send(b"y").await);
}

#[tokio::test]
async fn test_drop_releases_transport() {
    let (sim, driver) = ready_driver(RadioConfig::default()).await;
    drop(driver);
    assert!(!sim.is_open());
    assert_eq!(sim.close_count(), 1);
}

#[tokio::test]
async fn test_reinitialize_after_close() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    driver.close();
    driver.initialize().await.unwrap();
    assert!(driver.is_ready());
    assert_eq!(sim.open_count(), 2);
}

#[tokio::test]
async fn test_counters_shared_through_handle() {
    let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
    let counters = driver.counters();

    sim.inject_frame(b"abc");
    driver.receive(POLL).await.unwrap();
    assert!(driver.send(b"def").await);

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.packets_received, 1);
    assert_eq!(snapshot.packets_sent, 1);
}

fn valid_radio_config() -> impl Strategy<Value = RadioConfig> {
    (
        137_000_000u32..=1_020_000_000,
        2i8..=17,
        6u8..=12,
        0usize..BANDWIDTHS_HZ.len(),
        5u8..=8,
        6u16..=1_000,
        any::<u8>(),
    )
        .prop_map(|(frequency_hz, tx_power_dbm, sf, bw, coding_rate, preamble, sync)| RadioConfig {
            frequency_hz,
            tx_power_dbm,
            spreading_factor: sf,
            bandwidth_hz: BANDWIDTHS_HZ[bw],
            coding_rate,
            preamble_length: preamble,
            sync_word: sync,
            ..RadioConfig::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_valid_config_initializes(config in valid_radio_config()) {
        let ready = tokio_test::block_on(async {
            let mut driver = Sx1278Driver::new(SimulatedTransport::new(), config);
            driver.initialize().await.is_ok() && driver.is_ready()
        });
        prop_assert!(ready);
    }

    #[test]
    fn prop_send_up_to_fifo_limit_counts_once(payload in proptest::collection::vec(any::<u8>(), 0..=255)) {
        let (sent, count, frames) = tokio_test::block_on(async {
            let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
            let before = driver.stats().packets_sent;
            let sent = driver.send(&payload).await;
            (sent, driver.stats().packets_sent - before, sim.transmitted())
        });
        prop_assert!(sent);
        prop_assert_eq!(count, 1);
        prop_assert_eq!(&frames[0].payload, &payload);
    }

    #[test]
    fn prop_oversize_never_touches_fifo(len in 256usize..1_024) {
        let (sent, writes) = tokio_test::block_on(async {
            let (sim, mut driver) = ready_driver(RadioConfig::default()).await;
            sim.clear_write_log();
            let sent = driver.send(&vec![0u8; len]).await;
            (sent, fifo_writes(&sim))
        });
        prop_assert!(!sent);
        prop_assert_eq!(writes, 0);
    }
}
