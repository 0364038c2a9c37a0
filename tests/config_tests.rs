//! Configuration loading from JSON files

use lora_gateway::config::{ConfigError, GatewayConfig};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_partial_file_overrides_defaults() {
    let file = write_config(
        r#"{
            "gateway_id": "garden_gw",
            "radio": { "frequency_hz": 433000000, "spreading_factor": 9 },
            "timing": { "tx_timeout_ms": 3000 }
        }"#,
    );

    let config = GatewayConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.gateway_id, "garden_gw");
    assert_eq!(config.topic_root, "gardenconnect");
    assert_eq!(config.radio.frequency_hz, 433_000_000);
    assert_eq!(config.radio.spreading_factor, 9);
    assert_eq!(config.radio.bandwidth_hz, 125_000);
    assert_eq!(config.radio.bus.reset_pin, 22);
    assert_eq!(config.timing.tx_timeout(), Duration::from_secs(3));
    assert_eq!(config.timing.poll_interval(), Duration::from_millis(100));
}

#[test]
fn test_empty_document_is_default() {
    let file = write_config("{}");
    let config = GatewayConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config, GatewayConfig::default());
}

#[test]
fn test_full_round_trip_through_file() {
    let mut original = GatewayConfig::for_environment("development");
    original.radio.bus.dio0_pin = 24;
    original.radio.sync_word = 0x34;
    let file = write_config(&serde_json::to_string_pretty(&original).unwrap());

    assert_eq!(GatewayConfig::from_json_file(file.path()).unwrap(), original);
}

#[test]
fn test_invalid_value_is_rejected() {
    let file = write_config(r#"{ "radio": { "coding_rate": 9 } }"#);
    let err = GatewayConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "coding_rate", .. }));
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let file = write_config(r#"{ "radio": "#);
    assert!(matches!(
        GatewayConfig::from_json_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    assert!(matches!(
        GatewayConfig::from_json_file(path),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_empty_gateway_id_is_rejected() {
    assert!(matches!(
        GatewayConfig::from_json_str(r#"{ "gateway_id": "  " }"#),
        Err(ConfigError::Invalid { field: "gateway_id", .. })
    ));
}
