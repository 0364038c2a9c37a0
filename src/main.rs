use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use lora_gateway::logging::{init_logger_with_level, log_info, log_warn};
use lora_gateway::relay::LogSink;
use lora_gateway::{ApplicationMessage, Gateway, GatewayConfig, SimulatedTransport, Transport};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "lora-gateway")]
#[command(about = "LoRa to message-bus gateway for SX127x radios")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Named preset: development, production or test
    #[arg(short, long)]
    environment: Option<String>,

    /// Use the in-memory radio instead of the SPI hardware
    #[arg(long)]
    simulate: bool,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn load_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    if let Some(path) = &cli.config {
        return GatewayConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }
    let config = match &cli.environment {
        Some(name) => GatewayConfig::for_environment(name),
        None => GatewayConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger_with_level(cli.log_level);

    let config = load_config(&cli)?;

    if cli.simulate {
        return run(config, SimulatedTransport::new()).await;
    }
    run_hardware(config).await
}

#[cfg(feature = "raspberry-pi")]
async fn run_hardware(config: GatewayConfig) -> anyhow::Result<()> {
    run(config, lora_gateway::radio::RaspberryPiTransport::new()).await
}

#[cfg(not(feature = "raspberry-pi"))]
async fn run_hardware(config: GatewayConfig) -> anyhow::Result<()> {
    log_warn("Built without raspberry-pi support, using the simulated radio");
    run(config, SimulatedTransport::new()).await
}

/// Run until Ctrl-C, transmitting each JSON object read from stdin.
async fn run<T: Transport + 'static>(config: GatewayConfig, transport: T) -> anyhow::Result<()> {
    let gateway = Gateway::start(config, transport, LogSink)
        .await
        .context("Failed to start gateway")?;
    log_info("Gateway running; one JSON message per line on stdin is sent over the radio");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => submit_line(&gateway, line.trim()).await,
                Ok(None) => stdin_open = false,
                Err(e) => {
                    log_warn(&format!("Failed to read stdin: {e}"));
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let health = gateway.health();
    let stats = gateway.stats();
    gateway.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&health)?);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn submit_line<T: Transport + 'static>(gateway: &Gateway<T, LogSink>, line: &str) {
    if line.is_empty() {
        return;
    }
    let message = match serde_json::from_str::<serde_json::Value>(line)
        .map_err(anyhow::Error::from)
        .and_then(|value| ApplicationMessage::try_from(value).map_err(anyhow::Error::from))
    {
        Ok(message) => message,
        Err(e) => {
            log_warn(&format!("Ignoring input line: {e}"));
            return;
        }
    };

    if gateway.submit(message).await {
        log_info("Message sent");
    } else {
        log_warn("Message could not be sent");
    }
}
