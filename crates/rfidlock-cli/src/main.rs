//! Host driver for the reader bring-up.
//!
//! ```text
//! rfidlock --port /dev/ttyUSB0 run
//! rfidlock --simulate run --json
//! rfidlock door open
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rfidlock_bringup::{BringupConfig, LedBar, ReaderProtocol};
use rfidlock_hardware::console::ConsoleControlLine;
use rfidlock_hardware::mock::SimulatedReader;
use rfidlock_hardware::{AnyTransport, DoorActuator, SerialLink, SerialTransport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rfidlock", version, about = "Reader bring-up and door actuator driver")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial port of the reader (overrides the config file)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Use the in-process simulated reader instead of a serial port
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full bring-up sequence, then hold the idle pattern
    Run {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit once idle instead of waiting for Ctrl-C
        #[arg(long)]
        no_wait: bool,
    },

    /// Pulse the door actuator once
    Door {
        #[command(subcommand)]
        action: DoorAction,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum DoorAction {
    Open,
    Close,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Run { json, no_wait } => run(&cli, config, json, no_wait).await,
        Command::Door { action } => door(&config, action).await,
    }
}

fn load_config(cli: &Cli) -> Result<BringupConfig> {
    let mut config = match &cli.config {
        Some(path) => BringupConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BringupConfig::default(),
    };

    if let Some(port) = &cli.port {
        config.serial.port = Some(port.clone());
    }

    Ok(config)
}

fn open_transport(cli: &Cli, config: &BringupConfig) -> Result<AnyTransport> {
    if cli.simulate {
        info!("Using simulated reader");
        return Ok(SimulatedReader::default().into());
    }

    let Some(port) = config.serial.port.as_deref() else {
        bail!("no serial port configured; pass --port or --simulate");
    };

    open_serial(port, config)
}

#[cfg(feature = "hardware-serial")]
fn open_serial(port: &str, config: &BringupConfig) -> Result<AnyTransport> {
    let transport =
        rfidlock_hardware::SerialPortTransport::open(port, &config.serial.link_settings())
            .with_context(|| format!("opening {port}"))?;
    Ok(transport.into())
}

#[cfg(not(feature = "hardware-serial"))]
fn open_serial(port: &str, _config: &BringupConfig) -> Result<AnyTransport> {
    bail!("cannot open {port}: built without serial port support");
}

async fn run(cli: &Cli, config: BringupConfig, json: bool, no_wait: bool) -> Result<()> {
    let transport = open_transport(cli, &config)?;
    info!("Reader transport: {}", transport.info().name);

    let mut link = SerialLink::new(transport, config.build_timeout_window());
    link.init(&config.serial.link_settings()).await?;
    link.arm_timeout();

    let mut session = ReaderProtocol::new(link, LedBar::stdout(), config);
    let report = session.run().await.context("bring-up failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            identity = %report.identity_text().unwrap_or_default(),
            handshake_attempts = report.handshake_attempts,
            faults = report.faults().len(),
            clean = report.is_clean(),
            "Bring-up report"
        );
    }

    if !no_wait {
        info!("Idle; press Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

async fn door(config: &BringupConfig, action: DoorAction) -> Result<()> {
    let line = ConsoleControlLine::new("door");
    let mut actuator = DoorActuator::new(line, config.open_pulse(), config.close_pulse());

    match action {
        DoorAction::Open => actuator.open().await?,
        DoorAction::Close => actuator.close().await?,
    }

    Ok(())
}
