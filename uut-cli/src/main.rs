//! UUT Simulator Launcher
//!
//! Runs simulated hardware test devices on serial ports so the
//! SerialPortPool orchestrator can be exercised without real hardware:
//!
//! - `group`: one main UUT plus exactly three secondary port devices
//! - `single`: one generic RS-232 device on a single port
//!
//! # Usage
//!
//! Group mode (main UUT on COM6, secondaries on the FT4232 ports):
//! ```bash
//! uutsim group --main COM6 --ports COM11,COM12,COM13
//! ```
//!
//! Single generic device:
//! ```bash
//! uutsim single --port COM5 --baud 115200
//! ```
//!
//! Ctrl-C triggers a graceful group shutdown; the process exits non-zero
//! if the launch configuration is invalid.

use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uut_sim::{GroupConfig, SimulatorGroup};

#[derive(Parser)]
#[command(name = "uutsim")]
#[command(about = "Serial UUT simulators for test-orchestrator development", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a main UUT plus three secondary port devices
    Group {
        /// Main UUT port
        #[arg(long, default_value = "COM6")]
        main: String,

        /// Comma-separated secondary ports, mapped to PORT1..PORT3
        #[arg(long, default_value = "COM11,COM12,COM13")]
        ports: String,

        /// Baud rate for all ports
        #[arg(long, default_value_t = 9600)]
        baud: u32,
    },

    /// Simulate a single generic RS-232 device
    Single {
        /// Serial port to use
        #[arg(long, default_value = "COM5")]
        port: String,

        /// Baud rate
        #[arg(long, default_value_t = 115_200)]
        baud: u32,

        /// Run duration in seconds (0 = until interrupted)
        #[arg(long, default_value_t = 0)]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uut_cli=info,uut_sim=info,uut_protocol=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Group { main, ports, baud } => {
            let secondary_ports: Vec<String> =
                ports.split(',').map(|p| p.trim().to_string()).collect();
            let config = GroupConfig {
                main_port: main,
                secondary_ports,
                baud_rate: baud,
            };
            let group = SimulatorGroup::from_config(&config)?;
            run_until_stopped(group, None).await
        }
        Commands::Single { port, baud, duration } => {
            let group = SimulatorGroup::single(port, baud);
            let limit = (duration > 0).then(|| Duration::from_secs(duration));
            run_until_stopped(group, limit).await
        }
    }
}

/// Start the group, block until a stop signal (or the optional duration
/// elapses), then shut everything down gracefully.
async fn run_until_stopped(mut group: SimulatorGroup, limit: Option<Duration>) -> Result<()> {
    let started = group.start_all();
    if started == 0 {
        group.stop_all().await;
        bail!("no simulator could be started");
    }

    info!("Ready for commands (Ctrl-C to stop)");

    match limit {
        Some(duration) => {
            tokio::select! {
                _ = signal::ctrl_c() => info!("Shutdown signal received"),
                _ = tokio::time::sleep(duration) => info!("Run duration elapsed"),
            }
        }
        None => {
            signal::ctrl_c().await?;
            info!("Shutdown signal received");
        }
    }

    group.stop_all().await;
    Ok(())
}
