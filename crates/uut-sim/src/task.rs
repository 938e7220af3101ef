//! Per-device processing loop
//!
//! This module provides the async task that owns a device's transport and
//! runs its read-evaluate-respond loop. The task uses a `select!` loop to:
//! - Read line-delimited commands from the stream and answer them
//! - Handle shutdown requests from a channel
//!
//! The task is generic over the stream so real serial ports
//! (`tokio_serial::SerialStream`) and in-memory duplex pipes share one
//! code path.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use uut_protocol::{CommandTable, DeviceRole};

/// How long a single read may block before the loop re-checks for shutdown
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Commands that can be sent to a device task
#[derive(Debug)]
pub enum DeviceTaskCommand {
    /// Shutdown the task
    Shutdown,
}

/// Run the processing loop for one simulated device.
///
/// Reads commands line by line, resolves each through the command table
/// (falling back to the role's deterministic error replies), and writes
/// the CRLF-terminated response before reading the next command. Commands
/// and responses strictly alternate on the stream.
///
/// Returns `Ok(())` on shutdown or peer close; any non-timeout I/O fault
/// ends the loop with the error. A read timeout is a normal, expected
/// condition and just re-arms the loop.
pub async fn run_device_task<S>(
    mut stream: S,
    role: DeviceRole,
    table: CommandTable,
    port_name: String,
    mut cmd_rx: mpsc::Receiver<DeviceTaskCommand>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 1024];
    let mut pending: Vec<u8> = Vec::new();

    info!("{} simulator ready on {}", role.label(), port_name);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(DeviceTaskCommand::Shutdown) | None => {
                        info!("Shutdown requested for {} on {}", role.label(), port_name);
                        break;
                    }
                }
            }

            result = tokio::time::timeout(READ_TIMEOUT, stream.read(&mut buf)) => {
                match result {
                    Ok(Ok(0)) => {
                        debug!("Stream closed for {} on {}", role.label(), port_name);
                        break;
                    }
                    Ok(Ok(n)) => {
                        pending.extend_from_slice(&buf[..n]);
                        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                            let line: Vec<u8> = pending.drain(..=pos).collect();
                            respond(&mut stream, role, &table, &port_name, &line).await?;
                        }
                    }
                    Ok(Err(e)) => {
                        warn!("Read error on {}: {}", port_name, e);
                        return Err(e);
                    }
                    Err(_) => {} // read timeout, nothing pending
                }
            }
        }
    }

    info!("{} simulator closed on {}", role.label(), port_name);
    Ok(())
}

/// Answer one received line.
///
/// Undecodable bytes are test noise, not a structural failure: the line is
/// logged and dropped, the loop stays alive. An empty line gets no
/// response at all.
async fn respond<S>(
    stream: &mut S,
    role: DeviceRole,
    table: &CommandTable,
    port_name: &str,
    line: &[u8],
) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(e) => {
            warn!("Dropping undecodable line on {}: {}", port_name, e);
            return Ok(());
        }
    };

    let command = text.trim_end_matches(['\r', '\n']);
    if command.is_empty() {
        return Ok(());
    }

    debug!("RX on {}: {:?}", port_name, command);

    let response = table
        .lookup(command)
        .unwrap_or_else(|| role.fallback_response(command));

    if let Some(delay) = role.response_delay(command) {
        tokio::time::sleep(delay).await;
    }

    stream.write_all(response.as_bytes()).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await?;

    debug!("TX on {}: {:?}", port_name, response);
    Ok(())
}
