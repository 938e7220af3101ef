//! Device simulator lifecycle
//!
//! A `DeviceSimulator` owns one port, one command table, and at most one
//! processing task. Its lifecycle is an explicit state machine:
//!
//! ```text
//! Created -> Starting -> Running -> Stopping -> Stopped
//!                 \-> Failed (terminal)
//! ```
//!
//! The state lives behind a shared guarded field so the processing task
//! can record its own exit and `status()` never needs the transport open.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, StopBits};
use tracing::{info, warn};

use uut_protocol::{CommandTable, DeviceRole};

use crate::config::DeviceConfig;
use crate::error::SimError;
use crate::task::{run_device_task, DeviceTaskCommand};

/// Serial open timeout; reads are bounded separately by the task loop
const OPEN_TIMEOUT: Duration = Duration::from_millis(100);

/// Bound on how long `stop` waits for the processing task to exit
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle state of a device simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Configured but never started
    Created,
    /// Transport acquisition in progress
    Starting,
    /// Processing loop active
    Running,
    /// Stop requested, waiting for the loop to exit
    Stopping,
    /// Terminal: stopped for this run
    Stopped,
    /// Terminal: transport could not be acquired
    Failed,
}

/// Snapshot of a simulator, valid whether or not its transport is open
#[derive(Debug, Clone)]
pub struct DeviceStatus {
    /// Port the simulator is bound to
    pub port_name: String,
    /// Configured baud rate
    pub baud_rate: u32,
    /// Vocabulary role
    pub role: DeviceRole,
    /// Current lifecycle state
    pub state: DeviceState,
    /// Whether the processing loop is active
    pub running: bool,
    /// Number of commands currently in the table
    pub command_count: usize,
}

/// One simulated device bound to one serial port.
pub struct DeviceSimulator {
    config: DeviceConfig,
    table: CommandTable,
    state: Arc<Mutex<DeviceState>>,
    cmd_tx: Option<mpsc::Sender<DeviceTaskCommand>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl DeviceSimulator {
    /// Create a simulator in the Created state with its role's vocabulary.
    pub fn new(config: DeviceConfig) -> Self {
        let table = config.role.command_table();
        Self {
            config,
            table,
            state: Arc::new(Mutex::new(DeviceState::Created)),
            cmd_tx: None,
            task: None,
        }
    }

    /// Port this simulator is bound to
    pub fn port_name(&self) -> &str {
        &self.config.port_name
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// Whether the processing loop is active
    pub fn is_running(&self) -> bool {
        self.state() == DeviceState::Running
    }

    /// Snapshot of this simulator. Never touches the transport.
    pub fn status(&self) -> DeviceStatus {
        let state = self.state();
        DeviceStatus {
            port_name: self.config.port_name.clone(),
            baud_rate: self.config.baud_rate,
            role: self.config.role,
            state,
            running: state == DeviceState::Running,
            command_count: self.table.len(),
        }
    }

    /// Hot-add a command → response mapping.
    ///
    /// Visible immediately, including to a running processing loop.
    pub fn add_command(&self, command: impl Into<String>, response: impl Into<String>) {
        self.table.insert(command, response);
    }

    /// Handle to the shared command table
    pub fn command_table(&self) -> CommandTable {
        self.table.clone()
    }

    /// Open the configured serial port (8N1) and launch the processing loop.
    ///
    /// On failure the simulator transitions to Failed — terminal, no
    /// retry — and the cause is returned. Sibling simulators are
    /// unaffected either way.
    pub fn start(&mut self) -> Result<(), SimError> {
        self.ensure_startable()?;
        self.set_state(DeviceState::Starting);

        info!(
            "Opening {} for {} @ {} baud",
            self.config.port_name,
            self.config.role.label(),
            self.config.baud_rate
        );

        let stream = tokio_serial::new(&self.config.port_name, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(OPEN_TIMEOUT)
            .open_native_async()
            .map_err(|e| {
                warn!("Failed to open {}: {}", self.config.port_name, e);
                self.set_state(DeviceState::Failed);
                SimError::Transport(e)
            })?;

        self.spawn(stream);
        Ok(())
    }

    /// Launch the processing loop over an already-open duplex stream.
    ///
    /// Used for virtual transports and tests; lifecycle behavior is
    /// identical to [`DeviceSimulator::start`].
    pub fn start_with_stream<S>(&mut self, stream: S) -> Result<(), SimError>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        self.ensure_startable()?;
        self.set_state(DeviceState::Starting);
        self.spawn(stream);
        Ok(())
    }

    /// Request a stop and wait (bounded) for the loop to exit.
    ///
    /// Idempotent and always completes: if the task does not acknowledge
    /// within the bound its handle is dropped and the state is forced to
    /// Stopped anyway. A Failed simulator stays Failed.
    pub async fn stop(&mut self) {
        if self.state() == DeviceState::Failed {
            return;
        }
        self.set_state(DeviceState::Stopping);

        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(DeviceTaskCommand::Shutdown).await;
        }

        if let Some(task) = self.task.take() {
            match tokio::time::timeout(STOP_TIMEOUT, task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    warn!("Device loop on {} ended with error: {}", self.config.port_name, e);
                }
                Ok(Err(e)) => {
                    warn!("Device task on {} panicked: {}", self.config.port_name, e);
                }
                Err(_) => {
                    warn!(
                        "Device task on {} did not stop within {:?}, abandoning it",
                        self.config.port_name, STOP_TIMEOUT
                    );
                }
            }
        }

        self.set_state(DeviceState::Stopped);
        info!("Stopped simulator on {}", self.config.port_name);
    }

    fn ensure_startable(&self) -> Result<(), SimError> {
        let state = self.state();
        if state != DeviceState::Created {
            return Err(SimError::NotStartable {
                port: self.config.port_name.clone(),
                state,
            });
        }
        Ok(())
    }

    fn set_state(&self, new: DeviceState) {
        *self.state.lock().expect("state lock poisoned") = new;
    }

    /// Spawn exactly one processing task over the given stream.
    fn spawn<S>(&mut self, stream: S)
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let role = self.config.role;
        let table = self.table.clone();
        let port_name = self.config.port_name.clone();
        let state = Arc::clone(&self.state);

        self.set_state(DeviceState::Running);
        self.cmd_tx = Some(cmd_tx);
        self.task = Some(tokio::spawn(async move {
            let result = run_device_task(stream, role, table, port_name, cmd_rx).await;
            // The loop only exits on shutdown, peer close, or a fatal
            // fault; all of them end this run.
            *state.lock().expect("state lock poisoned") = DeviceState::Stopped;
            result
        }));
    }
}

impl std::fmt::Debug for DeviceSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSimulator")
            .field("port_name", &self.config.port_name)
            .field("role", &self.config.role)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn main_config() -> DeviceConfig {
        DeviceConfig {
            port_name: "sim-main".to_string(),
            baud_rate: 9600,
            role: DeviceRole::Main,
        }
    }

    #[tokio::test]
    async fn test_status_before_start() {
        let sim = DeviceSimulator::new(main_config());
        let status = sim.status();
        assert_eq!(status.state, DeviceState::Created);
        assert!(!status.running);
        assert_eq!(status.command_count, 5);
        assert_eq!(status.baud_rate, 9600);
    }

    #[tokio::test]
    async fn test_start_and_stop_lifecycle() {
        let mut sim = DeviceSimulator::new(main_config());
        let (_host, device) = tokio::io::duplex(256);

        sim.start_with_stream(device).unwrap();
        assert_eq!(sim.state(), DeviceState::Running);
        assert!(sim.is_running());

        sim.stop().await;
        assert_eq!(sim.state(), DeviceState::Stopped);
        assert!(!sim.is_running());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut sim = DeviceSimulator::new(main_config());
        let (_host, device) = tokio::io::duplex(256);
        sim.start_with_stream(device).unwrap();

        sim.stop().await;
        sim.stop().await;
        assert_eq!(sim.state(), DeviceState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let mut sim = DeviceSimulator::new(main_config());
        sim.stop().await;
        assert_eq!(sim.state(), DeviceState::Stopped);
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let mut sim = DeviceSimulator::new(main_config());
        let (_host, device) = tokio::io::duplex(256);
        sim.start_with_stream(device).unwrap();

        let (_host2, device2) = tokio::io::duplex(256);
        let err = sim.start_with_stream(device2).unwrap_err();
        assert!(matches!(
            err,
            SimError::NotStartable {
                state: DeviceState::Running,
                ..
            }
        ));

        sim.stop().await;
    }

    #[tokio::test]
    async fn test_start_on_missing_port_fails() {
        let mut sim = DeviceSimulator::new(DeviceConfig {
            port_name: "/dev/uutsim-does-not-exist".to_string(),
            baud_rate: 9600,
            role: DeviceRole::Main,
        });

        let err = sim.start().unwrap_err();
        assert!(matches!(err, SimError::Transport(_)));
        assert_eq!(sim.state(), DeviceState::Failed);

        // Failed is terminal; stop leaves it alone
        sim.stop().await;
        assert_eq!(sim.state(), DeviceState::Failed);
    }

    #[tokio::test]
    async fn test_hot_added_command_visible_to_running_loop() {
        let mut sim = DeviceSimulator::new(main_config());
        let (mut host, device) = tokio::io::duplex(256);
        sim.start_with_stream(device).unwrap();

        sim.add_command("MAIN_PING", "MAIN_PONG");

        host.write_all(b"MAIN_PING\r\n").await.unwrap();
        let mut reply = Vec::new();
        let mut buf = [0u8; 64];
        while !reply.ends_with(b"\n") {
            let n = host.read(&mut buf).await.unwrap();
            assert!(n > 0);
            reply.extend_from_slice(&buf[..n]);
        }
        assert_eq!(reply, b"MAIN_PONG\r\n");

        sim.stop().await;
    }
}
