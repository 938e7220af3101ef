//! UUT Simulation Library
//!
//! This crate runs simulated hardware test devices (Units Under Test) on
//! serial ports so a test orchestrator can be exercised without real
//! hardware attached. It provides:
//!
//! - **DeviceSimulator**: one simulated device per port, with an explicit
//!   lifecycle state machine and a single async processing loop
//! - **SimulatorGroup**: a supervisor that starts and gracefully stops a
//!   main device plus its secondary port devices together
//! - **GroupConfig / DeviceConfig**: launch configuration, validated
//!   before any port is opened
//!
//! Each simulator owns its transport exclusively and runs in its own
//! spawned task; simulators never block each other, and a stop request is
//! observed within one read-timeout interval.
//!
//! # Example
//!
//! ```rust,no_run
//! use uut_sim::{GroupConfig, SimulatorGroup};
//!
//! # async fn demo() -> Result<(), uut_sim::SimError> {
//! let config = GroupConfig {
//!     main_port: "/dev/ttyUSB0".into(),
//!     secondary_ports: vec![
//!         "/dev/ttyUSB1".into(),
//!         "/dev/ttyUSB2".into(),
//!         "/dev/ttyUSB3".into(),
//!     ],
//!     baud_rate: 9600,
//! };
//!
//! let mut group = SimulatorGroup::from_config(&config)?;
//! group.start_all();
//! // ... wait for a stop signal ...
//! group.stop_all().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod group;
pub mod task;

pub use config::{DeviceConfig, GroupConfig, SECONDARY_PORT_COUNT};
pub use device::{DeviceSimulator, DeviceState, DeviceStatus};
pub use error::SimError;
pub use group::{GroupState, SimulatorGroup};
pub use task::{run_device_task, DeviceTaskCommand};
