//! Error types for the simulator crate

use thiserror::Error;

use crate::device::DeviceState;

/// Errors that can occur while configuring or running simulators
#[derive(Debug, Error)]
pub enum SimError {
    /// Launch configuration rejected before any simulator was created
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The serial port could not be acquired (missing, busy, permission denied)
    #[error("serial transport error: {0}")]
    Transport(#[from] tokio_serial::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `start` called on a simulator that is not in the Created state
    #[error("simulator on {port} cannot start from state {state:?}")]
    NotStartable {
        /// Port the simulator is bound to
        port: String,
        /// State the simulator was in when start was attempted
        state: DeviceState,
    },
}
