//! Role vocabularies for simulated devices
//!
//! Each simulated device speaks one fixed vocabulary determined by its
//! role. Recognized commands come from the role's [`CommandTable`];
//! anything else gets one of two deterministic fallbacks: commands that
//! carry the role's prefix but are not individually recognized echo the
//! offending text, commands that miss the prefix entirely get the role's
//! generic invalid-command reply. The orchestrator's tests depend on the
//! exact fallback text, so the two templates are kept distinct.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::table::CommandTable;

/// Simulated processing time for the main UUT's self test
pub const SELF_TEST_DELAY: Duration = Duration::from_millis(500);

/// Simulated processing time for a secondary port's channel test
pub const PORT_TEST_DELAY: Duration = Duration::from_millis(300);

/// Flat reply latency of the generic RS-232 device
pub const GENERIC_REPLY_DELAY: Duration = Duration::from_millis(100);

/// The kind of device a simulator presents on its port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceRole {
    /// The single main UUT of a group (`MAIN_*` vocabulary)
    Main,
    /// A secondary device distinguished by its port index (`PORT{N}_*` vocabulary)
    Port(u8),
    /// A standalone generic RS-232 device (AT-style vocabulary)
    Generic,
}

impl DeviceRole {
    /// Build the command table for this role.
    ///
    /// Responses are stored without a terminator; the writer appends CRLF.
    pub fn command_table(&self) -> CommandTable {
        let table = CommandTable::new();

        match self {
            DeviceRole::Main => {
                table.insert("MAIN_POWER_ON", "MAIN_POWER:ON");
                table.insert("MAIN_INIT", "MAIN_INIT:OK");
                table.insert("MAIN_TEST_STATUS", "MAIN_STATUS:READY");
                table.insert("MAIN_SELF_TEST", "MAIN_SELF_TEST:PASS");
                table.insert("MAIN_SHUTDOWN", "MAIN_SHUTDOWN:OK");
            }
            DeviceRole::Port(n) => {
                table.insert(format!("PORT{n}_ENABLE"), format!("PORT{n}:ENABLED"));
                table.insert(format!("PORT{n}_TEST"), format!("PORT{n}:TEST_OK"));
                table.insert(format!("PORT{n}_DATA_CHECK"), format!("PORT{n}:DATA_VALID"));
                table.insert(format!("PORT{n}_DISABLE"), format!("PORT{n}:DISABLED"));
            }
            DeviceRole::Generic => {
                table.insert("ATZ", "OK");
                table.insert("INIT_RS232", "READY");
                table.insert("AT+STATUS", "STATUS_OK");
                table.insert("RUN_TEST_1", "PASS");
                table.insert("TEST", "PASS");
                table.insert("AT+QUIT", "GOODBYE");
                table.insert("STOP_RS232", "BYE");
                table.insert("EXIT", "BYE");
                table.insert("AT+SHUTDOWN", "SHUTDOWN_OK");
            }
        }

        table
    }

    /// Reply for a command the table did not recognize.
    ///
    /// `raw` is the terminator-trimmed command as received.
    pub fn fallback_response(&self, raw: &str) -> String {
        match self {
            DeviceRole::Main => {
                if raw.starts_with("MAIN_") {
                    format!("MAIN_UNKNOWN_CMD:{raw}")
                } else {
                    "MAIN_ERROR:INVALID_COMMAND".to_string()
                }
            }
            DeviceRole::Port(n) => {
                if raw.starts_with(&format!("PORT{n}_")) {
                    format!("PORT{n}_UNKNOWN_CMD:{raw}")
                } else {
                    format!("PORT{n}_ERROR:INVALID_COMMAND")
                }
            }
            DeviceRole::Generic => "ERROR: Unknown command".to_string(),
        }
    }

    /// Simulated processing delay applied before the response is written.
    ///
    /// The generic device pauses before every reply; the group roles only
    /// delay their slow test commands.
    pub fn response_delay(&self, command: &str) -> Option<Duration> {
        match self {
            DeviceRole::Main => (command == "MAIN_SELF_TEST").then_some(SELF_TEST_DELAY),
            DeviceRole::Port(n) => {
                (command == format!("PORT{n}_TEST")).then_some(PORT_TEST_DELAY)
            }
            DeviceRole::Generic => Some(GENERIC_REPLY_DELAY),
        }
    }

    /// Short display name for log lines
    pub fn label(&self) -> String {
        match self {
            DeviceRole::Main => "MAIN".to_string(),
            DeviceRole::Port(n) => format!("PORT{n}"),
            DeviceRole::Generic => "UUT".to_string(),
        }
    }
}
