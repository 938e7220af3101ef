//! UUT Protocol Library
//!
//! This crate defines the command/response vocabularies spoken by simulated
//! Units Under Test (UUTs) and the lookup table that drives them:
//!
//! - **CommandTable**: a concurrency-safe command → response map with the
//!   terminator-tolerant lookup the test orchestrator depends on
//! - **DeviceRole**: the fixed vocabulary of a simulated device kind
//!   (main UUT, indexed secondary port, or generic RS-232 device)
//!
//! Commands are line-delimited ASCII, matched case-sensitively against the
//! stored key. Responses are stored without a terminator; the transport
//! layer appends CRLF when writing.
//!
//! # Example
//!
//! ```rust
//! use uut_protocol::DeviceRole;
//!
//! let role = DeviceRole::Main;
//! let table = role.command_table();
//!
//! assert_eq!(table.lookup("MAIN_POWER_ON").as_deref(), Some("MAIN_POWER:ON"));
//!
//! // Unrecognized commands still get a deterministic reply
//! assert_eq!(role.fallback_response("MAIN_FOO"), "MAIN_UNKNOWN_CMD:MAIN_FOO");
//! assert_eq!(role.fallback_response("garbage"), "MAIN_ERROR:INVALID_COMMAND");
//! ```

pub mod role;
pub mod table;

pub use role::{DeviceRole, GENERIC_REPLY_DELAY, PORT_TEST_DELAY, SELF_TEST_DELAY};
pub use table::CommandTable;
