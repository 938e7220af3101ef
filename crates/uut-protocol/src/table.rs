//! Command/response lookup table
//!
//! A `CommandTable` maps exact command text to a response. The table is
//! shared by cloning: every clone points at the same underlying map, so an
//! entry added through one handle is immediately visible to a processing
//! loop reading through another. Lookup and insert are each atomic with
//! respect to concurrent callers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

/// Shared mapping from command text to response text.
///
/// Keys are matched case-sensitively. Lookup is tolerant of CRLF
/// terminators in either the stored key or the queried command (see
/// [`CommandTable::lookup`]); everything else is an exact match.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl CommandTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a command → response mapping.
    ///
    /// The last write wins on a duplicate key. The new mapping is visible
    /// to any subsequent lookup, including from a concurrently running
    /// processing loop.
    pub fn insert(&self, command: impl Into<String>, response: impl Into<String>) {
        let command = command.into();
        let response = response.into();
        debug!("Table entry added: {:?} -> {:?}", command, response);
        self.entries
            .write()
            .expect("command table lock poisoned")
            .insert(command, response);
    }

    /// Look up the response for a command.
    ///
    /// Tries, in order:
    /// 1. the command exactly as received
    /// 2. the command with CRLF appended
    /// 3. the command with all CR and LF characters stripped
    ///
    /// Returns `None` when no stored key matches any of the three forms.
    pub fn lookup(&self, command: &str) -> Option<String> {
        let entries = self.entries.read().expect("command table lock poisoned");

        if let Some(response) = entries.get(command) {
            return Some(response.clone());
        }

        let with_crlf = format!("{command}\r\n");
        if let Some(response) = entries.get(&with_crlf) {
            return Some(response.clone());
        }

        let stripped: String = command.chars().filter(|&c| c != '\r' && c != '\n').collect();
        entries.get(&stripped).cloned()
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("command table lock poisoned")
            .len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
