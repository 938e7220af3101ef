//! Launch configuration
//!
//! A group launch names one main port plus exactly three secondary ports
//! (mapped to indices 1–3) sharing a baud rate. Validation happens before
//! any simulator is constructed, so a malformed configuration has zero
//! side effects — no port is ever opened.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use uut_protocol::DeviceRole;

use crate::error::SimError;

/// Number of secondary ports a group launch requires
pub const SECONDARY_PORT_COUNT: usize = 3;

/// Configuration for a single simulated device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Serial port the simulator binds to (e.g. `COM6`, `/dev/ttyUSB0`)
    pub port_name: String,
    /// Baud rate; framing is fixed at 8N1
    pub baud_rate: u32,
    /// Vocabulary this device speaks
    pub role: DeviceRole,
}

/// Configuration for a main-plus-secondaries simulator group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Port of the main UUT
    pub main_port: String,
    /// Ports of the secondary devices, in index order (1–3)
    pub secondary_ports: Vec<String>,
    /// Baud rate shared by every member
    pub baud_rate: u32,
}

impl GroupConfig {
    /// Check the configuration without opening anything.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.secondary_ports.len() != SECONDARY_PORT_COUNT {
            return Err(SimError::InvalidConfig(format!(
                "exactly {} secondary ports required (for ports 1-{}), got {}",
                SECONDARY_PORT_COUNT,
                SECONDARY_PORT_COUNT,
                self.secondary_ports.len()
            )));
        }

        if self.baud_rate == 0 {
            return Err(SimError::InvalidConfig(
                "baud rate must be positive".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for port in std::iter::once(&self.main_port).chain(&self.secondary_ports) {
            if !seen.insert(port.as_str()) {
                return Err(SimError::InvalidConfig(format!(
                    "port {port} assigned to more than one simulator"
                )));
            }
        }

        Ok(())
    }

    /// Expand into one device configuration per member, main first.
    pub fn device_configs(&self) -> Vec<DeviceConfig> {
        let mut configs = vec![DeviceConfig {
            port_name: self.main_port.clone(),
            baud_rate: self.baud_rate,
            role: DeviceRole::Main,
        }];

        for (i, port) in self.secondary_ports.iter().enumerate() {
            configs.push(DeviceConfig {
                port_name: port.clone(),
                baud_rate: self.baud_rate,
                role: DeviceRole::Port(i as u8 + 1),
            });
        }

        configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ports: &[&str]) -> GroupConfig {
        GroupConfig {
            main_port: "COM6".to_string(),
            secondary_ports: ports.iter().map(|p| p.to_string()).collect(),
            baud_rate: 9600,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config(&["COM11", "COM12", "COM13"]).validate().is_ok());
    }

    #[test]
    fn test_wrong_secondary_count_rejected() {
        let err = config(&["COM11", "COM12"]).validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
        assert!(err.to_string().contains("exactly 3 secondary ports"));
    }

    #[test]
    fn test_zero_baud_rejected() {
        let mut cfg = config(&["COM11", "COM12", "COM13"]);
        cfg.baud_rate = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let err = config(&["COM11", "COM6", "COM13"]).validate().unwrap_err();
        assert!(err.to_string().contains("COM6"));
    }

    #[test]
    fn test_device_configs_assign_indices_in_order() {
        let configs = config(&["COM11", "COM12", "COM13"]).device_configs();
        assert_eq!(configs.len(), 4);
        assert_eq!(configs[0].role, DeviceRole::Main);
        assert_eq!(configs[0].port_name, "COM6");
        assert_eq!(configs[1].role, DeviceRole::Port(1));
        assert_eq!(configs[2].role, DeviceRole::Port(2));
        assert_eq!(configs[3].role, DeviceRole::Port(3));
        assert_eq!(configs[3].port_name, "COM13");
    }
}
