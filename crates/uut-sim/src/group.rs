//! Simulator group supervision
//!
//! A `SimulatorGroup` owns the device simulators of one launch and
//! coordinates group-wide start and graceful stop. Members are fully
//! independent: one member failing to open its port, or wedging during
//! shutdown, never affects the others. The supervisor aggregates counts
//! and status snapshots only — member errors stay with the member.

use tracing::{info, warn};

use uut_protocol::DeviceRole;

use crate::config::{DeviceConfig, GroupConfig};
use crate::device::{DeviceSimulator, DeviceState, DeviceStatus};
use crate::error::SimError;

/// Lifecycle state of a simulator group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Members constructed, none started
    Idle,
    /// Every member has been instructed to start
    Running,
    /// Stop instruction issued to every member
    ShuttingDown,
    /// Terminal: a new group must be constructed to run again
    Stopped,
}

/// A named collection of device simulators started and stopped together.
#[derive(Debug)]
pub struct SimulatorGroup {
    members: Vec<DeviceSimulator>,
    state: GroupState,
}

impl SimulatorGroup {
    /// Build a main-plus-secondaries group from a validated configuration.
    ///
    /// Validation failures happen before any simulator exists, so a bad
    /// configuration has no side effects.
    pub fn from_config(config: &GroupConfig) -> Result<Self, SimError> {
        config.validate()?;
        let members = config
            .device_configs()
            .into_iter()
            .map(DeviceSimulator::new)
            .collect();
        Ok(Self {
            members,
            state: GroupState::Idle,
        })
    }

    /// Build a group holding a single generic RS-232 device.
    pub fn single(port_name: impl Into<String>, baud_rate: u32) -> Self {
        let member = DeviceSimulator::new(DeviceConfig {
            port_name: port_name.into(),
            baud_rate,
            role: DeviceRole::Generic,
        });
        Self {
            members: vec![member],
            state: GroupState::Idle,
        }
    }

    /// Current group state
    pub fn state(&self) -> GroupState {
        self.state
    }

    /// Number of members (started or not)
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Snapshot of every member
    pub fn statuses(&self) -> Vec<DeviceStatus> {
        self.members.iter().map(DeviceSimulator::status).collect()
    }

    /// The group's members
    pub fn members(&self) -> &[DeviceSimulator] {
        &self.members
    }

    /// Start every member independently.
    ///
    /// A member that cannot acquire its transport is logged and left in
    /// Failed; the remaining members still start. Returns the number of
    /// members that reached Running.
    pub fn start_all(&mut self) -> usize {
        if self.state != GroupState::Idle {
            warn!("start_all called on a group in state {:?}", self.state);
            return 0;
        }
        self.state = GroupState::Running;

        let mut started = 0;
        for member in &mut self.members {
            match member.start() {
                Ok(()) => started += 1,
                Err(e) => {
                    warn!("Simulator on {} not started: {}", member.port_name(), e);
                }
            }
        }

        info!("Started {}/{} UUT simulators", started, self.members.len());
        started
    }

    /// Stop every member, bounded per member.
    ///
    /// Idempotent. Each member's stop waits at most its own bound, so a
    /// wedged member cannot keep the group shutdown from completing.
    pub async fn stop_all(&mut self) {
        if self.state == GroupState::Stopped {
            return;
        }
        self.state = GroupState::ShuttingDown;
        info!("Stopping {} UUT simulators", self.members.len());

        for member in &mut self.members {
            member.stop().await;
        }

        self.state = GroupState::Stopped;
        let stopped = self
            .members
            .iter()
            .filter(|m| m.state() == DeviceState::Stopped)
            .count();
        info!(
            "Simulator group shut down ({}/{} members stopped)",
            stopped,
            self.members.len()
        );
    }
}
