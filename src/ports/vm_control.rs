//! VM Control Port - virtual machine lifecycle.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::OperationError;

/// Port for the hypervisor.
#[async_trait]
pub trait VmControl: Send + Sync {
    async fn list_vms(&self) -> Result<Vec<VmInfo>, OperationError>;

    /// Applies a power action. Fails with `NotFound` for unknown ids and
    /// `InvalidState` when the action does not apply to the current state.
    async fn control_vm(&self, vm_id: &str, action: VmAction) -> Result<VmInfo, OperationError>;

    /// Creates a stopped VM.
    async fn create_vm(&self, spec: &VmSpec) -> Result<VmInfo, OperationError>;

    /// Deletes a VM and its disks.
    async fn delete_vm(&self, vm_id: &str) -> Result<(), OperationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    Running,
    Paused,
    Stopped,
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmInfo {
    pub id: String,
    pub name: String,
    pub state: VmState,
    pub memory_mib: u64,
    pub vcpus: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmAction {
    Start,
    Stop,
    ForceStop,
    Pause,
    Resume,
    Reboot,
}

impl VmAction {
    pub const ALL: [VmAction; 6] = [
        Self::Start,
        Self::Stop,
        Self::ForceStop,
        Self::Pause,
        Self::Resume,
        Self::Reboot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::ForceStop => "force_stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reboot => "reboot",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == value)
    }

    /// Returns true for actions that interrupt a running guest.
    pub fn interrupts_guest(&self) -> bool {
        matches!(self, Self::Stop | Self::ForceStop | Self::Reboot)
    }
}

impl fmt::Display for VmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a new VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSpec {
    pub name: String,
    pub memory_mib: u64,
    pub vcpus: u32,
}
