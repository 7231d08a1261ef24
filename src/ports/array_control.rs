//! Array Control Port - storage array lifecycle and parity checks.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::OperationError;

/// Port for the storage array control plane.
#[async_trait]
pub trait ArrayControl: Send + Sync {
    /// Starts the array. Fails with `InvalidState` if it is already started.
    async fn start_array(&self) -> Result<ArrayState, OperationError>;

    /// Stops the array. Fails with `InvalidState` if it is already stopped.
    async fn stop_array(&self) -> Result<ArrayState, OperationError>;

    /// Returns the current array state.
    async fn array_state(&self) -> Result<ArrayState, OperationError>;

    /// Starts, pauses, resumes or cancels a parity check.
    async fn parity_check(&self, action: ParityAction) -> Result<ParityStatus, OperationError>;

    /// Returns parity check progress.
    async fn parity_status(&self) -> Result<ParityStatus, OperationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayState {
    Started,
    Stopped,
}

impl fmt::Display for ArrayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("started"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// Parity operations that change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParityAction {
    /// Read-only check
    Start,
    /// Check that writes corrections to parity
    StartCorrecting,
    Pause,
    Resume,
    Cancel,
}

impl ParityAction {
    pub const ALL: [ParityAction; 5] = [
        Self::Start,
        Self::StartCorrecting,
        Self::Pause,
        Self::Resume,
        Self::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::StartCorrecting => "start_correcting",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Cancel => "cancel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == value)
    }
}

impl fmt::Display for ParityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parity check progress snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParityStatus {
    pub running: bool,
    pub paused: bool,
    pub correcting: bool,
    pub progress_percent: u8,
    pub errors_found: u64,
}

impl ParityStatus {
    /// Status with no check in progress.
    pub fn idle() -> Self {
        Self {
            running: false,
            paused: false,
            correcting: false,
            progress_percent: 0,
            errors_found: 0,
        }
    }
}
