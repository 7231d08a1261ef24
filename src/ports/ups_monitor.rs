//! UPS Monitor Port - read-only power supply telemetry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::OperationError;

#[async_trait]
pub trait UpsMonitor: Send + Sync {
    async fn ups_status(&self) -> Result<UpsStatus, OperationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSource {
    Mains,
    Battery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsStatus {
    pub model: String,
    pub source: PowerSource,
    pub battery_charge_percent: u8,
    pub runtime_secs: u64,
    pub load_percent: u8,
}
