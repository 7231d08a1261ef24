//! Notification Store Port - host notification inbox.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OperationError, Timestamp};

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn list_notifications(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, OperationError>;

    async fn delete_notification(&self, id: &str) -> Result<(), OperationError>;

    /// Moves a notification to the archive and returns it.
    async fn archive_notification(&self, id: &str) -> Result<Notification, OperationError>;

    /// Deletes every notification, archived or not. Returns how many went.
    async fn delete_all_notifications(&self) -> Result<usize, OperationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Normal,
    Warning,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub subject: String,
    pub importance: Importance,
    pub archived: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub include_archived: bool,
}
