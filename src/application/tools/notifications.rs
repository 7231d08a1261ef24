//! `notifications` tool.
//!
//! `list` is informational. `delete`, `archive` and `delete_all` change the
//! inbox and require confirmation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::{OperationError, ValidationError};
use crate::domain::tools::ToolParameters;
use crate::ports::{
    ConfirmationPrompt, GatedTool, NotificationFilter, NotificationStore, OperationContext,
    ToolOutput,
};

pub const NOTIFICATIONS: &str = "notifications";

const ACTIONS: [&str; 4] = ["list", "delete", "archive", "delete_all"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationRequest {
    List(NotificationFilter),
    Delete(String),
    Archive(String),
    DeleteAll,
}

pub struct NotificationsTool {
    store: Arc<dyn NotificationStore>,
}

impl NotificationsTool {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GatedTool for NotificationsTool {
    type Request = NotificationRequest;

    fn name(&self) -> &'static str {
        NOTIFICATIONS
    }

    fn validate(&self, params: &ToolParameters) -> Result<NotificationRequest, ValidationError> {
        let action = params.required_str("action")?;
        let id = || params.required_str("notification_id").map(str::to_string);
        match action {
            "list" => Ok(NotificationRequest::List(NotificationFilter {
                include_archived: params.optional_bool("include_archived")?.unwrap_or(false),
            })),
            "delete" => Ok(NotificationRequest::Delete(id()?)),
            "archive" => Ok(NotificationRequest::Archive(id()?)),
            "delete_all" => Ok(NotificationRequest::DeleteAll),
            other => Err(ValidationError::invalid_choice("action", other, &ACTIONS)),
        }
    }

    fn is_destructive(&self, request: &NotificationRequest) -> bool {
        !matches!(request, NotificationRequest::List(_))
    }

    fn describe_for_prompt(&self, request: &NotificationRequest) -> ConfirmationPrompt {
        match request {
            NotificationRequest::Delete(id) => {
                ConfirmationPrompt::new(format!("notif-{id}"), "Permanently deletes the notification.")
            }
            NotificationRequest::Archive(id) => {
                ConfirmationPrompt::new(format!("notif-{id}"), "Moves the notification to the archive.")
            }
            NotificationRequest::DeleteAll => ConfirmationPrompt::new(
                "notifications: all",
                "Permanently deletes every notification, archived ones included.",
            ),
            NotificationRequest::List(_) => {
                ConfirmationPrompt::new("notifications", "Lists notifications.")
            }
        }
    }

    async fn execute(
        &self,
        request: &NotificationRequest,
        _ctx: &OperationContext,
    ) -> Result<ToolOutput, OperationError> {
        match request {
            NotificationRequest::List(filter) => {
                let notifications = self.store.list_notifications(filter).await?;
                let message = format!("{} notification(s).", notifications.len());
                Ok(ToolOutput::new(message).with_data(json!(notifications)))
            }
            NotificationRequest::Delete(id) => {
                self.store.delete_notification(id).await?;
                Ok(ToolOutput::new(format!("Deleted notification {id}.")))
            }
            NotificationRequest::Archive(id) => {
                let notification = self.store.archive_notification(id).await?;
                Ok(ToolOutput::new(format!("Archived notification {id}."))
                    .with_data(json!(notification)))
            }
            NotificationRequest::DeleteAll => {
                let removed = self.store.delete_all_notifications().await?;
                Ok(ToolOutput::new(format!("Deleted {removed} notification(s).")))
            }
        }
    }
}
