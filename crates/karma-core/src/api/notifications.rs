//! Push notifications addressed to a single user.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiClient;
use crate::error::AdminError;

const SEND_NOTIFICATION_PATH: &str = "/v1/admin/notification/send";

pub const DEFAULT_EVENT_TYPE: &str = "NEW_BOOKING";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: String,
    pub timestamp: String,
    pub name: String,
    pub description: String,
    pub media: Vec<String>,
    pub event_type: String,
    pub notified_to: String,
    pub triggered_by: String,
    pub read: bool,
    pub reference_id: String,
    pub reference_table: String,
}

impl Notification {
    /// Builds an unread admin notification for `user_id`, stamped now.
    pub fn for_user(
        user_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            notification_id: generate_notification_id(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            name: name.into(),
            description: description.into(),
            media: Vec::new(),
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            reference_id: user_id.clone(),
            notified_to: user_id,
            triggered_by: "admin".to_string(),
            read: false,
            reference_table: "providers".to_string(),
        }
    }

    #[must_use]
    pub fn with_media(mut self, url: impl Into<String>) -> Self {
        self.media = vec![url.into()];
        self
    }

    #[must_use]
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }
}

/// `ntf_` followed by 13 lowercase alphanumerics.
pub fn generate_notification_id() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    format!("ntf_{}", &simple[..13])
}

/// Sends a notification.
///
/// # Errors
/// `Validation` when the recipient, title or description is empty, otherwise
/// `Network`, `Service` or `Decode`.
pub async fn send(api: &ApiClient, notification: &Notification) -> Result<(), AdminError> {
    if notification.notified_to.trim().is_empty() {
        return Err(AdminError::validation("A recipient user id is required"));
    }
    if notification.name.trim().is_empty() || notification.description.trim().is_empty() {
        return Err(AdminError::validation(
            "Notification title and description are required",
        ));
    }

    api.post_ack(
        SEND_NOTIFICATION_PATH,
        notification,
        "Failed to send notification",
    )
    .await?;
    info!(
        notification_id = %notification.notification_id,
        user_id = %notification.notified_to,
        "notification sent"
    );
    Ok(())
}
