use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::notification;
use crate::error::AppError;
use crate::models::shared::PageRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone followed the recipient.
    Follow,
    /// Someone replied to the recipient's comment.
    Reply,
    /// A followed user posted a short.
    NewShort,
    /// A report filed by the recipient was resolved or dismissed.
    ReportUpdate,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::Reply => "reply",
            NotificationKind::NewShort => "new_short",
            NotificationKind::ReportUpdate => "report_update",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only unread notifications.
    #[serde(default)]
    pub unread_only: bool,
}

impl NotificationListQuery {
    pub fn into_parts(self) -> Result<(bool, PageRequest), AppError> {
        Ok((self.unread_only, PageRequest::new(self.page, self.limit)?))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i32,
    pub actor_id: Option<i32>,
    #[schema(example = "follow")]
    pub kind: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    #[schema(example = "neo started following you")]
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            actor_id: n.actor_id,
            kind: n.kind,
            entity_type: n.entity_type,
            entity_id: n.entity_id,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    #[schema(example = 3)]
    pub count: u64,
}

/// Result of a bulk update.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AffectedResponse {
    #[schema(example = 5)]
    pub affected: u64,
}
