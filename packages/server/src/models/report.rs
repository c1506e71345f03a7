use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entity::report;
use crate::error::AppError;
use crate::models::shared::{EntityKind, PageRequest};

/// Anything a user can flag for moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportTarget {
    Movie,
    Short,
    Music,
    Comment,
    User,
    Playlist,
}

impl ReportTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTarget::Movie => "movie",
            ReportTarget::Short => "short",
            ReportTarget::Music => "music",
            ReportTarget::Comment => "comment",
            ReportTarget::User => "user",
            ReportTarget::Playlist => "playlist",
        }
    }

    /// The catalog kind, for targets that are catalog items.
    pub fn catalog_kind(&self) -> Option<EntityKind> {
        match self {
            ReportTarget::Movie => Some(EntityKind::Movie),
            ReportTarget::Short => Some(EntityKind::Short),
            ReportTarget::Music => Some(EntityKind::Music),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => report::STATUS_OPEN,
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub target_type: ReportTarget,
    pub target_id: i32,
    #[validate(length(min = 1, max = 200, message = "Reason must be 1-200 characters"))]
    #[schema(example = "Spam")]
    pub reason: String,
    #[validate(length(max = 2000, message = "Details must be at most 2000 characters"))]
    pub details: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// `open`, `resolved` or `dismissed`.
    pub status: Option<ReportStatus>,
}

impl ReportListQuery {
    pub fn into_parts(self) -> Result<(Option<ReportStatus>, PageRequest), AppError> {
        Ok((self.status, PageRequest::new(self.page, self.limit)?))
    }
}

/// Closing decision on an open report.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReportRequest {
    /// `resolved` or `dismissed`.
    pub status: ReportStatus,
}

impl ResolveReportRequest {
    pub fn validate_outcome(&self) -> Result<ReportStatus, AppError> {
        match self.status {
            ReportStatus::Open => Err(AppError::Validation(
                "status must be 'resolved' or 'dismissed'".into(),
            )),
            other => Ok(other),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: i32,
    pub reporter_id: i32,
    #[schema(example = "comment")]
    pub target_type: String,
    pub target_id: i32,
    pub reason: String,
    pub details: Option<String>,
    #[schema(example = "open")]
    pub status: String,
    pub resolved_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        Self {
            id: r.id,
            reporter_id: r.reporter_id,
            target_type: r.target_type,
            target_id: r.target_id,
            reason: r.reason,
            details: r.details,
            status: r.status,
            resolved_by: r.resolved_by,
            created_at: r.created_at,
            resolved_at: r.resolved_at,
        }
    }
}
