use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entity::upload;
use crate::error::AppError;
use crate::models::shared::PageRequest;

/// Media family of an upload, taken from the top-level MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Video,
    Audio,
    Image,
}

impl UploadKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.split('/').next()? {
            "video" => Some(UploadKind::Video),
            "audio" => Some(UploadKind::Audio),
            "image" => Some(UploadKind::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Video => "video",
            UploadKind::Audio => "audio",
            UploadKind::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Processed,
    Rejected,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => upload::STATUS_PENDING,
            UploadStatus::Processed => upload::STATUS_PROCESSED,
            UploadStatus::Rejected => upload::STATUS_REJECTED,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// `pending`, `processed` or `rejected`.
    pub status: Option<UploadStatus>,
}

impl UploadListQuery {
    pub fn into_parts(self) -> Result<(Option<UploadStatus>, PageRequest), AppError> {
        Ok((self.status, PageRequest::new(self.page, self.limit)?))
    }
}

/// Path the stored bytes of an upload are served from.
pub fn content_url(id: i32) -> String {
    format!("/api/v1/uploads/{id}/content")
}

/// Optional overrides when turning an audio upload into a track.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToMusicRequest {
    /// Defaults to the upload title, then the filename.
    #[validate(length(min = 1, max = 256, message = "Title must be 1-256 characters"))]
    pub title: Option<String>,
    /// Defaults to the uploader's username.
    #[validate(length(min = 1, max = 256, message = "Artist must be 1-256 characters"))]
    pub artist: Option<String>,
    #[validate(range(min = 0, max = 86400, message = "Duration must be between 0 and 86400 seconds"))]
    #[serde(default)]
    pub duration_seconds: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: i32,
    pub user_id: i32,
    #[schema(example = "theme.mp3")]
    pub filename: String,
    #[schema(example = "audio/mpeg")]
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: i64,
    pub content_hash: String,
    #[schema(example = "audio")]
    pub kind: String,
    #[schema(example = "pending")]
    pub status: String,
    pub title: Option<String>,
    #[schema(example = "/api/v1/uploads/7/content")]
    pub content_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<upload::Model> for UploadResponse {
    fn from(u: upload::Model) -> Self {
        Self {
            content_url: content_url(u.id),
            id: u.id,
            user_id: u.user_id,
            filename: u.filename,
            content_type: u.content_type,
            size: u.size,
            content_hash: u.content_hash,
            kind: u.kind,
            status: u.status,
            title: u.title,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
