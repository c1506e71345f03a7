use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entity::playlist;
use crate::error::AppError;
use crate::models::music::MusicResponse;
use crate::models::shared::double_option;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[schema(example = "Late night coding")]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    /// Defaults to private.
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
}

pub fn validate_update_playlist(payload: &UpdatePlaylistRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        let len = name.trim().chars().count();
        if len == 0 || len > 100 {
            return Err(AppError::Validation("Name must be 1-100 characters".into()));
        }
    }
    if let Some(Some(desc)) = &payload.description
        && desc.chars().count() > 500
    {
        return Err(AppError::Validation(
            "Description must be at most 500 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackRequest {
    #[validate(range(min = 1, message = "musicId must be positive"))]
    #[schema(example = 7)]
    pub music_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub track_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaylistResponse {
    pub fn new(p: playlist::Model, track_count: u64) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            description: p.description,
            is_public: p.is_public,
            track_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrackResponse {
    /// 1-based order within the playlist.
    pub position: i32,
    pub added_at: DateTime<Utc>,
    pub track: MusicResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetailResponse {
    #[serde(flatten)]
    pub playlist: PlaylistResponse,
    /// Ordered by position.
    pub tracks: Vec<PlaylistTrackResponse>,
}
