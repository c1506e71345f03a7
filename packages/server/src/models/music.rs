use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entity::music;
use crate::error::AppError;
use crate::models::engagement::RatingSummary;
use crate::models::movie::validate_optional_year;
use crate::models::shared::{PageRequest, double_option};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MusicSort {
    #[default]
    Newest,
    Oldest,
    Title,
    /// Most played first.
    Popular,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MusicListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Case-insensitive genre match.
    pub genre: Option<String>,
    /// Case-insensitive exact artist match.
    #[param(example = "Daft Punk")]
    pub artist: Option<String>,
    pub year: Option<i32>,
    /// `newest` (default), `oldest`, `title` or `popular`.
    pub sort: Option<MusicSort>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicFilter {
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub sort: MusicSort,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl MusicListQuery {
    pub fn into_parts(self) -> Result<(MusicFilter, PageRequest), AppError> {
        let page = PageRequest::new(self.page, self.limit)?;
        validate_optional_year(self.year)?;
        Ok((
            MusicFilter {
                genre: non_blank(self.genre),
                artist: non_blank(self.artist),
                year: self.year,
                sort: self.sort.unwrap_or_default(),
            },
            page,
        ))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMusicRequest {
    #[validate(length(min = 1, max = 256, message = "Title must be 1-256 characters"))]
    #[schema(example = "Harder, Better, Faster, Stronger")]
    pub title: String,
    #[validate(length(min = 1, max = 256, message = "Artist must be 1-256 characters"))]
    #[schema(example = "Daft Punk")]
    pub artist: String,
    #[validate(length(max = 256, message = "Album must be at most 256 characters"))]
    pub album: Option<String>,
    #[validate(length(max = 10, message = "At most 10 genres"))]
    #[serde(default)]
    pub genres: Vec<String>,
    #[validate(range(min = 1888, max = 2100, message = "Year must be between 1888 and 2100"))]
    pub year: Option<i32>,
    #[validate(range(min = 1, max = 86400, message = "Duration must be 1-86400 seconds"))]
    #[schema(example = 224)]
    pub duration_seconds: i32,
    #[validate(length(min = 1, max = 2048, message = "audioUrl must be 1-2048 characters"))]
    pub audio_url: String,
    #[validate(url(message = "coverUrl must be a valid URL"))]
    pub cover_url: Option<String>,
}

/// PATCH body for a track.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMusicRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub album: Option<Option<String>>,
    pub genres: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub year: Option<Option<i32>>,
    pub duration_seconds: Option<i32>,
    pub audio_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cover_url: Option<Option<String>>,
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len == 0 || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(())
}

pub fn validate_update_music(payload: &UpdateMusicRequest) -> Result<(), AppError> {
    if let Some(title) = &payload.title {
        check_len("Title", title, 256)?;
    }
    if let Some(artist) = &payload.artist {
        check_len("Artist", artist, 256)?;
    }
    if let Some(Some(album)) = &payload.album {
        check_len("Album", album, 256)?;
    }
    if let Some(genres) = &payload.genres
        && genres.len() > 10
    {
        return Err(AppError::Validation("At most 10 genres".into()));
    }
    if let Some(year) = payload.year {
        validate_optional_year(year)?;
    }
    if let Some(d) = payload.duration_seconds
        && !(1..=86400).contains(&d)
    {
        return Err(AppError::Validation(
            "Duration must be 1-86400 seconds".into(),
        ));
    }
    if let Some(url) = &payload.audio_url {
        check_len("audioUrl", url, 2048)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MusicResponse {
    pub id: i32,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub duration_seconds: i32,
    pub audio_url: String,
    pub cover_url: Option<String>,
    pub play_count: i64,
    pub uploaded_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<music::Model> for MusicResponse {
    fn from(m: music::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            artist: m.artist,
            album: m.album,
            genres: m.genres,
            year: m.year,
            duration_seconds: m.duration_seconds,
            audio_url: m.audio_url,
            cover_url: m.cover_url,
            play_count: m.play_count,
            uploaded_by: m.uploaded_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MusicDetailResponse {
    #[serde(flatten)]
    pub track: MusicResponse,
    pub rating: RatingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

/// Returned after a play is recorded.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayCountResponse {
    pub id: i32,
    #[schema(example = 1337)]
    pub play_count: i64,
}
