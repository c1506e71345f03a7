use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entity::{favorite, history, rating};
use crate::error::AppError;
use crate::models::movie::MovieResponse;
use crate::models::shared::{EntityKind, PageRequest};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Average and count of ratings for one catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean rating rounded to two decimals, 0 when unrated.
    #[schema(example = 4.25)]
    pub average: f64,
    #[schema(example = 12)]
    pub count: u64,
}

impl RatingSummary {
    pub fn new(average: Option<f64>, count: u64) -> Self {
        let average = match (average, count) {
            (Some(avg), c) if c > 0 => (avg * 100.0).round() / 100.0,
            _ => 0.0,
        };
        Self { average, count }
    }
}

/// Body for adding a favorite.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityRefRequest {
    pub entity_type: EntityKind,
    #[validate(range(min = 1, message = "entityId must be positive"))]
    #[schema(example = 1)]
    pub entity_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub entity_type: EntityKind,
    #[validate(range(min = 1, message = "entityId must be positive"))]
    pub entity_id: i32,
    /// 1 to 5.
    #[schema(example = 4)]
    pub value: i32,
    #[validate(length(max = 2000, message = "Review must be at most 2000 characters"))]
    pub review: Option<String>,
}

pub fn validate_rating_value(value: i32) -> Result<(), AppError> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Rating value must be between {MIN_RATING} and {MAX_RATING}"
        )))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistRequest {
    #[validate(range(min = 1, message = "movieId must be positive"))]
    #[schema(example = 1)]
    pub movie_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub entity_type: EntityKind,
    #[validate(range(min = 1, message = "entityId must be positive"))]
    pub entity_id: i32,
    /// Playback position in seconds.
    #[validate(range(min = 0, message = "progress must be >= 0"))]
    #[schema(example = 754)]
    pub progress: i32,
    /// Total length in seconds.
    #[validate(range(min = 0, message = "duration must be >= 0"))]
    #[schema(example = 8160)]
    pub duration: i32,
}

/// Query parameters for listing favorites.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FavoriteListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only favorites of this kind.
    pub entity_type: Option<EntityKind>,
}

impl FavoriteListQuery {
    pub fn into_parts(self) -> Result<(Option<EntityKind>, PageRequest), AppError> {
        Ok((self.entity_type, PageRequest::new(self.page, self.limit)?))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    #[schema(example = "movie")]
    pub entity_type: String,
    pub entity_id: i32,
    pub value: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<rating::Model> for RatingResponse {
    fn from(r: rating::Model) -> Self {
        Self {
            entity_type: r.entity_type,
            entity_id: r.entity_id,
            value: r.value,
            review: r.review,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    #[schema(example = "music")]
    pub entity_type: String,
    pub entity_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<favorite::Model> for FavoriteResponse {
    fn from(f: favorite::Model) -> Self {
        Self {
            entity_type: f.entity_type,
            entity_id: f.entity_id,
            created_at: f.created_at,
        }
    }
}

/// A watchlist row with the movie it points at.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntryResponse {
    pub movie_id: i32,
    pub added_at: DateTime<Utc>,
    pub movie: Option<MovieResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub entity_type: String,
    pub entity_id: i32,
    pub progress: i32,
    pub duration: i32,
    pub watched_at: DateTime<Utc>,
}

impl From<history::Model> for HistoryResponse {
    fn from(h: history::Model) -> Self {
        Self {
            entity_type: h.entity_type,
            entity_id: h.entity_id,
            progress: h.progress,
            duration: h.duration,
            watched_at: h.watched_at,
        }
    }
}
