use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entity::short;
use crate::error::AppError;
use crate::models::engagement::RatingSummary;
use crate::models::shared::PageRequest;
use crate::models::social::UserSummary;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ShortListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only shorts posted by this user.
    pub user_id: Option<i32>,
}

impl ShortListQuery {
    pub fn into_parts(self) -> Result<(Option<i32>, PageRequest), AppError> {
        Ok((self.user_id, PageRequest::new(self.page, self.limit)?))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[schema(example = "Bullet time in 30 seconds")]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 2048, message = "videoUrl must be 1-2048 characters"))]
    pub video_url: String,
    #[validate(url(message = "thumbnailUrl must be a valid URL"))]
    pub thumbnail_url: Option<String>,
    /// 1 to 600 seconds.
    #[validate(range(min = 1, max = 600, message = "Duration must be 1-600 seconds"))]
    #[schema(example = 30)]
    pub duration_seconds: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShortResponse {
    pub id: i32,
    pub user_id: i32,
    /// Absent if the author's account is gone.
    pub author: Option<UserSummary>,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ShortResponse {
    pub fn new(s: short::Model, author: Option<UserSummary>) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            author,
            title: s.title,
            description: s.description,
            video_url: s.video_url,
            thumbnail_url: s.thumbnail_url,
            duration_seconds: s.duration_seconds,
            view_count: s.view_count,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShortDetailResponse {
    #[serde(flatten)]
    pub short: ShortResponse,
    pub rating: RatingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}
