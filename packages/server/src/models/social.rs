use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entity::{list_item, user, user_list};
use crate::error::AppError;
use crate::models::shared::double_option;

/// Public identity of a user, embedded in other responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "neo_anderson")]
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<user::Model> for UserSummary {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            avatar_url: u.avatar_url,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i32,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[schema(example = 120)]
    pub follower_count: u64,
    #[schema(example = 80)]
    pub following_count: u64,
    /// Whether the caller follows this user. Absent for anonymous callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatusResponse {
    pub user_id: i32,
    pub following: bool,
}

/// A rating posted by someone the caller follows.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub user: UserSummary,
    #[schema(example = "movie")]
    pub entity_type: String,
    pub entity_id: i32,
    pub value: i32,
    pub review: Option<String>,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[schema(example = "Rainy Sunday")]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    /// Defaults to public.
    #[serde(default = "default_true")]
    pub is_public: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
}

pub fn validate_update_list(payload: &UpdateListRequest) -> Result<(), AppError> {
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

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub item_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListResponse {
    pub fn new(list: user_list::Model, item_count: u64) -> Self {
        Self {
            id: list.id,
            user_id: list.user_id,
            name: list.name,
            description: list.description,
            is_public: list.is_public,
            item_count,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListItemResponse {
    pub entity_type: String,
    pub entity_id: i32,
    pub added_at: DateTime<Utc>,
}

impl From<list_item::Model> for ListItemResponse {
    fn from(i: list_item::Model) -> Self {
        Self {
            entity_type: i.entity_type,
            entity_id: i.entity_id,
            added_at: i.added_at,
        }
    }
}

/// A list with its items, newest first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDetailResponse {
    #[serde(flatten)]
    pub list: ListResponse,
    pub items: Vec<ListItemResponse>,
}
