use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::comment;
use crate::error::AppError;
use crate::models::shared::{EntityKind, PageRequest};
use crate::models::social::UserSummary;

pub const MAX_COMMENT_CHARS: usize = 2000;

/// Top-level comments on one catalog item.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CommentListQuery {
    pub entity_type: EntityKind,
    pub entity_id: i32,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl CommentListQuery {
    pub fn into_parts(self) -> Result<(EntityKind, i32, PageRequest), AppError> {
        let page = PageRequest::new(self.page, self.limit)?;
        Ok((self.entity_type, self.entity_id, page))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub entity_type: EntityKind,
    pub entity_id: i32,
    /// Comment being replied to. Must be on the same item.
    pub parent_id: Option<i32>,
    #[schema(example = "The lobby scene still holds up.")]
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub body: String,
}

/// Trim and length-check a comment body.
pub fn normalize_body(body: &str) -> Result<String, AppError> {
    let body = body.trim();
    let len = body.chars().count();
    if len == 0 || len > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "Comment must be 1-{MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(body.to_string())
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i32,
    pub user_id: i32,
    pub author: Option<UserSummary>,
    #[schema(example = "movie")]
    pub entity_type: String,
    pub entity_id: i32,
    pub parent_id: Option<i32>,
    pub body: String,
    /// Direct replies only.
    pub reply_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(c: comment::Model, author: Option<UserSummary>, reply_count: u64) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            author,
            entity_type: c.entity_type,
            entity_id: c.entity_id,
            parent_id: c.parent_id,
            body: c.body,
            reply_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
