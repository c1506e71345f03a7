use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::user;
use crate::error::AppError;
use crate::models::search::MAX_QUERY_CHARS;
use crate::models::shared::PageRequest;

/// Dashboard counters.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub users: u64,
    pub movies: u64,
    pub shorts: u64,
    pub music: u64,
    pub comments: u64,
    pub open_reports: u64,
    pub pending_uploads: u64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminUserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Substring of username, email or display name.
    #[param(example = "neo")]
    pub q: Option<String>,
}

impl AdminUserListQuery {
    pub fn into_parts(self) -> Result<(Option<String>, PageRequest), AppError> {
        let page = PageRequest::new(self.page, self.limit)?;
        let term = self
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        if let Some(term) = &term
            && term.chars().count() > MAX_QUERY_CHARS
        {
            return Err(AppError::Validation(format!(
                "q must be at most {MAX_QUERY_CHARS} characters"
            )));
        }
        Ok((term, page))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => user::ROLE_USER,
            Role::Admin => user::ROLE_ADMIN,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub is_banned: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate_non_empty(&self) -> Result<(), AppError> {
        if self.role.is_none() && self.is_banned.is_none() {
            return Err(AppError::Validation(
                "At least one of role or isBanned is required".into(),
            ));
        }
        Ok(())
    }
}

/// Account as seen by moderators.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    #[schema(example = "user")]
    pub role: String,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for AdminUserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            display_name: u.display_name,
            role: u.role,
            is_banned: u.is_banned,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
