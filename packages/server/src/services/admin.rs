use chrono::Utc;
use sea_orm::*;

use crate::entity::{comment, movie, music, report, short, upload, user};
use crate::error::AppError;
use crate::models::admin::{Role, StatsResponse, UpdateUserRequest};
use crate::models::shared::{Page, PageRequest, contains_pattern};
use crate::services::search::lower_like;

pub struct AdminService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AdminService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn stats(&self) -> Result<StatsResponse, AppError> {
        Ok(StatsResponse {
            users: user::Entity::find().count(self.conn).await?,
            movies: movie::Entity::find().count(self.conn).await?,
            shorts: short::Entity::find().count(self.conn).await?,
            music: music::Entity::find().count(self.conn).await?,
            comments: comment::Entity::find().count(self.conn).await?,
            open_reports: report::Entity::find()
                .filter(report::Column::Status.eq(report::STATUS_OPEN))
                .count(self.conn)
                .await?,
            pending_uploads: upload::Entity::find()
                .filter(upload::Column::Status.eq(upload::STATUS_PENDING))
                .count(self.conn)
                .await?,
        })
    }

    pub async fn list_users(
        &self,
        term: Option<String>,
        page: PageRequest,
    ) -> Result<Page<user::Model>, AppError> {
        let mut query = user::Entity::find();
        if let Some(term) = term {
            let pattern = contains_pattern(&term);
            query = query.filter(
                Condition::any()
                    .add(lower_like(user::Column::Username, &pattern))
                    .add(lower_like(user::Column::Email, &pattern))
                    .add(lower_like(user::Column::DisplayName, &pattern)),
            );
        }
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_asc(user::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(rows, total, page))
    }

    /// Change a user's role or ban flag. Admins cannot ban or demote themselves.
    pub async fn update_user(
        &self,
        admin: &user::Model,
        id: i32,
        payload: UpdateUserRequest,
    ) -> Result<user::Model, AppError> {
        payload.validate_non_empty()?;
        if id == admin.id {
            if payload.is_banned == Some(true) {
                return Err(AppError::Validation("You cannot ban yourself".into()));
            }
            if payload.role == Some(Role::User) {
                return Err(AppError::Validation("You cannot remove your own admin role".into()));
            }
        }

        let existing = user::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(role) = payload.role {
            active.role = Set(role.as_str().to_string());
        }
        if let Some(is_banned) = payload.is_banned {
            active.is_banned = Set(is_banned);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.conn).await?;

        tracing::info!(
            admin_id = admin.id,
            user_id = updated.id,
            role = %updated.role,
            is_banned = updated.is_banned,
            "User updated by admin"
        );
        Ok(updated)
    }
}
