use std::collections::HashMap;

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;

use crate::entity::{comment, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::comment::{CommentResponse, CreateCommentRequest};
use crate::models::notification::NotificationKind;
use crate::models::shared::{EntityKind, Page, PageRequest};
use crate::services::notification::{NewNotification, NotificationService};
use crate::services::social::load_users;
use crate::services::target;

pub struct CommentService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CommentService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<comment::Model, AppError> {
        comment::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {id} not found")))
    }

    async fn reply_counts(&self, ids: Vec<i32>) -> Result<HashMap<i32, u64>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = comment::Entity::find()
            .select_only()
            .column(comment::Column::ParentId)
            .column_as(Expr::cust("COUNT(*)"), "reply_count")
            .filter(comment::Column::ParentId.is_in(ids))
            .group_by(comment::Column::ParentId)
            .into_tuple::<(i32, i64)>()
            .all(self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, n)| (id, u64::try_from(n).unwrap_or(0)))
            .collect())
    }

    async fn render(&self, rows: Vec<comment::Model>) -> Result<Vec<CommentResponse>, AppError> {
        let counts = self.reply_counts(rows.iter().map(|c| c.id).collect()).await?;
        let users = load_users(self.conn, rows.iter().map(|c| c.user_id)).await?;
        Ok(rows
            .into_iter()
            .map(|c| {
                let author = users.get(&c.user_id).cloned();
                let replies = counts.get(&c.id).copied().unwrap_or(0);
                CommentResponse::new(c, author, replies)
            })
            .collect())
    }

    /// Top-level comments on an item, newest first.
    pub async fn list(
        &self,
        kind: EntityKind,
        entity_id: i32,
        page: PageRequest,
    ) -> Result<Page<CommentResponse>, AppError> {
        target::ensure_exists(self.conn, kind, entity_id).await?;

        let query = comment::Entity::find()
            .filter(comment::Column::EntityType.eq(kind.as_str()))
            .filter(comment::Column::EntityId.eq(entity_id))
            .filter(comment::Column::ParentId.is_null());
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;

        Ok(Page::new(self.render(rows).await?, total, page))
    }

    /// Direct replies to a comment, oldest first.
    pub async fn replies(
        &self,
        parent_id: i32,
        page: PageRequest,
    ) -> Result<Page<CommentResponse>, AppError> {
        self.find(parent_id).await?;

        let query = comment::Entity::find().filter(comment::Column::ParentId.eq(parent_id));
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;

        Ok(Page::new(self.render(rows).await?, total, page))
    }

    /// `body` must already be normalized.
    pub async fn create(
        &self,
        author: &user::Model,
        payload: CreateCommentRequest,
        body: String,
    ) -> Result<CommentResponse, AppError> {
        target::ensure_exists(self.conn, payload.entity_type, payload.entity_id).await?;

        let parent = match payload.parent_id {
            Some(parent_id) => {
                let parent = self.find(parent_id).await?;
                if parent.entity_type != payload.entity_type.as_str()
                    || parent.entity_id != payload.entity_id
                {
                    return Err(AppError::Validation(
                        "parentId must reference a comment on the same item".into(),
                    ));
                }
                Some(parent)
            }
            None => None,
        };

        let now = Utc::now();
        let model = comment::ActiveModel {
            user_id: Set(author.id),
            entity_type: Set(payload.entity_type.as_str().to_string()),
            entity_id: Set(payload.entity_id),
            parent_id: Set(payload.parent_id),
            body: Set(body),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        if let Some(parent) = parent
            && parent.user_id != author.id
        {
            let message = format!("{} replied to your comment", author.username);
            NotificationService::new(self.conn)
                .notify_or_log(
                    &[parent.user_id],
                    NewNotification {
                        kind: NotificationKind::Reply,
                        actor_id: Some(author.id),
                        entity: Some((payload.entity_type.as_str(), payload.entity_id)),
                        message: &message,
                    },
                )
                .await;
        }

        Ok(CommentResponse::new(model, Some(author.clone().into()), 0))
    }

    /// Author only.
    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        body: String,
    ) -> Result<CommentResponse, AppError> {
        let existing = self.find(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::PermissionDenied);
        }
        let mut active: comment::ActiveModel = existing.into();
        active.body = Set(body);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.conn).await?;

        let mut rendered = self.render(vec![updated]).await?;
        rendered
            .pop()
            .ok_or_else(|| AppError::Internal("Comment vanished after update".into()))
    }

    /// Delete a comment and every reply beneath it. Author or admin only.
    /// Returns the number of comments removed.
    pub async fn delete(&self, caller: &AuthUser, id: i32) -> Result<u64, AppError>
    where
        C: TransactionTrait,
    {
        let existing = self.find(id).await?;
        caller
            .require_owner_or_admin(self.conn, existing.user_id)
            .await?;

        let txn = self.conn.begin().await?;
        let mut doomed = vec![id];
        let mut frontier = vec![id];
        while !frontier.is_empty() {
            frontier = comment::Entity::find()
                .select_only()
                .column(comment::Column::Id)
                .filter(comment::Column::ParentId.is_in(frontier))
                .into_tuple::<i32>()
                .all(&txn)
                .await?;
            doomed.extend_from_slice(&frontier);
        }

        let res = comment::Entity::delete_many()
            .filter(comment::Column::Id.is_in(doomed))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(res.rows_affected)
    }
}
