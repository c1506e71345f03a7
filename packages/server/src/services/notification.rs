use chrono::Utc;
use sea_orm::*;

use crate::entity::notification;
use crate::error::AppError;
use crate::models::notification::NotificationKind;
use crate::models::shared::{Page, PageRequest};

/// What a notification is about.
pub struct NewNotification<'m> {
    pub kind: NotificationKind,
    pub actor_id: Option<i32>,
    pub entity: Option<(&'static str, i32)>,
    pub message: &'m str,
}

pub struct NotificationService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> NotificationService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Insert one notification per recipient.
    pub async fn notify(
        &self,
        recipients: &[i32],
        note: NewNotification<'_>,
    ) -> Result<(), AppError> {
        if recipients.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let rows = recipients.iter().map(|&user_id| notification::ActiveModel {
            user_id: Set(user_id),
            actor_id: Set(note.actor_id),
            kind: Set(note.kind.as_str().to_string()),
            entity_type: Set(note.entity.map(|(t, _)| t.to_string())),
            entity_id: Set(note.entity.map(|(_, id)| id)),
            message: Set(note.message.to_string()),
            is_read: Set(false),
            created_at: Set(now),
            ..Default::default()
        });
        notification::Entity::insert_many(rows)
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// Like [`notify`](Self::notify), but a failure is only logged.
    pub async fn notify_or_log(&self, recipients: &[i32], note: NewNotification<'_>) {
        let kind = note.kind;
        if let Err(e) = self.notify(recipients, note).await {
            tracing::warn!(error = %e, kind = kind.as_str(), "Failed to create notification");
        }
    }

    pub async fn list(
        &self,
        user_id: i32,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<notification::Model>, AppError> {
        let mut query =
            notification::Entity::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }
        let total = query.clone().count(self.conn).await?;
        let items = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn unread_count(&self, user_id: i32) -> Result<u64, AppError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.conn)
            .await?)
    }

    /// Another user's notification is reported as missing.
    async fn find_own(&self, user_id: i32, id: i32) -> Result<notification::Model, AppError> {
        notification::Entity::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {id} not found")))
    }

    pub async fn mark_read(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<notification::Model, AppError> {
        let existing = self.find_own(user_id, id).await?;
        if existing.is_read {
            return Ok(existing);
        }
        let mut active: notification::ActiveModel = existing.into();
        active.is_read = Set(true);
        Ok(active.update(self.conn).await?)
    }

    pub async fn mark_all_read(&self, user_id: i32) -> Result<u64, AppError> {
        let res = notification::Entity::update_many()
            .col_expr(
                notification::Column::IsRead,
                sea_orm::sea_query::Expr::value(true),
            )
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete(&self, user_id: i32, id: i32) -> Result<(), AppError> {
        let existing = self.find_own(user_id, id).await?;
        notification::Entity::delete_by_id(existing.id)
            .exec(self.conn)
            .await?;
        Ok(())
    }
}
