use chrono::Utc;
use sea_orm::*;

use crate::entity::{follow, short, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::notification::NotificationKind;
use crate::models::shared::{EntityKind, Page, PageRequest};
use crate::models::short::{CreateShortRequest, ShortDetailResponse, ShortResponse};
use crate::services::catalog;
use crate::services::engagement::EngagementService;
use crate::services::notification::{NewNotification, NotificationService};
use crate::services::social::load_users;
use crate::services::target;

pub struct ShortService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ShortService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Newest first.
    pub async fn list(
        &self,
        user_id: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<ShortResponse>, AppError> {
        let mut query = short::Entity::find();
        if let Some(user_id) = user_id {
            query = query.filter(short::Column::UserId.eq(user_id));
        }
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(short::Column::CreatedAt)
            .order_by_desc(short::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;

        let users = load_users(self.conn, rows.iter().map(|s| s.user_id)).await?;
        let items = rows
            .into_iter()
            .map(|s| {
                let author = users.get(&s.user_id).cloned();
                ShortResponse::new(s, author)
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    pub async fn find(&self, id: i32) -> Result<short::Model, AppError> {
        short::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Short {id} not found")))
    }

    /// Count a view and return the short.
    pub async fn view(
        &self,
        id: i32,
        caller: Option<i32>,
    ) -> Result<ShortDetailResponse, AppError> {
        let res = short::Entity::update_many()
            .col_expr(short::Column::ViewCount, catalog::increment("view_count"))
            .filter(short::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Short {id} not found")));
        }

        let short = self.find(id).await?;
        let author = user::Entity::find_by_id(short.user_id)
            .one(self.conn)
            .await?
            .map(Into::into);
        let engagement = EngagementService::new(self.conn);
        let rating = engagement.rating_summary(EntityKind::Short, id).await?;
        let is_favorite = match caller {
            Some(user_id) => Some(
                engagement
                    .caller_engagement(user_id, EntityKind::Short, id)
                    .await?
                    .is_favorite,
            ),
            None => None,
        };

        Ok(ShortDetailResponse {
            short: ShortResponse::new(short, author),
            rating,
            is_favorite,
        })
    }

    /// Post a short and notify the author's followers. Notification failures
    /// are logged and do not undo the post.
    pub async fn create(
        &self,
        author: user::Model,
        payload: CreateShortRequest,
    ) -> Result<ShortResponse, AppError> {
        let model = short::ActiveModel {
            user_id: Set(author.id),
            title: Set(payload.title.trim().to_string()),
            description: Set(payload.description),
            video_url: Set(payload.video_url),
            thumbnail_url: Set(payload.thumbnail_url),
            duration_seconds: Set(payload.duration_seconds),
            view_count: Set(0),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        let followers: Vec<i32> = follow::Entity::find()
            .select_only()
            .column(follow::Column::FollowerId)
            .filter(follow::Column::FollowingId.eq(author.id))
            .into_tuple::<i32>()
            .all(self.conn)
            .await?;
        let message = format!("{} posted a new short: {}", author.username, model.title);
        NotificationService::new(self.conn)
            .notify_or_log(
                &followers,
                NewNotification {
                    kind: NotificationKind::NewShort,
                    actor_id: Some(author.id),
                    entity: Some((EntityKind::Short.as_str(), model.id)),
                    message: &message,
                },
            )
            .await;

        Ok(ShortResponse::new(model, Some(author.into())))
    }

    /// Owner or admin only.
    pub async fn delete(&self, caller: &AuthUser, id: i32) -> Result<(), AppError>
    where
        C: TransactionTrait,
    {
        let short = self.find(id).await?;
        caller.require_owner_or_admin(self.conn, short.user_id).await?;

        let txn = self.conn.begin().await?;
        short::Entity::delete_by_id(id).exec(&txn).await?;
        target::purge_references(&txn, EntityKind::Short, id).await?;
        txn.commit().await?;
        Ok(())
    }
}
