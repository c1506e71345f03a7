use std::collections::HashMap;

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{OnConflict, Query as SeaQuery};
use sea_orm::*;

use crate::entity::{follow, list_item, rating, user, user_list};
use crate::error::AppError;
use crate::models::notification::NotificationKind;
use crate::models::shared::{EntityKind, Page, PageRequest};
use crate::models::social::{
    CreateListRequest, FeedItem, ListDetailResponse, ListResponse, ProfileResponse,
    UpdateListRequest, UserSummary,
};
use crate::services::notification::{NewNotification, NotificationService};
use crate::services::target;

/// Summaries for the given user ids. Missing users are skipped.
pub async fn load_users<C: ConnectionTrait>(
    conn: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, UserSummary>, AppError> {
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect())
}

pub async fn find_user<C: ConnectionTrait>(conn: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

pub struct SocialService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SocialService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Returns `true` when a new follow was created.
    pub async fn follow(&self, follower: &user::Model, following_id: i32) -> Result<bool, AppError> {
        if follower.id == following_id {
            return Err(AppError::Validation("You cannot follow yourself".into()));
        }
        find_user(self.conn, following_id).await?;

        let row = follow::ActiveModel {
            follower_id: Set(follower.id),
            following_id: Set(following_id),
            created_at: Set(Utc::now()),
        };
        let result = follow::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([follow::Column::FollowerId, follow::Column::FollowingId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;
        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => return Ok(false),
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }

        let message = format!("{} started following you", follower.username);
        NotificationService::new(self.conn)
            .notify_or_log(
                &[following_id],
                NewNotification {
                    kind: NotificationKind::Follow,
                    actor_id: Some(follower.id),
                    entity: None,
                    message: &message,
                },
            )
            .await;
        Ok(true)
    }

    pub async fn unfollow(&self, follower_id: i32, following_id: i32) -> Result<u64, AppError> {
        let res = follow::Entity::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn followers(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<UserSummary>, AppError> {
        find_user(self.conn, user_id).await?;
        let query = follow::Entity::find().filter(follow::Column::FollowingId.eq(user_id));
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(follow::Column::CreatedAt)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        let ids: Vec<i32> = rows.iter().map(|r| r.follower_id).collect();
        let mut users = load_users(self.conn, ids.iter().copied()).await?;
        let items = ids.into_iter().filter_map(|id| users.remove(&id)).collect();
        Ok(Page::new(items, total, page))
    }

    pub async fn following(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<UserSummary>, AppError> {
        find_user(self.conn, user_id).await?;
        let query = follow::Entity::find().filter(follow::Column::FollowerId.eq(user_id));
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(follow::Column::CreatedAt)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        let ids: Vec<i32> = rows.iter().map(|r| r.following_id).collect();
        let mut users = load_users(self.conn, ids.iter().copied()).await?;
        let items = ids.into_iter().filter_map(|id| users.remove(&id)).collect();
        Ok(Page::new(items, total, page))
    }

    pub async fn profile(
        &self,
        user_id: i32,
        caller: Option<i32>,
    ) -> Result<ProfileResponse, AppError> {
        let user = find_user(self.conn, user_id).await?;
        let follower_count = follow::Entity::find()
            .filter(follow::Column::FollowingId.eq(user_id))
            .count(self.conn)
            .await?;
        let following_count = follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .count(self.conn)
            .await?;
        let is_following = match caller {
            Some(caller) => Some(
                follow::Entity::find_by_id((caller, user_id))
                    .count(self.conn)
                    .await?
                    > 0,
            ),
            None => None,
        };

        Ok(ProfileResponse {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            bio: user.bio,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
            follower_count,
            following_count,
            is_following,
        })
    }

    /// Latest ratings by users the caller follows.
    pub async fn feed(&self, user_id: i32, page: PageRequest) -> Result<Page<FeedItem>, AppError> {
        let followees = SeaQuery::select()
            .column(follow::Column::FollowingId)
            .from(follow::Entity)
            .and_where(follow::Column::FollowerId.eq(user_id))
            .to_owned();
        let query = rating::Entity::find().filter(rating::Column::UserId.in_subquery(followees));

        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(rating::Column::UpdatedAt)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;

        let users = load_users(self.conn, rows.iter().map(|r| r.user_id)).await?;
        let items = rows
            .into_iter()
            .filter_map(|r| {
                let user = users.get(&r.user_id)?.clone();
                Some(FeedItem {
                    user,
                    entity_type: r.entity_type,
                    entity_id: r.entity_id,
                    value: r.value,
                    review: r.review,
                    rated_at: r.updated_at,
                })
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn item_counts(&self, list_ids: Vec<i32>) -> Result<HashMap<i32, u64>, AppError> {
        if list_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = list_item::Entity::find()
            .select_only()
            .column(list_item::Column::ListId)
            .column_as(Expr::cust("COUNT(*)"), "item_count")
            .filter(list_item::Column::ListId.is_in(list_ids))
            .group_by(list_item::Column::ListId)
            .into_tuple::<(i32, i64)>()
            .all(self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, n)| (id, u64::try_from(n).unwrap_or(0)))
            .collect())
    }

    async fn page_lists(
        &self,
        query: Select<user_list::Entity>,
        page: PageRequest,
    ) -> Result<Page<ListResponse>, AppError> {
        let total = query.clone().count(self.conn).await?;
        let lists = query
            .order_by_desc(user_list::Column::UpdatedAt)
            .order_by_desc(user_list::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        let counts = self.item_counts(lists.iter().map(|l| l.id).collect()).await?;
        let items = lists
            .into_iter()
            .map(|l| {
                let n = counts.get(&l.id).copied().unwrap_or(0);
                ListResponse::new(l, n)
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    pub async fn my_lists(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<ListResponse>, AppError> {
        self.page_lists(
            user_list::Entity::find().filter(user_list::Column::UserId.eq(user_id)),
            page,
        )
        .await
    }

    pub async fn public_lists(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<ListResponse>, AppError> {
        find_user(self.conn, user_id).await?;
        self.page_lists(
            user_list::Entity::find()
                .filter(user_list::Column::UserId.eq(user_id))
                .filter(user_list::Column::IsPublic.eq(true)),
            page,
        )
        .await
    }

    pub async fn create_list(
        &self,
        user_id: i32,
        payload: CreateListRequest,
    ) -> Result<user_list::Model, AppError> {
        let now = Utc::now();
        let model = user_list::ActiveModel {
            user_id: Set(user_id),
            name: Set(payload.name.trim().to_string()),
            description: Set(payload.description),
            is_public: Set(payload.is_public),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.conn).await?)
    }

    async fn find_list(&self, id: i32) -> Result<user_list::Model, AppError> {
        user_list::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("List {id} not found")))
    }

    /// The owner's list. Other users get 403.
    async fn owned_list(&self, user_id: i32, id: i32) -> Result<user_list::Model, AppError> {
        let list = self.find_list(id).await?;
        if list.user_id != user_id {
            return Err(AppError::PermissionDenied);
        }
        Ok(list)
    }

    /// Private lists are hidden from everyone but their owner.
    pub async fn get_list(
        &self,
        id: i32,
        caller: Option<i32>,
    ) -> Result<ListDetailResponse, AppError> {
        let list = self.find_list(id).await?;
        if !list.is_public && caller != Some(list.user_id) {
            return Err(AppError::NotFound(format!("List {id} not found")));
        }
        let items: Vec<list_item::Model> = list_item::Entity::find()
            .filter(list_item::Column::ListId.eq(id))
            .order_by_desc(list_item::Column::AddedAt)
            .all(self.conn)
            .await?;
        let count = items.len() as u64;
        Ok(ListDetailResponse {
            list: ListResponse::new(list, count),
            items: items.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn update_list(
        &self,
        user_id: i32,
        id: i32,
        payload: UpdateListRequest,
    ) -> Result<user_list::Model, AppError> {
        let list = self.owned_list(user_id, id).await?;
        let mut active: user_list::ActiveModel = list.into();
        if let Some(name) = payload.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = payload.description {
            active.description = Set(description);
        }
        if let Some(is_public) = payload.is_public {
            active.is_public = Set(is_public);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.conn).await?)
    }

    pub async fn delete_list(&self, user_id: i32, id: i32) -> Result<(), AppError>
    where
        C: TransactionTrait,
    {
        self.owned_list(user_id, id).await?;
        let txn = self.conn.begin().await?;
        list_item::Entity::delete_many()
            .filter(list_item::Column::ListId.eq(id))
            .exec(&txn)
            .await?;
        user_list::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Idempotent.
    pub async fn add_list_item(
        &self,
        user_id: i32,
        list_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<(), AppError> {
        self.owned_list(user_id, list_id).await?;
        target::ensure_exists(self.conn, kind, entity_id).await?;

        let row = list_item::ActiveModel {
            list_id: Set(list_id),
            entity_type: Set(kind.as_str().to_string()),
            entity_id: Set(entity_id),
            added_at: Set(Utc::now()),
        };
        let result = list_item::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    list_item::Column::ListId,
                    list_item::Column::EntityType,
                    list_item::Column::EntityId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;
        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => Ok(()),
            Ok(_) => {
                self.touch_list(list_id).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove_list_item(
        &self,
        user_id: i32,
        list_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<u64, AppError> {
        self.owned_list(user_id, list_id).await?;
        let res = list_item::Entity::delete_many()
            .filter(list_item::Column::ListId.eq(list_id))
            .filter(list_item::Column::EntityType.eq(kind.as_str()))
            .filter(list_item::Column::EntityId.eq(entity_id))
            .exec(self.conn)
            .await?;
        if res.rows_affected > 0 {
            self.touch_list(list_id).await?;
        }
        Ok(res.rows_affected)
    }

    async fn touch_list(&self, list_id: i32) -> Result<(), AppError> {
        user_list::Entity::update_many()
            .col_expr(
                user_list::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(user_list::Column::Id.eq(list_id))
            .exec(self.conn)
            .await?;
        Ok(())
    }
}
