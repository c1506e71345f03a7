use std::collections::HashMap;

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::{favorite, history, movie, rating, watchlist};
use crate::error::AppError;
use crate::models::engagement::{
    HistoryRequest, RateRequest, RatingSummary, WatchlistEntryResponse, validate_rating_value,
};
use crate::models::shared::{EntityKind, Page, PageRequest};
use crate::services::target;

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    average: Option<f64>,
    count: i64,
}

/// The caller's own engagement with one catalog item.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallerEngagement {
    pub rating: Option<i32>,
    pub is_favorite: bool,
    pub in_watchlist: bool,
}

pub struct EngagementService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> EngagementService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Create or replace the caller's rating.
    pub async fn rate(&self, user_id: i32, payload: RateRequest) -> Result<rating::Model, AppError> {
        validate_rating_value(payload.value)?;
        target::ensure_exists(self.conn, payload.entity_type, payload.entity_id).await?;

        let kind = payload.entity_type.as_str().to_string();
        let now = Utc::now();
        let row = rating::ActiveModel {
            user_id: Set(user_id),
            entity_type: Set(kind.clone()),
            entity_id: Set(payload.entity_id),
            value: Set(payload.value),
            review: Set(payload.review.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        rating::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    rating::Column::UserId,
                    rating::Column::EntityType,
                    rating::Column::EntityId,
                ])
                .update_columns([
                    rating::Column::Value,
                    rating::Column::Review,
                    rating::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        rating::Entity::find_by_id((user_id, kind, payload.entity_id))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal("Rating vanished after upsert".into()))
    }

    pub async fn remove_rating(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<u64, AppError> {
        let res = rating::Entity::delete_many()
            .filter(rating::Column::UserId.eq(user_id))
            .filter(rating::Column::EntityType.eq(kind.as_str()))
            .filter(rating::Column::EntityId.eq(entity_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn my_ratings(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<rating::Model>, AppError> {
        let query = rating::Entity::find().filter(rating::Column::UserId.eq(user_id));
        let total = query.clone().count(self.conn).await?;
        let items = query
            .order_by_desc(rating::Column::UpdatedAt)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn rating_summary(
        &self,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<RatingSummary, AppError> {
        let row = rating::Entity::find()
            .select_only()
            .column_as(
                Expr::cust("CAST(AVG(\"value\") AS DOUBLE PRECISION)"),
                "average",
            )
            .column_as(Expr::cust("COUNT(*)"), "count")
            .filter(rating::Column::EntityType.eq(kind.as_str()))
            .filter(rating::Column::EntityId.eq(entity_id))
            .into_model::<SummaryRow>()
            .one(self.conn)
            .await?;

        Ok(match row {
            Some(r) => RatingSummary::new(r.average, u64::try_from(r.count).unwrap_or(0)),
            None => RatingSummary::new(None, 0),
        })
    }

    /// Rating, favorite and watchlist state for a signed-in caller.
    pub async fn caller_engagement(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<CallerEngagement, AppError> {
        let kind_str = kind.as_str().to_string();
        let rating = rating::Entity::find_by_id((user_id, kind_str.clone(), entity_id))
            .one(self.conn)
            .await?
            .map(|r| r.value);
        let is_favorite = favorite::Entity::find_by_id((user_id, kind_str, entity_id))
            .count(self.conn)
            .await?
            > 0;
        let in_watchlist = match kind {
            EntityKind::Movie => {
                watchlist::Entity::find_by_id((user_id, entity_id))
                    .count(self.conn)
                    .await?
                    > 0
            }
            _ => false,
        };

        Ok(CallerEngagement {
            rating,
            is_favorite,
            in_watchlist,
        })
    }

    /// Idempotent: favoriting twice keeps the first row.
    pub async fn add_favorite(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<favorite::Model, AppError> {
        target::ensure_exists(self.conn, kind, entity_id).await?;

        let row = favorite::ActiveModel {
            user_id: Set(user_id),
            entity_type: Set(kind.as_str().to_string()),
            entity_id: Set(entity_id),
            created_at: Set(Utc::now()),
        };
        let result = favorite::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    favorite::Column::UserId,
                    favorite::Column::EntityType,
                    favorite::Column::EntityId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;
        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }

        favorite::Entity::find_by_id((user_id, kind.as_str().to_string(), entity_id))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal("Favorite vanished after upsert".into()))
    }

    pub async fn remove_favorite(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<u64, AppError> {
        let res = favorite::Entity::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::EntityType.eq(kind.as_str()))
            .filter(favorite::Column::EntityId.eq(entity_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn list_favorites(
        &self,
        user_id: i32,
        kind: Option<EntityKind>,
        page: PageRequest,
    ) -> Result<Page<favorite::Model>, AppError> {
        let mut query = favorite::Entity::find().filter(favorite::Column::UserId.eq(user_id));
        if let Some(kind) = kind {
            query = query.filter(favorite::Column::EntityType.eq(kind.as_str()));
        }
        let total = query.clone().count(self.conn).await?;
        let items = query
            .order_by_desc(favorite::Column::CreatedAt)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(items, total, page))
    }

    /// Idempotent.
    pub async fn add_to_watchlist(
        &self,
        user_id: i32,
        movie_id: i32,
    ) -> Result<watchlist::Model, AppError> {
        target::ensure_exists(self.conn, EntityKind::Movie, movie_id).await?;

        let row = watchlist::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            added_at: Set(Utc::now()),
        };
        let result = watchlist::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([watchlist::Column::UserId, watchlist::Column::MovieId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;
        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }

        watchlist::Entity::find_by_id((user_id, movie_id))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal("Watchlist entry vanished after upsert".into()))
    }

    pub async fn remove_from_watchlist(&self, user_id: i32, movie_id: i32) -> Result<u64, AppError> {
        let res = watchlist::Entity::delete_many()
            .filter(watchlist::Column::UserId.eq(user_id))
            .filter(watchlist::Column::MovieId.eq(movie_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn list_watchlist(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<WatchlistEntryResponse>, AppError> {
        let query = watchlist::Entity::find().filter(watchlist::Column::UserId.eq(user_id));
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(watchlist::Column::AddedAt)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.movie_id).collect();
        let mut movies: HashMap<i32, movie::Model> = movie::Entity::find()
            .filter(movie::Column::Id.is_in(ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let items = rows
            .into_iter()
            .map(|r| WatchlistEntryResponse {
                movie_id: r.movie_id,
                added_at: r.added_at,
                movie: movies.remove(&r.movie_id).map(Into::into),
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    /// Last write wins: progress and duration are overwritten, not merged.
    pub async fn record_history(
        &self,
        user_id: i32,
        payload: HistoryRequest,
    ) -> Result<history::Model, AppError> {
        if payload.progress < 0 || payload.duration < 0 {
            return Err(AppError::Validation(
                "progress and duration must be >= 0".into(),
            ));
        }
        target::ensure_exists(self.conn, payload.entity_type, payload.entity_id).await?;

        let kind = payload.entity_type.as_str().to_string();
        let row = history::ActiveModel {
            user_id: Set(user_id),
            entity_type: Set(kind.clone()),
            entity_id: Set(payload.entity_id),
            progress: Set(payload.progress),
            duration: Set(payload.duration),
            watched_at: Set(Utc::now()),
        };
        history::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    history::Column::UserId,
                    history::Column::EntityType,
                    history::Column::EntityId,
                ])
                .update_columns([
                    history::Column::Progress,
                    history::Column::Duration,
                    history::Column::WatchedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        history::Entity::find_by_id((user_id, kind, payload.entity_id))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal("History entry vanished after upsert".into()))
    }

    pub async fn list_history(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<history::Model>, AppError> {
        let query = history::Entity::find().filter(history::Column::UserId.eq(user_id));
        let total = query.clone().count(self.conn).await?;
        let items = query
            .order_by_desc(history::Column::WatchedAt)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn clear_history(&self, user_id: i32) -> Result<u64, AppError> {
        let res = history::Entity::delete_many()
            .filter(history::Column::UserId.eq(user_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }
}
