use std::collections::HashMap;

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;

use crate::entity::{music, playlist, playlist_item};
use crate::error::AppError;
use crate::models::playlist::{
    CreatePlaylistRequest, PlaylistDetailResponse, PlaylistResponse, PlaylistTrackResponse,
    UpdatePlaylistRequest,
};
use crate::models::shared::{Page, PageRequest};

pub struct PlaylistService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> PlaylistService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: i32,
        payload: CreatePlaylistRequest,
    ) -> Result<playlist::Model, AppError> {
        let now = Utc::now();
        let model = playlist::ActiveModel {
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

    async fn find(&self, id: i32) -> Result<playlist::Model, AppError> {
        playlist::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {id} not found")))
    }

    async fn owned(&self, user_id: i32, id: i32) -> Result<playlist::Model, AppError> {
        let playlist = self.find(id).await?;
        if playlist.user_id != user_id {
            return Err(AppError::PermissionDenied);
        }
        Ok(playlist)
    }

    async fn track_counts(&self, ids: Vec<i32>) -> Result<HashMap<i32, u64>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = playlist_item::Entity::find()
            .select_only()
            .column(playlist_item::Column::PlaylistId)
            .column_as(Expr::cust("COUNT(*)"), "track_count")
            .filter(playlist_item::Column::PlaylistId.is_in(ids))
            .group_by(playlist_item::Column::PlaylistId)
            .into_tuple::<(i32, i64)>()
            .all(self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, n)| (id, u64::try_from(n).unwrap_or(0)))
            .collect())
    }

    /// Private playlists are visible to their owner only.
    pub async fn get(
        &self,
        id: i32,
        caller: Option<i32>,
    ) -> Result<PlaylistDetailResponse, AppError> {
        let playlist = self.find(id).await?;
        if !playlist.is_public && caller != Some(playlist.user_id) {
            return Err(AppError::NotFound(format!("Playlist {id} not found")));
        }

        let items = playlist_item::Entity::find()
            .filter(playlist_item::Column::PlaylistId.eq(id))
            .order_by_asc(playlist_item::Column::Position)
            .all(self.conn)
            .await?;
        let music_ids: Vec<i32> = items.iter().map(|i| i.music_id).collect();
        let mut tracks: HashMap<i32, music::Model> = music::Entity::find()
            .filter(music::Column::Id.is_in(music_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let tracks: Vec<PlaylistTrackResponse> = items
            .into_iter()
            .filter_map(|item| {
                let track = tracks.remove(&item.music_id)?;
                Some(PlaylistTrackResponse {
                    position: item.position,
                    added_at: item.added_at,
                    track: track.into(),
                })
            })
            .collect();

        Ok(PlaylistDetailResponse {
            playlist: PlaylistResponse::new(playlist, tracks.len() as u64),
            tracks,
        })
    }

    pub async fn list_mine(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<PlaylistResponse>, AppError> {
        let query = playlist::Entity::find().filter(playlist::Column::UserId.eq(user_id));
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(playlist::Column::UpdatedAt)
            .order_by_desc(playlist::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        let counts = self.track_counts(rows.iter().map(|p| p.id).collect()).await?;
        let items = rows
            .into_iter()
            .map(|p| {
                let n = counts.get(&p.id).copied().unwrap_or(0);
                PlaylistResponse::new(p, n)
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        payload: UpdatePlaylistRequest,
    ) -> Result<playlist::Model, AppError> {
        let existing = self.owned(user_id, id).await?;
        let mut active: playlist::ActiveModel = existing.into();
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

    pub async fn delete(&self, user_id: i32, id: i32) -> Result<(), AppError>
    where
        C: TransactionTrait,
    {
        self.owned(user_id, id).await?;
        let txn = self.conn.begin().await?;
        playlist_item::Entity::delete_many()
            .filter(playlist_item::Column::PlaylistId.eq(id))
            .exec(&txn)
            .await?;
        playlist::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Append a track after the current last position. Adding a track that
    /// is already present keeps its position.
    pub async fn add_track(
        &self,
        user_id: i32,
        playlist_id: i32,
        music_id: i32,
    ) -> Result<playlist_item::Model, AppError> {
        self.owned(user_id, playlist_id).await?;
        if music::Entity::find_by_id(music_id).count(self.conn).await? == 0 {
            return Err(AppError::NotFound(format!("Track {music_id} not found")));
        }
        if let Some(existing) = playlist_item::Entity::find_by_id((playlist_id, music_id))
            .one(self.conn)
            .await?
        {
            return Ok(existing);
        }

        let max_pos: Option<i32> = playlist_item::Entity::find()
            .select_only()
            .column_as(playlist_item::Column::Position.max(), "max_pos")
            .filter(playlist_item::Column::PlaylistId.eq(playlist_id))
            .into_tuple::<Option<i32>>()
            .one(self.conn)
            .await?
            .flatten();

        let item = playlist_item::ActiveModel {
            playlist_id: Set(playlist_id),
            music_id: Set(music_id),
            position: Set(max_pos.unwrap_or(0) + 1),
            added_at: Set(Utc::now()),
        };
        let inserted = match item.insert(self.conn).await {
            Ok(inserted) => inserted,
            // Lost a race with an identical add; the winner's row is the answer.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return playlist_item::Entity::find_by_id((playlist_id, music_id))
                    .one(self.conn)
                    .await?
                    .ok_or_else(|| AppError::from(e));
            }
            Err(e) => return Err(e.into()),
        };

        playlist::Entity::update_many()
            .col_expr(
                playlist::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(playlist::Column::Id.eq(playlist_id))
            .exec(self.conn)
            .await?;
        Ok(inserted)
    }

    pub async fn remove_track(
        &self,
        user_id: i32,
        playlist_id: i32,
        music_id: i32,
    ) -> Result<u64, AppError> {
        self.owned(user_id, playlist_id).await?;
        let res = playlist_item::Entity::delete_many()
            .filter(playlist_item::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_item::Column::MusicId.eq(music_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }
}
