use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Func;
use sea_orm::*;

use crate::entity::music;
use crate::error::AppError;
use crate::models::music::{
    CreateMusicRequest, MusicDetailResponse, MusicFilter, MusicSort, UpdateMusicRequest,
};
use crate::models::shared::{EntityKind, Page, PageRequest, normalize_genres};
use crate::services::catalog;
use crate::services::engagement::EngagementService;
use crate::services::target;

/// Fields for a track created outside the admin API.
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub audio_url: String,
    pub duration_seconds: i32,
    pub uploaded_by: Option<i32>,
}

pub struct MusicService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> MusicService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        filter: &MusicFilter,
        page: PageRequest,
    ) -> Result<Page<music::Model>, AppError> {
        let mut query = music::Entity::find();
        if let Some(genre) = &filter.genre {
            query = query.filter(catalog::genre_matches("music", genre));
        }
        if let Some(artist) = &filter.artist {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(music::Column::Artist)))
                    .eq(artist.to_lowercase()),
            );
        }
        if let Some(year) = filter.year {
            query = query.filter(music::Column::Year.eq(year));
        }

        let total = query.clone().count(self.conn).await?;

        query = match filter.sort {
            MusicSort::Newest => query
                .order_by_desc(music::Column::CreatedAt)
                .order_by_desc(music::Column::Id),
            MusicSort::Oldest => query
                .order_by_asc(music::Column::CreatedAt)
                .order_by_asc(music::Column::Id),
            MusicSort::Title => query
                .order_by_asc(music::Column::Title)
                .order_by_asc(music::Column::Id),
            MusicSort::Popular => query
                .order_by_desc(music::Column::PlayCount)
                .order_by_desc(music::Column::CreatedAt),
        };

        let items = query
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn trending(&self, page: PageRequest) -> Result<Page<music::Model>, AppError> {
        self.list(
            &MusicFilter {
                sort: MusicSort::Popular,
                ..Default::default()
            },
            page,
        )
        .await
    }

    pub async fn genres(&self) -> Result<Vec<String>, AppError> {
        catalog::distinct_genres(self.conn, "music").await
    }

    pub async fn find(&self, id: i32) -> Result<music::Model, AppError> {
        music::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Track {id} not found")))
    }

    pub async fn detail(
        &self,
        id: i32,
        caller: Option<i32>,
    ) -> Result<MusicDetailResponse, AppError> {
        let track = self.find(id).await?;
        let engagement = EngagementService::new(self.conn);
        let rating = engagement.rating_summary(EntityKind::Music, id).await?;
        let mine = match caller {
            Some(user_id) => Some(
                engagement
                    .caller_engagement(user_id, EntityKind::Music, id)
                    .await?,
            ),
            None => None,
        };

        Ok(MusicDetailResponse {
            track: track.into(),
            rating,
            user_rating: mine.and_then(|m| m.rating),
            is_favorite: mine.map(|m| m.is_favorite),
        })
    }

    /// Returns the new play count.
    pub async fn record_play(&self, id: i32) -> Result<i64, AppError> {
        let res = music::Entity::update_many()
            .col_expr(music::Column::PlayCount, catalog::increment("play_count"))
            .filter(music::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Track {id} not found")));
        }
        Ok(self.find(id).await?.play_count)
    }

    pub async fn create(&self, payload: CreateMusicRequest) -> Result<music::Model, AppError> {
        let now = Utc::now();
        let model = music::ActiveModel {
            title: Set(payload.title.trim().to_string()),
            artist: Set(payload.artist.trim().to_string()),
            album: Set(payload.album.map(|a| a.trim().to_string())),
            genres: Set(normalize_genres(payload.genres)),
            year: Set(payload.year),
            duration_seconds: Set(payload.duration_seconds),
            audio_url: Set(payload.audio_url),
            cover_url: Set(payload.cover_url),
            play_count: Set(0),
            uploaded_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.conn).await?)
    }

    /// Insert a track built from an upload.
    pub async fn create_from(&self, track: NewTrack) -> Result<music::Model, AppError> {
        let now = Utc::now();
        let model = music::ActiveModel {
            title: Set(track.title),
            artist: Set(track.artist),
            album: Set(None),
            genres: Set(Vec::new()),
            year: Set(None),
            duration_seconds: Set(track.duration_seconds),
            audio_url: Set(track.audio_url),
            cover_url: Set(None),
            play_count: Set(0),
            uploaded_by: Set(track.uploaded_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.conn).await?)
    }

    pub async fn update(
        &self,
        id: i32,
        payload: UpdateMusicRequest,
    ) -> Result<music::Model, AppError> {
        let existing = self.find(id).await?;
        let mut active: music::ActiveModel = existing.into();

        if let Some(title) = payload.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(artist) = payload.artist {
            active.artist = Set(artist.trim().to_string());
        }
        if let Some(album) = payload.album {
            active.album = Set(album.map(|a| a.trim().to_string()));
        }
        if let Some(genres) = payload.genres {
            active.genres = Set(normalize_genres(genres));
        }
        if let Some(year) = payload.year {
            active.year = Set(year);
        }
        if let Some(duration) = payload.duration_seconds {
            active.duration_seconds = Set(duration);
        }
        if let Some(url) = payload.audio_url {
            active.audio_url = Set(url);
        }
        if let Some(url) = payload.cover_url {
            active.cover_url = Set(url);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.conn).await?)
    }

    /// Delete the track, its playlist entries and every polymorphic reference.
    pub async fn delete(&self, id: i32) -> Result<(), AppError>
    where
        C: TransactionTrait,
    {
        let txn = self.conn.begin().await?;
        let res = music::Entity::delete_by_id(id).exec(&txn).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Track {id} not found")));
        }
        target::purge_references(&txn, EntityKind::Music, id).await?;
        txn.commit().await?;
        Ok(())
    }
}
