use chrono::Utc;
use sea_orm::*;

use crate::entity::movie;
use crate::error::AppError;
use crate::models::movie::{
    CreateMovieRequest, MovieDetailResponse, MovieFilter, MovieSort, UpdateMovieRequest,
};
use crate::models::shared::{EntityKind, Page, PageRequest, normalize_genres};
use crate::services::catalog;
use crate::services::engagement::EngagementService;
use crate::services::target;

pub struct MovieService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> MovieService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> Result<Page<movie::Model>, AppError> {
        let mut query = movie::Entity::find();
        if let Some(genre) = &filter.genre {
            query = query.filter(catalog::genre_matches("movie", genre));
        }
        if let Some(year) = filter.year {
            query = query.filter(movie::Column::Year.eq(year));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(movie::Column::Kind.eq(kind.as_str()));
        }

        let total = query.clone().count(self.conn).await?;

        query = match filter.sort {
            MovieSort::Newest => query
                .order_by_desc(movie::Column::CreatedAt)
                .order_by_desc(movie::Column::Id),
            MovieSort::Oldest => query
                .order_by_asc(movie::Column::CreatedAt)
                .order_by_asc(movie::Column::Id),
            MovieSort::Title => query
                .order_by_asc(movie::Column::Title)
                .order_by_asc(movie::Column::Id),
            MovieSort::Popular => query
                .order_by_desc(movie::Column::ViewCount)
                .order_by_desc(movie::Column::CreatedAt),
            MovieSort::Year => query
                .order_by_desc(movie::Column::Year)
                .order_by_asc(movie::Column::Title),
        };

        let items = query
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(items, total, page))
    }

    /// Most viewed first, newest breaking ties.
    pub async fn trending(&self, page: PageRequest) -> Result<Page<movie::Model>, AppError> {
        self.list(
            &MovieFilter {
                sort: MovieSort::Popular,
                ..Default::default()
            },
            page,
        )
        .await
    }

    pub async fn genres(&self) -> Result<Vec<String>, AppError> {
        catalog::distinct_genres(self.conn, "movie").await
    }

    pub async fn find(&self, id: i32) -> Result<movie::Model, AppError> {
        movie::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Movie {id} not found")))
    }

    /// Count a view and return the movie with its rating summary. A signed-in
    /// caller also gets their own rating, favorite and watchlist state.
    pub async fn view(
        &self,
        id: i32,
        caller: Option<i32>,
    ) -> Result<MovieDetailResponse, AppError> {
        let res = movie::Entity::update_many()
            .col_expr(movie::Column::ViewCount, catalog::increment("view_count"))
            .filter(movie::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Movie {id} not found")));
        }

        let movie = self.find(id).await?;
        let engagement = EngagementService::new(self.conn);
        let rating = engagement.rating_summary(EntityKind::Movie, id).await?;
        let mine = match caller {
            Some(user_id) => Some(
                engagement
                    .caller_engagement(user_id, EntityKind::Movie, id)
                    .await?,
            ),
            None => None,
        };

        Ok(MovieDetailResponse {
            movie: movie.into(),
            rating,
            user_rating: mine.and_then(|m| m.rating),
            is_favorite: mine.map(|m| m.is_favorite),
            in_watchlist: mine.map(|m| m.in_watchlist),
        })
    }

    pub async fn create(&self, payload: CreateMovieRequest) -> Result<movie::Model, AppError> {
        let now = Utc::now();
        let model = movie::ActiveModel {
            title: Set(payload.title.trim().to_string()),
            description: Set(payload.description),
            genres: Set(normalize_genres(payload.genres)),
            year: Set(payload.year),
            kind: Set(payload.kind.as_str().to_string()),
            duration_minutes: Set(payload.duration_minutes),
            poster_url: Set(payload.poster_url),
            video_url: Set(payload.video_url),
            view_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.conn).await?)
    }

    pub async fn update(
        &self,
        id: i32,
        payload: UpdateMovieRequest,
    ) -> Result<movie::Model, AppError> {
        let existing = self.find(id).await?;
        let mut active: movie::ActiveModel = existing.into();

        if let Some(title) = payload.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = payload.description {
            active.description = Set(description);
        }
        if let Some(genres) = payload.genres {
            active.genres = Set(normalize_genres(genres));
        }
        if let Some(year) = payload.year {
            active.year = Set(year);
        }
        if let Some(kind) = payload.kind {
            active.kind = Set(kind.as_str().to_string());
        }
        if let Some(duration) = payload.duration_minutes {
            active.duration_minutes = Set(duration);
        }
        if let Some(url) = payload.poster_url {
            active.poster_url = Set(url);
        }
        if let Some(url) = payload.video_url {
            active.video_url = Set(url);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.conn).await?)
    }

    /// Delete the movie and every row that references it.
    pub async fn delete(&self, id: i32) -> Result<(), AppError>
    where
        C: TransactionTrait,
    {
        let txn = self.conn.begin().await?;
        let res = movie::Entity::delete_by_id(id).exec(&txn).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Movie {id} not found")));
        }
        target::purge_references(&txn, EntityKind::Movie, id).await?;
        txn.commit().await?;
        Ok(())
    }
}
