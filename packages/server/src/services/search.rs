use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, IntoColumnRef, LikeExpr};
use sea_orm::*;

use crate::entity::{movie, music, short, user};
use crate::error::AppError;
use crate::models::movie::MovieResponse;
use crate::models::music::MusicResponse;
use crate::models::search::{SearchParams, SearchResponse, SearchType};
use crate::models::shared::{Page, PageRequest, contains_pattern};
use crate::models::short::ShortResponse;
use crate::models::social::UserSummary;
use crate::services::social::load_users;

/// `LOWER(col) LIKE pattern`, where `pattern` comes from [`contains_pattern`].
pub fn lower_like(col: impl IntoColumnRef, pattern: &str) -> Expr {
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\'))
}

pub struct SearchService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SearchService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn search(&self, params: SearchParams) -> Result<SearchResponse, AppError> {
        let pattern = contains_pattern(&params.term);
        let page = params.page;
        let kind = params.kind;

        let movies = if kind.includes(SearchType::Movie) {
            Some(self.movies(&pattern, page).await?)
        } else {
            None
        };
        let music = if kind.includes(SearchType::Music) {
            Some(self.music(&pattern, page).await?)
        } else {
            None
        };
        let shorts = if kind.includes(SearchType::Short) {
            Some(self.shorts(&pattern, page).await?)
        } else {
            None
        };
        let users = if kind.includes(SearchType::User) {
            Some(self.users(&pattern, page).await?)
        } else {
            None
        };

        Ok(SearchResponse {
            query: params.term,
            movies,
            music,
            shorts,
            users,
        })
    }

    async fn movies(
        &self,
        pattern: &str,
        page: PageRequest,
    ) -> Result<Page<MovieResponse>, AppError> {
        let query = movie::Entity::find().filter(
            Condition::any()
                .add(lower_like(movie::Column::Title, pattern))
                .add(lower_like(movie::Column::Description, pattern)),
        );
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(movie::Column::ViewCount)
            .order_by_asc(movie::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(rows, total, page).map(Into::into))
    }

    async fn music(
        &self,
        pattern: &str,
        page: PageRequest,
    ) -> Result<Page<MusicResponse>, AppError> {
        let query = music::Entity::find().filter(
            Condition::any()
                .add(lower_like(music::Column::Title, pattern))
                .add(lower_like(music::Column::Artist, pattern))
                .add(lower_like(music::Column::Album, pattern)),
        );
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(music::Column::PlayCount)
            .order_by_asc(music::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(rows, total, page).map(Into::into))
    }

    async fn shorts(
        &self,
        pattern: &str,
        page: PageRequest,
    ) -> Result<Page<ShortResponse>, AppError> {
        let query = short::Entity::find().filter(lower_like(short::Column::Title, pattern));
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(short::Column::CreatedAt)
            .order_by_desc(short::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        let authors = load_users(self.conn, rows.iter().map(|s| s.user_id)).await?;
        let items = rows
            .into_iter()
            .map(|s| {
                let author = authors.get(&s.user_id).cloned();
                ShortResponse::new(s, author)
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn users(
        &self,
        pattern: &str,
        page: PageRequest,
    ) -> Result<Page<UserSummary>, AppError> {
        let query = user::Entity::find()
            .filter(user::Column::IsBanned.eq(false))
            .filter(
                Condition::any()
                    .add(lower_like(user::Column::Username, pattern))
                    .add(lower_like(user::Column::DisplayName, pattern)),
            );
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_asc(user::Column::Username)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(rows, total, page).map(Into::into))
    }
}
