use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entity::movie;
use crate::error::AppError;
use crate::models::engagement::RatingSummary;
use crate::models::shared::{PageRequest, double_option};

pub const MIN_YEAR: i32 = 1888;
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MovieKind {
    #[default]
    Movie,
    Series,
    Documentary,
}

impl MovieKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieKind::Movie => "movie",
            MovieKind::Series => "series",
            MovieKind::Documentary => "documentary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MovieSort {
    #[default]
    Newest,
    Oldest,
    Title,
    /// Most viewed first.
    Popular,
    Year,
}

/// Query parameters for listing movies.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovieListQuery {
    /// Page number, 1-based (default 1).
    pub page: Option<u64>,
    /// Items per page, 1-100 (default 20).
    pub limit: Option<u64>,
    /// Only movies tagged with this genre (case-insensitive).
    #[param(example = "Drama")]
    pub genre: Option<String>,
    #[param(example = 1999)]
    pub year: Option<i32>,
    /// `movie`, `series` or `documentary`.
    #[serde(rename = "type")]
    pub kind: Option<MovieKind>,
    /// `newest` (default), `oldest`, `title`, `popular` or `year`.
    pub sort: Option<MovieSort>,
}

/// Validated movie filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub kind: Option<MovieKind>,
    pub sort: MovieSort,
}

impl MovieListQuery {
    pub fn into_parts(self) -> Result<(MovieFilter, PageRequest), AppError> {
        let page = PageRequest::new(self.page, self.limit)?;
        validate_optional_year(self.year)?;
        let genre = self
            .genre
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());
        Ok((
            MovieFilter {
                genre,
                year: self.year,
                kind: self.kind,
                sort: self.sort.unwrap_or_default(),
            },
            page,
        ))
    }
}

pub fn validate_optional_year(year: Option<i32>) -> Result<(), AppError> {
    if let Some(year) = year
        && !(MIN_YEAR..=MAX_YEAR).contains(&year)
    {
        return Err(AppError::Validation(format!(
            "year must be between {MIN_YEAR} and {MAX_YEAR}"
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    #[validate(length(min = 1, max = 256, message = "Title must be 1-256 characters"))]
    #[schema(example = "The Matrix")]
    pub title: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 10, message = "At most 10 genres"))]
    #[serde(default)]
    #[schema(example = json!(["Action", "Sci-Fi"]))]
    pub genres: Vec<String>,
    #[validate(range(min = 1888, max = 2100, message = "Year must be between 1888 and 2100"))]
    #[schema(example = 1999)]
    pub year: i32,
    #[serde(rename = "type", default)]
    pub kind: MovieKind,
    #[validate(range(min = 1, max = 1000, message = "Duration must be 1-1000 minutes"))]
    #[schema(example = 136)]
    pub duration_minutes: Option<i32>,
    #[validate(url(message = "posterUrl must be a valid URL"))]
    pub poster_url: Option<String>,
    #[validate(url(message = "videoUrl must be a valid URL"))]
    pub video_url: Option<String>,
}

/// PATCH body for a movie. Absent fields are kept; `null` clears nullable ones.
#[derive(Debug, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genres: Option<Vec<String>>,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub kind: Option<MovieKind>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub duration_minutes: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub poster_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub video_url: Option<Option<String>>,
}

pub fn validate_update_movie(payload: &UpdateMovieRequest) -> Result<(), AppError> {
    if let Some(title) = &payload.title {
        let len = title.trim().chars().count();
        if len == 0 || len > 256 {
            return Err(AppError::Validation(
                "Title must be 1-256 characters".into(),
            ));
        }
    }
    if let Some(desc) = &payload.description
        && desc.chars().count() > 5000
    {
        return Err(AppError::Validation(
            "Description must be at most 5000 characters".into(),
        ));
    }
    if let Some(genres) = &payload.genres
        && genres.len() > 10
    {
        return Err(AppError::Validation("At most 10 genres".into()));
    }
    validate_optional_year(payload.year)?;
    if let Some(Some(d)) = payload.duration_minutes
        && !(1..=1000).contains(&d)
    {
        return Err(AppError::Validation(
            "Duration must be 1-1000 minutes".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "The Matrix")]
    pub title: String,
    pub description: String,
    #[schema(example = json!(["Action", "Sci-Fi"]))]
    pub genres: Vec<String>,
    #[schema(example = 1999)]
    pub year: i32,
    #[serde(rename = "type")]
    #[schema(example = "movie")]
    pub kind: String,
    pub duration_minutes: Option<i32>,
    pub poster_url: Option<String>,
    pub video_url: Option<String>,
    #[schema(example = 1024)]
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<movie::Model> for MovieResponse {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            genres: m.genres,
            year: m.year,
            kind: m.kind,
            duration_minutes: m.duration_minutes,
            poster_url: m.poster_url,
            video_url: m.video_url,
            view_count: m.view_count,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A movie with its rating summary and, for a signed-in caller, their own
/// engagement with it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetailResponse {
    #[serde(flatten)]
    pub movie: MovieResponse,
    pub rating: RatingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_watchlist: Option<bool>,
}
