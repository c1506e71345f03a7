use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::models::movie::MovieResponse;
use crate::models::music::MusicResponse;
use crate::models::shared::{Page, PageRequest};
use crate::models::short::ShortResponse;
use crate::models::social::UserSummary;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_QUERY_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    All,
    Movie,
    Music,
    Short,
    User,
}

impl SearchType {
    pub fn includes(&self, other: SearchType) -> bool {
        *self == SearchType::All || *self == other
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Search term, at least 2 characters after trimming.
    #[param(example = "matrix")]
    pub q: Option<String>,
    /// `all` (default), `movie`, `music`, `short` or `user`.
    #[serde(rename = "type")]
    pub kind: Option<SearchType>,
    /// Page within each section.
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub term: String,
    pub kind: SearchType,
    pub page: PageRequest,
}

impl SearchQuery {
    pub fn into_params(self) -> Result<SearchParams, AppError> {
        let term = self.q.as_deref().unwrap_or("").trim().to_string();
        let len = term.chars().count();
        if len < MIN_QUERY_CHARS {
            return Err(AppError::Validation(format!(
                "q must be at least {MIN_QUERY_CHARS} characters"
            )));
        }
        if len > MAX_QUERY_CHARS {
            return Err(AppError::Validation(format!(
                "q must be at most {MAX_QUERY_CHARS} characters"
            )));
        }
        Ok(SearchParams {
            term,
            kind: self.kind.unwrap_or_default(),
            page: PageRequest::new(self.page, self.limit)?,
        })
    }
}

/// One page per requested section. Sections not requested are omitted.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[schema(example = "matrix")]
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movies: Option<Page<MovieResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<Page<MusicResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shorts: Option<Page<ShortResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Page<UserSummary>>,
}
