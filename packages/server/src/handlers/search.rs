use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::query::AppQuery;
use crate::models::search::{SearchQuery, SearchResponse};
use crate::response::ApiResponse;
use crate::services::search::SearchService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Search",
    operation_id = "search",
    summary = "Search the catalog and users",
    description = "Case-insensitive substring match. Movies match on title and description, music on title, artist and album, shorts on title, users on username and display name. `page`/`limit` apply to each section.",
    params(SearchQuery),
    responses(
        (status = 200, description = "One page per requested section", body = SearchResponse),
        (status = 400, description = "Term shorter than 2 characters or bad parameters (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn search(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<ApiResponse<SearchResponse>, AppError> {
    let params = query.into_params()?;
    tracing::debug!(term = %params.term, kind = ?params.kind, "Searching");
    let results = SearchService::new(&state.db).search(params).await?;
    Ok(ApiResponse::ok(results))
}
