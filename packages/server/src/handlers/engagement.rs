use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::ValidJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::engagement::{
    EntityRefRequest, FavoriteListQuery, FavoriteResponse, HistoryRequest, HistoryResponse,
    RateRequest, RatingResponse, RatingSummary, WatchlistEntryResponse, WatchlistRequest,
};
use crate::models::notification::AffectedResponse;
use crate::models::shared::{EntityRefQuery, Page, PageQuery};
use crate::response::ApiResponse;
use crate::services::engagement::EngagementService;
use crate::services::target;
use crate::state::AppState;

#[utoipa::path(
    put,
    path = "/ratings",
    tag = "Engagement",
    operation_id = "rate",
    summary = "Rate a movie, short or track",
    description = "Creates the caller's rating or replaces it. `value` must be 1-5.",
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rating stored", body = RatingResponse),
        (status = 400, description = "Value out of range or bad input (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Target not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(
    user_id = auth_user.user_id,
    entity_type = %payload.entity_type,
    entity_id = payload.entity_id,
))]
pub async fn rate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RateRequest>,
) -> Result<ApiResponse<RatingResponse>, AppError> {
    let rating = EngagementService::new(&state.db)
        .rate(auth_user.user_id, payload)
        .await?;
    Ok(ApiResponse::ok(rating.into()).with_message("Rating saved"))
}

#[utoipa::path(
    delete,
    path = "/ratings",
    tag = "Engagement",
    operation_id = "removeRating",
    summary = "Remove the caller's rating",
    params(EntityRefQuery),
    responses(
        (status = 200, description = "Rating removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn remove_rating(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EntityRefQuery>,
) -> Result<ApiResponse<()>, AppError> {
    EngagementService::new(&state.db)
        .remove_rating(auth_user.user_id, query.entity_type, query.entity_id)
        .await?;
    Ok(ApiResponse::message("Rating removed"))
}

#[utoipa::path(
    get,
    path = "/ratings",
    tag = "Engagement",
    operation_id = "listMyRatings",
    summary = "The caller's ratings, most recent first",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of ratings", body = Page<RatingResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn my_ratings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<RatingResponse>>, AppError> {
    let page = EngagementService::new(&state.db)
        .my_ratings(auth_user.user_id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/ratings/summary",
    tag = "Engagement",
    operation_id = "ratingSummary",
    summary = "Average rating and count for one item",
    params(EntityRefQuery),
    responses(
        (status = 200, description = "Rating summary", body = RatingSummary),
        (status = 400, description = "Bad entity reference (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Target not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn rating_summary(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EntityRefQuery>,
) -> Result<ApiResponse<RatingSummary>, AppError> {
    target::ensure_exists(&state.db, query.entity_type, query.entity_id).await?;
    let summary = EngagementService::new(&state.db)
        .rating_summary(query.entity_type, query.entity_id)
        .await?;
    Ok(ApiResponse::ok(summary))
}

#[utoipa::path(
    put,
    path = "/favorites",
    tag = "Engagement",
    operation_id = "addFavorite",
    summary = "Favorite an item",
    description = "Idempotent.",
    request_body = EntityRefRequest,
    responses(
        (status = 200, description = "Favorited", body = FavoriteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Target not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn add_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<EntityRefRequest>,
) -> Result<ApiResponse<FavoriteResponse>, AppError> {
    let fav = EngagementService::new(&state.db)
        .add_favorite(auth_user.user_id, payload.entity_type, payload.entity_id)
        .await?;
    Ok(ApiResponse::ok(fav.into()).with_message("Added to favorites"))
}

#[utoipa::path(
    delete,
    path = "/favorites",
    tag = "Engagement",
    operation_id = "removeFavorite",
    summary = "Unfavorite an item",
    params(EntityRefQuery),
    responses(
        (status = 200, description = "Not a favorite"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn remove_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EntityRefQuery>,
) -> Result<ApiResponse<()>, AppError> {
    EngagementService::new(&state.db)
        .remove_favorite(auth_user.user_id, query.entity_type, query.entity_id)
        .await?;
    Ok(ApiResponse::message("Removed from favorites"))
}

#[utoipa::path(
    get,
    path = "/favorites",
    tag = "Engagement",
    operation_id = "listFavorites",
    summary = "The caller's favorites",
    params(FavoriteListQuery),
    responses(
        (status = 200, description = "Page of favorites", body = Page<FavoriteResponse>),
        (status = 400, description = "Bad filter or pagination (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_favorites(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FavoriteListQuery>,
) -> Result<ApiResponse<Page<FavoriteResponse>>, AppError> {
    let (kind, page) = query.into_parts()?;
    let favs = EngagementService::new(&state.db)
        .list_favorites(auth_user.user_id, kind, page)
        .await?;
    Ok(ApiResponse::ok(favs.map(Into::into)))
}

#[utoipa::path(
    put,
    path = "/watchlist",
    tag = "Engagement",
    operation_id = "addToWatchlist",
    summary = "Add a movie to the watchlist",
    description = "Idempotent.",
    request_body = WatchlistRequest,
    responses(
        (status = 200, description = "Movie on watchlist"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, movie_id = payload.movie_id))]
pub async fn add_to_watchlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<WatchlistRequest>,
) -> Result<ApiResponse<()>, AppError> {
    EngagementService::new(&state.db)
        .add_to_watchlist(auth_user.user_id, payload.movie_id)
        .await?;
    Ok(ApiResponse::message("Added to watchlist"))
}

#[utoipa::path(
    delete,
    path = "/watchlist/{movie_id}",
    tag = "Engagement",
    operation_id = "removeFromWatchlist",
    summary = "Remove a movie from the watchlist",
    params(("movie_id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie not on watchlist"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, movie_id))]
pub async fn remove_from_watchlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(movie_id): AppPath<i32>,
) -> Result<ApiResponse<()>, AppError> {
    EngagementService::new(&state.db)
        .remove_from_watchlist(auth_user.user_id, movie_id)
        .await?;
    Ok(ApiResponse::message("Removed from watchlist"))
}

#[utoipa::path(
    get,
    path = "/watchlist",
    tag = "Engagement",
    operation_id = "listWatchlist",
    summary = "The caller's watchlist, most recently added first",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of watchlist entries", body = Page<WatchlistEntryResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_watchlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<WatchlistEntryResponse>>, AppError> {
    let page = EngagementService::new(&state.db)
        .list_watchlist(auth_user.user_id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    put,
    path = "/history",
    tag = "Engagement",
    operation_id = "recordHistory",
    summary = "Record playback progress",
    description = "Overwrites any earlier progress for the same item.",
    request_body = HistoryRequest,
    responses(
        (status = 200, description = "Progress stored", body = HistoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Target not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn record_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<HistoryRequest>,
) -> Result<ApiResponse<HistoryResponse>, AppError> {
    let entry = EngagementService::new(&state.db)
        .record_history(auth_user.user_id, payload)
        .await?;
    Ok(ApiResponse::ok(entry.into()))
}

#[utoipa::path(
    get,
    path = "/history",
    tag = "Engagement",
    operation_id = "listHistory",
    summary = "The caller's watch and listen history, most recent first",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of history entries", body = Page<HistoryResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<HistoryResponse>>, AppError> {
    let page = EngagementService::new(&state.db)
        .list_history(auth_user.user_id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

#[utoipa::path(
    delete,
    path = "/history",
    tag = "Engagement",
    operation_id = "clearHistory",
    summary = "Clear the caller's history",
    responses(
        (status = 200, description = "Entries removed", body = AffectedResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn clear_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<AffectedResponse>, AppError> {
    let affected = EngagementService::new(&state.db)
        .clear_history(auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(AffectedResponse { affected }).with_message("History cleared"))
}
