use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AdminUser, AuthUser};
use crate::extractors::json::{AppJson, ValidJson};
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::movie::{
    CreateMovieRequest, MovieDetailResponse, MovieListQuery, MovieResponse, UpdateMovieRequest,
    validate_update_movie,
};
use crate::models::shared::{Page, PageQuery};
use crate::response::ApiResponse;
use crate::services::movie::MovieService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Movies",
    operation_id = "listMovies",
    summary = "List movies",
    description = "Filters by genre (case-insensitive), year and type. Sorts by `newest` (default), `oldest`, `title`, `popular` or `year`.",
    params(MovieListQuery),
    responses(
        (status = 200, description = "Page of movies", body = Page<MovieResponse>),
        (status = 400, description = "Bad filter, sort or pagination (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_movies(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MovieListQuery>,
) -> Result<ApiResponse<Page<MovieResponse>>, AppError> {
    let (filter, page) = query.into_parts()?;
    let movies = MovieService::new(&state.db).list(&filter, page).await?;
    Ok(ApiResponse::ok(movies.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/trending",
    tag = "Movies",
    operation_id = "trendingMovies",
    summary = "Most viewed movies",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of movies", body = Page<MovieResponse>),
        (status = 400, description = "Bad pagination (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn trending_movies(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<MovieResponse>>, AppError> {
    let movies = MovieService::new(&state.db)
        .trending(query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(movies.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/genres",
    tag = "Movies",
    operation_id = "listMovieGenres",
    summary = "Distinct genres across the movie catalog",
    responses(
        (status = 200, description = "Sorted genre names", body = Vec<String>),
    ),
)]
#[instrument(skip(state))]
pub async fn movie_genres(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<String>>, AppError> {
    Ok(ApiResponse::ok(MovieService::new(&state.db).genres().await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Movies",
    operation_id = "getMovie",
    summary = "Get a movie",
    description = "Counts a view. With a bearer token the response also carries `userRating`, `isFavorite` and `inWatchlist`.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie detail", body = MovieDetailResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(movie_id = id))]
pub async fn get_movie(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<MovieDetailResponse>, AppError> {
    let detail = MovieService::new(&state.db)
        .view(id, auth_user.map(|u| u.user_id))
        .await?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Movies",
    operation_id = "createMovie",
    summary = "Add a movie to the catalog",
    request_body = CreateMovieRequest,
    responses(
        (status = 201, description = "Movie created", body = MovieResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Admin only (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.0.id, title = %payload.title))]
pub async fn create_movie(
    admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateMovieRequest>,
) -> Result<ApiResponse<MovieResponse>, AppError> {
    let movie = MovieService::new(&state.db).create(payload).await?;
    tracing::info!(movie_id = movie.id, "Movie created");
    Ok(ApiResponse::created(movie.into()).with_message("Movie created"))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Movies",
    operation_id = "updateMovie",
    summary = "Update a movie",
    description = "PATCH semantics: absent fields are kept, `null` clears a nullable field.",
    params(("id" = i32, Path, description = "Movie ID")),
    request_body = UpdateMovieRequest,
    responses(
        (status = 200, description = "Movie updated", body = MovieResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Admin only (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.0.id, movie_id = id))]
pub async fn update_movie(
    admin: AdminUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateMovieRequest>,
) -> Result<ApiResponse<MovieResponse>, AppError> {
    validate_update_movie(&payload)?;
    let movie = MovieService::new(&state.db).update(id, payload).await?;
    Ok(ApiResponse::ok(movie.into()).with_message("Movie updated"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Movies",
    operation_id = "deleteMovie",
    summary = "Delete a movie",
    description = "Also removes its ratings, favorites, history, comments, list items and watchlist entries.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Admin only (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.0.id, movie_id = id))]
pub async fn delete_movie(
    admin: AdminUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>, AppError> {
    MovieService::new(&state.db).delete(id).await?;
    tracing::info!("Movie deleted");
    Ok(ApiResponse::message("Movie deleted"))
}
