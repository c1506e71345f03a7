use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AdminUser, AuthUser};
use crate::extractors::json::{AppJson, ValidJson};
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::music::{
    CreateMusicRequest, MusicDetailResponse, MusicListQuery, MusicResponse, PlayCountResponse,
    UpdateMusicRequest, validate_update_music,
};
use crate::models::shared::{Page, PageQuery};
use crate::response::ApiResponse;
use crate::services::music::MusicService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Music",
    operation_id = "listMusic",
    summary = "List tracks",
    description = "Filters by genre, artist and year. Sorts by `newest` (default), `oldest`, `title` or `popular`.",
    params(MusicListQuery),
    responses(
        (status = 200, description = "Page of tracks", body = Page<MusicResponse>),
        (status = 400, description = "Bad filter, sort or pagination (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_music(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MusicListQuery>,
) -> Result<ApiResponse<Page<MusicResponse>>, AppError> {
    let (filter, page) = query.into_parts()?;
    let tracks = MusicService::new(&state.db).list(&filter, page).await?;
    Ok(ApiResponse::ok(tracks.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/trending",
    tag = "Music",
    operation_id = "trendingMusic",
    summary = "Most played tracks",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of tracks", body = Page<MusicResponse>),
        (status = 400, description = "Bad pagination (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn trending_music(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<MusicResponse>>, AppError> {
    let tracks = MusicService::new(&state.db)
        .trending(query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(tracks.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/genres",
    tag = "Music",
    operation_id = "listMusicGenres",
    summary = "Distinct genres across all tracks",
    responses((status = 200, description = "Sorted genre names", body = Vec<String>)),
)]
#[instrument(skip(state))]
pub async fn music_genres(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<String>>, AppError> {
    Ok(ApiResponse::ok(MusicService::new(&state.db).genres().await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Music",
    operation_id = "getMusic",
    summary = "Get a track",
    params(("id" = i32, Path, description = "Track ID")),
    responses(
        (status = 200, description = "Track detail", body = MusicDetailResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Track not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(music_id = id))]
pub async fn get_music(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<MusicDetailResponse>, AppError> {
    let detail = MusicService::new(&state.db)
        .detail(id, auth_user.map(|u| u.user_id))
        .await?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    post,
    path = "/{id}/play",
    tag = "Music",
    operation_id = "recordPlay",
    summary = "Count one play of a track",
    params(("id" = i32, Path, description = "Track ID")),
    responses(
        (status = 200, description = "Play recorded", body = PlayCountResponse),
        (status = 404, description = "Track not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(music_id = id))]
pub async fn record_play(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<PlayCountResponse>, AppError> {
    let play_count = MusicService::new(&state.db).record_play(id).await?;
    Ok(ApiResponse::ok(PlayCountResponse { id, play_count }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Music",
    operation_id = "createMusic",
    summary = "Add a track",
    request_body = CreateMusicRequest,
    responses(
        (status = 201, description = "Track created", body = MusicResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Admin only (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.0.id, title = %payload.title))]
pub async fn create_music(
    admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateMusicRequest>,
) -> Result<ApiResponse<MusicResponse>, AppError> {
    let track = MusicService::new(&state.db).create(payload).await?;
    tracing::info!(music_id = track.id, "Track created");
    Ok(ApiResponse::created(track.into()).with_message("Track created"))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Music",
    operation_id = "updateMusic",
    summary = "Update a track",
    params(("id" = i32, Path, description = "Track ID")),
    request_body = UpdateMusicRequest,
    responses(
        (status = 200, description = "Track updated", body = MusicResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Admin only (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Track not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.0.id, music_id = id))]
pub async fn update_music(
    admin: AdminUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateMusicRequest>,
) -> Result<ApiResponse<MusicResponse>, AppError> {
    validate_update_music(&payload)?;
    let track = MusicService::new(&state.db).update(id, payload).await?;
    Ok(ApiResponse::ok(track.into()).with_message("Track updated"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Music",
    operation_id = "deleteMusic",
    summary = "Delete a track",
    params(("id" = i32, Path, description = "Track ID")),
    responses(
        (status = 200, description = "Track deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Admin only (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Track not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.0.id, music_id = id))]
pub async fn delete_music(
    admin: AdminUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>, AppError> {
    MusicService::new(&state.db).delete(id).await?;
    tracing::info!("Track deleted");
    Ok(ApiResponse::message("Track deleted"))
}
