use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, ValidJson};
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::playlist::{
    AddTrackRequest, CreatePlaylistRequest, PlaylistDetailResponse, PlaylistResponse,
    UpdatePlaylistRequest, validate_update_playlist,
};
use crate::models::shared::{Page, PageQuery};
use crate::response::ApiResponse;
use crate::services::playlist::PlaylistService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Playlists",
    operation_id = "listMyPlaylists",
    summary = "The caller's playlists",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of playlists", body = Page<PlaylistResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_playlists(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<PlaylistResponse>>, AppError> {
    let page = PlaylistService::new(&state.db)
        .list_mine(auth_user.user_id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Playlists",
    operation_id = "createPlaylist",
    summary = "Create a playlist",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist created", body = PlaylistResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistResponse>, AppError> {
    let playlist = PlaylistService::new(&state.db)
        .create(auth_user.user_id, payload)
        .await?;
    Ok(ApiResponse::created(PlaylistResponse::new(playlist, 0)).with_message("Playlist created"))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Playlists",
    operation_id = "getPlaylist",
    summary = "Get a playlist with its tracks in order",
    description = "Private playlists are only visible to their owner.",
    params(("id" = i32, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist detail", body = PlaylistDetailResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(playlist_id = id))]
pub async fn get_playlist(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<PlaylistDetailResponse>, AppError> {
    let playlist = PlaylistService::new(&state.db)
        .get(id, auth_user.map(|u| u.user_id))
        .await?;
    Ok(ApiResponse::ok(playlist))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Playlists",
    operation_id = "updatePlaylist",
    summary = "Update a playlist",
    params(("id" = i32, Path, description = "Playlist ID")),
    request_body = UpdatePlaylistRequest,
    responses(
        (status = 200, description = "Playlist updated", body = PlaylistDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, playlist_id = id))]
pub async fn update_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistDetailResponse>, AppError> {
    validate_update_playlist(&payload)?;
    let service = PlaylistService::new(&state.db);
    service.update(auth_user.user_id, id, payload).await?;
    let detail = service.get(id, Some(auth_user.user_id)).await?;
    Ok(ApiResponse::ok(detail).with_message("Playlist updated"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Playlists",
    operation_id = "deletePlaylist",
    summary = "Delete a playlist",
    params(("id" = i32, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, playlist_id = id))]
pub async fn delete_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>, AppError> {
    PlaylistService::new(&state.db)
        .delete(auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::message("Playlist deleted"))
}

#[utoipa::path(
    put,
    path = "/{id}/tracks",
    tag = "Playlists",
    operation_id = "addPlaylistTrack",
    summary = "Append a track",
    description = "The track goes after the current last position. Adding a track twice keeps the first position.",
    params(("id" = i32, Path, description = "Playlist ID")),
    request_body = AddTrackRequest,
    responses(
        (status = 200, description = "Updated playlist", body = PlaylistDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Playlist or track not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, playlist_id = id, music_id = payload.music_id))]
pub async fn add_track(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    ValidJson(payload): ValidJson<AddTrackRequest>,
) -> Result<ApiResponse<PlaylistDetailResponse>, AppError> {
    let service = PlaylistService::new(&state.db);
    service
        .add_track(auth_user.user_id, id, payload.music_id)
        .await?;
    let detail = service.get(id, Some(auth_user.user_id)).await?;
    Ok(ApiResponse::ok(detail).with_message("Track added"))
}

#[utoipa::path(
    delete,
    path = "/{id}/tracks/{music_id}",
    tag = "Playlists",
    operation_id = "removePlaylistTrack",
    summary = "Remove a track",
    params(
        ("id" = i32, Path, description = "Playlist ID"),
        ("music_id" = i32, Path, description = "Track ID"),
    ),
    responses(
        (status = 200, description = "Track not in playlist"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn remove_track(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((id, music_id)): AppPath<(i32, i32)>,
) -> Result<ApiResponse<()>, AppError> {
    PlaylistService::new(&state.db)
        .remove_track(auth_user.user_id, id, music_id)
        .await?;
    Ok(ApiResponse::message("Track removed"))
}
