use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::ValidJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::shared::Page;
use crate::models::short::{
    CreateShortRequest, ShortDetailResponse, ShortListQuery, ShortResponse,
};
use crate::response::ApiResponse;
use crate::services::short::ShortService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Shorts",
    operation_id = "listShorts",
    summary = "Shorts feed, newest first",
    params(ShortListQuery),
    responses(
        (status = 200, description = "Page of shorts", body = Page<ShortResponse>),
        (status = 400, description = "Bad pagination (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_shorts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ShortListQuery>,
) -> Result<ApiResponse<Page<ShortResponse>>, AppError> {
    let (user_id, page) = query.into_parts()?;
    let shorts = ShortService::new(&state.db).list(user_id, page).await?;
    Ok(ApiResponse::ok(shorts))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Shorts",
    operation_id = "getShort",
    summary = "Get a short",
    description = "Counts a view.",
    params(("id" = i32, Path, description = "Short ID")),
    responses(
        (status = 200, description = "Short detail", body = ShortDetailResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Short not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(short_id = id))]
pub async fn get_short(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<ShortDetailResponse>, AppError> {
    let detail = ShortService::new(&state.db)
        .view(id, auth_user.map(|u| u.user_id))
        .await?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Shorts",
    operation_id = "createShort",
    summary = "Post a short",
    description = "The author's followers receive a `new_short` notification.",
    request_body = CreateShortRequest,
    responses(
        (status = 201, description = "Short posted", body = ShortResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account banned (ACCOUNT_BANNED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_short(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateShortRequest>,
) -> Result<ApiResponse<ShortResponse>, AppError> {
    let author = auth_user.fetch(&state.db).await?;
    if author.is_banned {
        return Err(AppError::AccountBanned);
    }
    let short = ShortService::new(&state.db).create(author, payload).await?;
    tracing::info!(short_id = short.id, "Short posted");
    Ok(ApiResponse::created(short).with_message("Short posted"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Shorts",
    operation_id = "deleteShort",
    summary = "Delete a short",
    description = "Only the author or an admin may delete.",
    params(("id" = i32, Path, description = "Short ID")),
    responses(
        (status = 200, description = "Short deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Short not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, short_id = id))]
pub async fn delete_short(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>, AppError> {
    ShortService::new(&state.db).delete(&auth_user, id).await?;
    Ok(ApiResponse::message("Short deleted"))
}
