use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::notification::{
    AffectedResponse, NotificationListQuery, NotificationResponse, UnreadCountResponse,
};
use crate::models::shared::Page;
use crate::response::ApiResponse;
use crate::services::notification::NotificationService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listNotifications",
    summary = "List the caller's notifications, newest first",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Page of notifications", body = Page<NotificationResponse>),
        (status = 400, description = "Bad pagination (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NotificationListQuery>,
) -> Result<ApiResponse<Page<NotificationResponse>>, AppError> {
    let (unread_only, page) = query.into_parts()?;
    let items = NotificationService::new(&state.db)
        .list(auth_user.user_id, unread_only, page)
        .await?;
    Ok(ApiResponse::ok(items.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/unread-count",
    tag = "Notifications",
    operation_id = "unreadNotificationCount",
    summary = "Count unread notifications",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn unread_count(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<UnreadCountResponse>, AppError> {
    let count = NotificationService::new(&state.db)
        .unread_count(auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

#[utoipa::path(
    put,
    path = "/{id}/read",
    tag = "Notifications",
    operation_id = "markNotificationRead",
    summary = "Mark one notification read",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read", body = NotificationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not the caller's (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, notification_id = id))]
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<NotificationResponse>, AppError> {
    let note = NotificationService::new(&state.db)
        .mark_read(auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::ok(note.into()))
}

#[utoipa::path(
    post,
    path = "/read-all",
    tag = "Notifications",
    operation_id = "markAllNotificationsRead",
    summary = "Mark every notification read",
    responses(
        (status = 200, description = "Number of notifications marked", body = AffectedResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn mark_all_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<AffectedResponse>, AppError> {
    let affected = NotificationService::new(&state.db)
        .mark_all_read(auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(AffectedResponse { affected }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Notifications",
    operation_id = "deleteNotification",
    summary = "Delete one notification",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not the caller's (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, notification_id = id))]
pub async fn delete_notification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>, AppError> {
    NotificationService::new(&state.db)
        .delete(auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::message("Notification deleted"))
}
