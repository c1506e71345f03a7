use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::comment::{
    CommentListQuery, CommentResponse, CreateCommentRequest, UpdateCommentRequest,
    normalize_body,
};
use crate::models::notification::AffectedResponse;
use crate::models::shared::{Page, PageQuery};
use crate::response::ApiResponse;
use crate::services::comment::CommentService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Comments",
    operation_id = "listComments",
    summary = "Top-level comments on an item, newest first",
    params(CommentListQuery),
    responses(
        (status = 200, description = "Page of comments", body = Page<CommentResponse>),
        (status = 400, description = "Bad entity reference or pagination (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Target not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_comments(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CommentListQuery>,
) -> Result<ApiResponse<Page<CommentResponse>>, AppError> {
    let (kind, entity_id, page) = query.into_parts()?;
    let comments = CommentService::new(&state.db)
        .list(kind, entity_id, page)
        .await?;
    Ok(ApiResponse::ok(comments))
}

#[utoipa::path(
    get,
    path = "/{id}/replies",
    tag = "Comments",
    operation_id = "listReplies",
    summary = "Replies to a comment, oldest first",
    params(("id" = i32, Path, description = "Parent comment ID"), PageQuery),
    responses(
        (status = 200, description = "Page of replies", body = Page<CommentResponse>),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(comment_id = id))]
pub async fn list_replies(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<CommentResponse>>, AppError> {
    let replies = CommentService::new(&state.db)
        .replies(id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(replies))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on an item or reply to a comment",
    description = "Body is trimmed and must be 1-2000 characters. Replying notifies the parent's author.",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account banned (ACCOUNT_BANNED)", body = ErrorBody),
        (status = 404, description = "Target or parent not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(
    user_id = auth_user.user_id,
    entity_type = %payload.entity_type,
    entity_id = payload.entity_id,
))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let body = normalize_body(&payload.body)?;
    let author = auth_user.fetch(&state.db).await?;
    if author.is_banned {
        return Err(AppError::AccountBanned);
    }
    let comment = CommentService::new(&state.db)
        .create(&author, payload, body)
        .await?;
    Ok(ApiResponse::created(comment).with_message("Comment posted"))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit a comment",
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, comment_id = id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let body = normalize_body(&payload.body)?;
    let comment = CommentService::new(&state.db)
        .update(auth_user.user_id, id, body)
        .await?;
    Ok(ApiResponse::ok(comment).with_message("Comment updated"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment and all replies beneath it",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Number of comments removed", body = AffectedResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, comment_id = id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<AffectedResponse>, AppError> {
    let affected = CommentService::new(&state.db)
        .delete(&auth_user, id)
        .await?;
    Ok(ApiResponse::ok(AffectedResponse { affected }).with_message("Comment deleted"))
}
