use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, ValidJson};
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::engagement::EntityRefRequest;
use crate::models::shared::{EntityRefQuery, Page, PageQuery};
use crate::models::social::{
    CreateListRequest, FeedItem, FollowStatusResponse, ListDetailResponse, ListResponse,
    ProfileResponse, UpdateListRequest, UserSummary, validate_update_list,
};
use crate::response::ApiResponse;
use crate::services::social::SocialService;
use crate::state::AppState;

#[utoipa::path(
    put,
    path = "/users/{id}/follow",
    tag = "Social",
    operation_id = "followUser",
    summary = "Follow a user",
    description = "Idempotent. A new follow notifies the followed user.",
    params(("id" = i32, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Following", body = FollowStatusResponse),
        (status = 400, description = "Cannot follow yourself (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, target_id = id))]
pub async fn follow_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<FollowStatusResponse>, AppError> {
    let me = auth_user.fetch(&state.db).await?;
    let created = SocialService::new(&state.db).follow(&me, id).await?;
    let message = if created { "Followed" } else { "Already following" };
    Ok(ApiResponse::ok(FollowStatusResponse {
        user_id: id,
        following: true,
    })
    .with_message(message))
}

#[utoipa::path(
    delete,
    path = "/users/{id}/follow",
    tag = "Social",
    operation_id = "unfollowUser",
    summary = "Unfollow a user",
    params(("id" = i32, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "Not following", body = FollowStatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, target_id = id))]
pub async fn unfollow_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<FollowStatusResponse>, AppError> {
    SocialService::new(&state.db)
        .unfollow(auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::ok(FollowStatusResponse {
        user_id: id,
        following: false,
    })
    .with_message("Unfollowed"))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Social",
    operation_id = "getProfile",
    summary = "Public profile with follow counts",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(profile_id = id))]
pub async fn get_profile(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<ProfileResponse>, AppError> {
    let profile = SocialService::new(&state.db)
        .profile(id, auth_user.map(|u| u.user_id))
        .await?;
    Ok(ApiResponse::ok(profile))
}

#[utoipa::path(
    get,
    path = "/users/{id}/followers",
    tag = "Social",
    operation_id = "listFollowers",
    summary = "Users following this user",
    params(("id" = i32, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Page of users", body = Page<UserSummary>),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(profile_id = id))]
pub async fn list_followers(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<UserSummary>>, AppError> {
    let page = SocialService::new(&state.db)
        .followers(id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/users/{id}/following",
    tag = "Social",
    operation_id = "listFollowing",
    summary = "Users this user follows",
    params(("id" = i32, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Page of users", body = Page<UserSummary>),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(profile_id = id))]
pub async fn list_following(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<UserSummary>>, AppError> {
    let page = SocialService::new(&state.db)
        .following(id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/users/{id}/lists",
    tag = "Social",
    operation_id = "listPublicLists",
    summary = "A user's public lists",
    params(("id" = i32, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Page of lists", body = Page<ListResponse>),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(profile_id = id))]
pub async fn list_public_lists(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<ListResponse>>, AppError> {
    let page = SocialService::new(&state.db)
        .public_lists(id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/feed",
    tag = "Social",
    operation_id = "activityFeed",
    summary = "Recent ratings by followed users",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of feed items", body = Page<FeedItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn activity_feed(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<FeedItem>>, AppError> {
    let page = SocialService::new(&state.db)
        .feed(auth_user.user_id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/lists",
    tag = "Social",
    operation_id = "listMyLists",
    summary = "The caller's lists, public and private",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of lists", body = Page<ListResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn my_lists(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<ListResponse>>, AppError> {
    let page = SocialService::new(&state.db)
        .my_lists(auth_user.user_id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    post,
    path = "/lists",
    tag = "Social",
    operation_id = "createList",
    summary = "Create a list",
    request_body = CreateListRequest,
    responses(
        (status = 201, description = "List created", body = ListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_list(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateListRequest>,
) -> Result<ApiResponse<ListResponse>, AppError> {
    let list = SocialService::new(&state.db)
        .create_list(auth_user.user_id, payload)
        .await?;
    Ok(ApiResponse::created(ListResponse::new(list, 0)).with_message("List created"))
}

#[utoipa::path(
    get,
    path = "/lists/{id}",
    tag = "Social",
    operation_id = "getList",
    summary = "Get a list with its items",
    description = "Private lists are only visible to their owner.",
    params(("id" = i32, Path, description = "List ID")),
    responses(
        (status = 200, description = "List detail", body = ListDetailResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "List not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(list_id = id))]
pub async fn get_list(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<ListDetailResponse>, AppError> {
    let list = SocialService::new(&state.db)
        .get_list(id, auth_user.map(|u| u.user_id))
        .await?;
    Ok(ApiResponse::ok(list))
}

#[utoipa::path(
    patch,
    path = "/lists/{id}",
    tag = "Social",
    operation_id = "updateList",
    summary = "Update a list",
    params(("id" = i32, Path, description = "List ID")),
    request_body = UpdateListRequest,
    responses(
        (status = 200, description = "List updated", body = ListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "List not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, list_id = id))]
pub async fn update_list(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateListRequest>,
) -> Result<ApiResponse<ListResponse>, AppError> {
    validate_update_list(&payload)?;
    let service = SocialService::new(&state.db);
    service.update_list(auth_user.user_id, id, payload).await?;
    let detail = service.get_list(id, Some(auth_user.user_id)).await?;
    Ok(ApiResponse::ok(detail.list).with_message("List updated"))
}

#[utoipa::path(
    delete,
    path = "/lists/{id}",
    tag = "Social",
    operation_id = "deleteList",
    summary = "Delete a list and its items",
    params(("id" = i32, Path, description = "List ID")),
    responses(
        (status = 200, description = "List deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "List not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, list_id = id))]
pub async fn delete_list(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>, AppError> {
    SocialService::new(&state.db)
        .delete_list(auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::message("List deleted"))
}

#[utoipa::path(
    put,
    path = "/lists/{id}/items",
    tag = "Social",
    operation_id = "addListItem",
    summary = "Add a catalog item to a list",
    description = "Idempotent.",
    params(("id" = i32, Path, description = "List ID")),
    request_body = EntityRefRequest,
    responses(
        (status = 200, description = "Item present in list"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "List or item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, list_id = id))]
pub async fn add_list_item(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    ValidJson(payload): ValidJson<EntityRefRequest>,
) -> Result<ApiResponse<()>, AppError> {
    SocialService::new(&state.db)
        .add_list_item(auth_user.user_id, id, payload.entity_type, payload.entity_id)
        .await?;
    Ok(ApiResponse::message("Item added"))
}

#[utoipa::path(
    delete,
    path = "/lists/{id}/items",
    tag = "Social",
    operation_id = "removeListItem",
    summary = "Remove a catalog item from a list",
    params(("id" = i32, Path, description = "List ID"), EntityRefQuery),
    responses(
        (status = 200, description = "Item absent from list"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "List not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id, list_id = id))]
pub async fn remove_list_item(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<EntityRefQuery>,
) -> Result<ApiResponse<()>, AppError> {
    SocialService::new(&state.db)
        .remove_list_item(auth_user.user_id, id, query.entity_type, query.entity_id)
        .await?;
    Ok(ApiResponse::message("Item removed"))
}
