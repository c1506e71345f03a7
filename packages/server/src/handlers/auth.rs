use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, ValidJson};
use crate::models::auth::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    TokenPair, UpdateProfileRequest, UserResponse, validate_update_profile,
};
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates a user with the `user` role and returns it with a fresh token pair. Disabled when `features.registration_enabled` is off.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Registration disabled (FEATURE_DISABLED)", body = ErrorBody),
        (status = 409, description = "Username or email taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    if !state.config.features.registration_enabled {
        return Err(AppError::FeatureDisabled("Registration"));
    }

    let service = AuthService::new(&state.db, &state.config.auth);
    let user = service.register(payload).await?;
    let tokens = service.issue_tokens(&user)?;
    tracing::info!(user_id = user.id, "User registered");

    Ok(ApiResponse::created(AuthResponse {
        user: user.into(),
        tokens,
    })
    .with_message("Registration successful"))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Account banned (ACCOUNT_BANNED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let service = AuthService::new(&state.db, &state.config.auth);
    let user = service.login(&payload.email, &payload.password).await?;
    let tokens = service.issue_tokens(&user)?;

    Ok(ApiResponse::ok(AuthResponse {
        user: user.into(),
        tokens,
    })
    .with_message("Login successful"))
}

#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Auth",
    operation_id = "refreshTokens",
    summary = "Exchange a refresh token for a new token pair",
    description = "The submitted refresh token is revoked; reusing it afterwards fails with TOKEN_INVALID.",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid, expired or revoked token (TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account banned (ACCOUNT_BANNED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RefreshRequest>,
) -> Result<ApiResponse<TokenPair>, AppError> {
    let (_, tokens) = AuthService::new(&state.db, &state.config.auth)
        .refresh(&payload.refresh_token)
        .await?;
    Ok(ApiResponse::ok(tokens).with_message("Token refreshed"))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Revoke a refresh token",
    description = "Access tokens stay valid until they expire.",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn logout(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RefreshRequest>,
) -> Result<ApiResponse<()>, AppError> {
    AuthService::new(&state.db, &state.config.auth)
        .logout(&payload.refresh_token)
        .await?;
    Ok(ApiResponse::message("Logged out"))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getMe",
    summary = "Get the current user's account",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = AuthService::new(&state.db, &state.config.auth)
        .me(auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Auth",
    operation_id = "updateMe",
    summary = "Update the current user's profile",
    description = "PATCH semantics: absent fields are kept, `null` clears a field.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    validate_update_profile(&payload)?;
    let user = AuthService::new(&state.db, &state.config.auth)
        .update_profile(auth_user.user_id, payload)
        .await?;
    Ok(ApiResponse::ok(user.into()).with_message("Profile updated"))
}

#[utoipa::path(
    put,
    path = "/password",
    tag = "Auth",
    operation_id = "changePassword",
    summary = "Change the current user's password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Validation error or wrong current password (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    AuthService::new(&state.db, &state.config.auth)
        .change_password(auth_user.user_id, payload)
        .await?;
    Ok(ApiResponse::message("Password changed"))
}
