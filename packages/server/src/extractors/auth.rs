use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{self, TokenType};

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. Use
/// `Option<AuthUser>` on endpoints that only personalise their output.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

impl AuthUser {
    /// Load the user's row. A token for a deleted account is treated as invalid.
    pub async fn fetch<C: ConnectionTrait>(&self, conn: &C) -> Result<user::Model, AppError> {
        user::Entity::find_by_id(self.user_id)
            .one(conn)
            .await?
            .ok_or(AppError::TokenInvalid)
    }

    /// Returns `Ok(())` if the user owns the resource or is an admin.
    pub async fn require_owner_or_admin<C: ConnectionTrait>(
        &self,
        conn: &C,
        owner_id: i32,
    ) -> Result<(), AppError> {
        if self.user_id == owner_id || self.fetch(conn).await?.is_admin() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

/// `Ok(None)` when the header is absent.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AppError::TokenInvalid)?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or(AppError::TokenInvalid)
}

fn decode(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = jwt::verify(token, &state.config.auth.jwt_secret, TokenType::Access)?;
    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.email,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AppError::TokenMissing)?;
        decode(token, &AppState::from_ref(state))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => decode(token, &AppState::from_ref(state)).map(Some),
            None => Ok(None),
        }
    }
}

/// An authenticated, unbanned user with the `admin` role.
pub struct AdminUser(pub user::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        let app = AppState::from_ref(state);
        let user = auth.fetch(&app.db).await?;
        if !user.is_admin() || user.is_banned {
            return Err(AppError::PermissionDenied);
        }
        Ok(AdminUser(user))
    }
}
