use chrono::{TimeZone, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::config::AuthConfig;
use crate::entity::{revoked_token, user};
use crate::error::AppError;
use crate::models::auth::{
    ChangePasswordRequest, RegisterRequest, TokenPair, UpdateProfileRequest,
};
use crate::utils::hash;
use crate::utils::jwt::{self, Claims, TokenType};

pub struct AuthService<'a, C: ConnectionTrait> {
    conn: &'a C,
    config: &'a AuthConfig,
}

impl<'a, C: ConnectionTrait> AuthService<'a, C> {
    pub fn new(conn: &'a C, config: &'a AuthConfig) -> Self {
        Self { conn, config }
    }

    pub async fn register(&self, payload: RegisterRequest) -> Result<user::Model, AppError> {
        let username = payload.username.trim().to_string();
        let email = payload.email.trim().to_lowercase();

        let taken = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(&username))
                    .add(user::Column::Email.eq(&email)),
            )
            .one(self.conn)
            .await?;
        if let Some(existing) = taken {
            return Err(if existing.email == email {
                AppError::Conflict("Email is already registered".into())
            } else {
                AppError::Conflict("Username is already taken".into())
            });
        }

        let hash = hash::hash_password(&payload.password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

        let now = Utc::now();
        let new_user = user::ActiveModel {
            username: Set(username),
            email: Set(email),
            password: Set(hash),
            display_name: Set(payload.display_name.map(|n| n.trim().to_string())),
            bio: Set(None),
            avatar_url: Set(None),
            role: Set(user::ROLE_USER.to_string()),
            is_banned: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        new_user.insert(self.conn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!("Registration race condition: unique constraint caught on insert");
                AppError::Conflict("Username or email is already registered".into())
            }
            _ => AppError::from(e),
        })
    }

    /// Check credentials. Unknown email and wrong password look the same.
    pub async fn login(&self, email: &str, password: &str) -> Result<user::Model, AppError> {
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.conn)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_valid = hash::verify_password(password, &user.password)
            .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }
        if user.is_banned {
            return Err(AppError::AccountBanned);
        }
        Ok(user)
    }

    pub fn issue_tokens(&self, user: &user::Model) -> Result<TokenPair, AppError> {
        let sign = |token_type, secret: &str, ttl| {
            jwt::sign(user.id, &user.email, token_type, secret, ttl)
                .map(|(token, _)| token)
                .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))
        };

        Ok(TokenPair {
            access_token: sign(
                TokenType::Access,
                &self.config.jwt_secret,
                self.config.access_ttl_secs,
            )?,
            refresh_token: sign(
                TokenType::Refresh,
                &self.config.jwt_refresh_secret,
                self.config.refresh_ttl_secs,
            )?,
            token_type: "Bearer",
            expires_in: self.config.access_ttl_secs,
        })
    }

    /// Exchange a refresh token for a new pair, revoking the old one.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(user::Model, TokenPair), AppError> {
        let claims = jwt::verify(
            refresh_token,
            &self.config.jwt_refresh_secret,
            TokenType::Refresh,
        )?;

        let user = user::Entity::find_by_id(claims.user_id)
            .one(self.conn)
            .await?
            .ok_or(AppError::TokenInvalid)?;
        if user.is_banned {
            return Err(AppError::AccountBanned);
        }

        // Fails for an already revoked jti, including a concurrent refresh
        // of the same token.
        if !self.revoke(&claims).await? {
            return Err(AppError::TokenInvalid);
        }

        let tokens = self.issue_tokens(&user)?;
        Ok((user, tokens))
    }

    /// Revoke a refresh token. Revoking it twice is not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let claims = jwt::verify(
            refresh_token,
            &self.config.jwt_refresh_secret,
            TokenType::Refresh,
        )?;
        self.revoke(&claims).await?;
        Ok(())
    }

    /// Returns `false` when the token was already revoked.
    async fn revoke(&self, claims: &Claims) -> Result<bool, AppError> {
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now);

        let row = revoked_token::ActiveModel {
            jti: Set(claims.jti.clone()),
            user_id: Set(claims.user_id),
            expires_at: Set(expires_at),
            revoked_at: Set(Utc::now()),
        };

        let result = revoked_token::Entity::insert(row)
            .on_conflict(
                OnConflict::column(revoked_token::Column::Jti)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(inserted) => Ok(inserted > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete revocation rows whose tokens would have expired anyway.
    pub async fn purge_expired_revocations(&self) -> Result<u64, AppError> {
        let res = revoked_token::Entity::delete_many()
            .filter(revoked_token::Column::ExpiresAt.lt(Utc::now()))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn me(&self, user_id: i32) -> Result<user::Model, AppError> {
        user::Entity::find_by_id(user_id)
            .one(self.conn)
            .await?
            .ok_or(AppError::TokenInvalid)
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        payload: UpdateProfileRequest,
    ) -> Result<user::Model, AppError> {
        let existing = self.me(user_id).await?;
        let mut active: user::ActiveModel = existing.into();

        if let Some(name) = payload.display_name {
            active.display_name = Set(name.map(|n| n.trim().to_string()));
        }
        if let Some(bio) = payload.bio {
            active.bio = Set(bio);
        }
        if let Some(url) = payload.avatar_url {
            active.avatar_url = Set(url);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.conn).await?)
    }

    pub async fn change_password(
        &self,
        user_id: i32,
        payload: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let existing = self.me(user_id).await?;

        let is_valid = hash::verify_password(&payload.current_password, &existing.password)
            .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
        if !is_valid {
            return Err(AppError::Validation("Current password is incorrect".into()));
        }

        let hash = hash::hash_password(&payload.new_password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

        let mut active: user::ActiveModel = existing.into();
        active.password = Set(hash);
        active.updated_at = Set(Utc::now());
        active.update(self.conn).await?;
        Ok(())
    }
}
