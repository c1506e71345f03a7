use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String, // User ID as string
    pub user_id: i32,
    pub email: String,
    pub token_type: TokenType,
    /// Unique token id, used to revoke refresh tokens.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a token of the given type, valid for `ttl_secs`.
pub fn sign(
    user_id: i32,
    email: &str,
    token_type: TokenType,
    secret: &str,
    ttl_secs: i64,
) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        user_id,
        email: email.to_owned(),
        token_type,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

/// Verify a token's signature, expiry and type.
pub fn verify(token: &str, secret: &str, expected: TokenType) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    if token_data.claims.token_type != expected {
        return Err(AppError::TokenInvalid);
    }
    Ok(token_data.claims)
}
