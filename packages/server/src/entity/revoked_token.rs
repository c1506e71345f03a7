use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A refresh token that can no longer be exchanged.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "revoked_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub jti: String,

    pub user_id: i32,
    /// Original expiry of the token; rows past it can be purged.
    pub expires_at: DateTimeUtc,
    pub revoked_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
