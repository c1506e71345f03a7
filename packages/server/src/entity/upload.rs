use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PROCESSED: &str = "processed";
pub const STATUS_REJECTED: &str = "rejected";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub user_id: i32,
    pub filename: String,
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: i64,
    /// Hex SHA-256 of the stored blob.
    #[sea_orm(indexed)]
    pub content_hash: String,
    /// `video`, `audio` or `image`.
    pub kind: String,
    pub status: String,
    pub title: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
