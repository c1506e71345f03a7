use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "music")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(indexed)]
    pub artist: String,
    pub album: Option<String>,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub duration_seconds: i32,
    pub audio_url: String,
    pub cover_url: Option<String>,

    #[sea_orm(default_value = 0)]
    pub play_count: i64,
    /// Set when the track was created from a user upload.
    pub uploaded_by: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
