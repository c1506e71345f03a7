use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub genres: Vec<String>,
    #[sea_orm(indexed)]
    pub year: i32,
    /// `movie`, `series` or `documentary`.
    pub kind: String,
    pub duration_minutes: Option<i32>,
    pub poster_url: Option<String>,
    pub video_url: Option<String>,

    #[sea_orm(default_value = 0)]
    pub view_count: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
