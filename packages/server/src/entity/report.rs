use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_OPEN: &str = "open";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub reporter_id: i32,
    pub target_type: String,
    pub target_id: i32,
    pub reason: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    /// `open`, `resolved` or `dismissed`.
    #[sea_orm(indexed)]
    pub status: String,
    pub resolved_by: Option<i32>,

    pub created_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
