use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Recipient.
    pub user_id: i32,
    /// User whose action triggered the notification, if any.
    pub actor_id: Option<i32>,
    /// `follow`, `reply`, `new_short` or `report_update`.
    pub kind: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    pub message: String,
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
