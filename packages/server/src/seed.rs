use chrono::Utc;
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::AdminBootstrapConfig;
use crate::entity::{comment, notification, rating, user};
use crate::utils::hash::hash_password;

async fn create_index(db: &DatabaseConnection, name: &str, stmt: &mut IndexCreateStatement) {
    let sql = stmt.if_not_exists().name(name).to_string(PostgresQueryBuilder);
    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => tracing::warn!("Failed to create index {name}: {e}"),
    }
}

/// Ensure composite indexes exist.
///
/// Schema sync only creates single-column indexes, so these are created
/// manually on startup. Failures are logged and do not stop the server.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Top-level comment listing per catalog item, newest first.
    create_index(
        db,
        "idx_comment_entity_created",
        Index::create()
            .table(comment::Entity)
            .col(comment::Column::EntityType)
            .col(comment::Column::EntityId)
            .col(comment::Column::CreatedAt),
    )
    .await;

    // Rating summaries aggregate by item; the primary key leads with user_id.
    create_index(
        db,
        "idx_rating_entity",
        Index::create()
            .table(rating::Entity)
            .col(rating::Column::EntityType)
            .col(rating::Column::EntityId),
    )
    .await;

    // Unread counts and the notification inbox.
    create_index(
        db,
        "idx_notification_user_read_created",
        Index::create()
            .table(notification::Entity)
            .col(notification::Column::UserId)
            .col(notification::Column::IsRead)
            .col(notification::Column::CreatedAt),
    )
    .await;

    Ok(())
}

/// Create the configured admin account if neither its email nor its
/// username is taken.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    admin: &AdminBootstrapConfig,
) -> Result<(), DbErr> {
    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(&admin.email))
                .add(user::Column::Username.eq(&admin.username)),
        )
        .one(db)
        .await?;

    if let Some(existing) = existing {
        if !existing.is_admin() {
            tracing::warn!(
                username = %existing.username,
                "Bootstrap admin account exists without the admin role; leaving it unchanged"
            );
        }
        return Ok(());
    }

    let password = hash_password(&admin.password)
        .map_err(|e| DbErr::Custom(format!("Failed to hash admin password: {e}")))?;
    let now = Utc::now();
    let model = user::ActiveModel {
        username: Set(admin.username.clone()),
        email: Set(admin.email.clone()),
        password: Set(password),
        display_name: Set(None),
        bio: Set(None),
        avatar_url: Set(None),
        role: Set(user::ROLE_ADMIN.to_string()),
        is_banned: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await?;
    info!(username = %admin.username, "Created bootstrap admin account");
    Ok(())
}
