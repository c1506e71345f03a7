//! Helpers for rows that point at a catalog item through
//! `(entity_type, entity_id)` instead of a foreign key.

use sea_orm::*;

use crate::entity::{
    comment, favorite, history, list_item, movie, music, notification, playlist_item, rating,
    short, watchlist,
};
use crate::error::AppError;
use crate::models::shared::EntityKind;

/// 404 unless the referenced catalog item exists.
pub async fn ensure_exists<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    id: i32,
) -> Result<(), AppError> {
    let count = match kind {
        EntityKind::Movie => movie::Entity::find_by_id(id).count(conn).await?,
        EntityKind::Short => short::Entity::find_by_id(id).count(conn).await?,
        EntityKind::Music => music::Entity::find_by_id(id).count(conn).await?,
    };
    if count == 0 {
        return Err(AppError::NotFound(format!("{kind} {id} not found")));
    }
    Ok(())
}

/// Delete every row referencing the item. Run inside the transaction that
/// deletes the item itself.
pub async fn purge_references<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    id: i32,
) -> Result<(), AppError> {
    let kind_str = kind.as_str();

    favorite::Entity::delete_many()
        .filter(favorite::Column::EntityType.eq(kind_str))
        .filter(favorite::Column::EntityId.eq(id))
        .exec(conn)
        .await?;
    rating::Entity::delete_many()
        .filter(rating::Column::EntityType.eq(kind_str))
        .filter(rating::Column::EntityId.eq(id))
        .exec(conn)
        .await?;
    history::Entity::delete_many()
        .filter(history::Column::EntityType.eq(kind_str))
        .filter(history::Column::EntityId.eq(id))
        .exec(conn)
        .await?;
    comment::Entity::delete_many()
        .filter(comment::Column::EntityType.eq(kind_str))
        .filter(comment::Column::EntityId.eq(id))
        .exec(conn)
        .await?;
    list_item::Entity::delete_many()
        .filter(list_item::Column::EntityType.eq(kind_str))
        .filter(list_item::Column::EntityId.eq(id))
        .exec(conn)
        .await?;
    notification::Entity::delete_many()
        .filter(notification::Column::EntityType.eq(kind_str))
        .filter(notification::Column::EntityId.eq(id))
        .exec(conn)
        .await?;

    match kind {
        EntityKind::Movie => {
            watchlist::Entity::delete_many()
                .filter(watchlist::Column::MovieId.eq(id))
                .exec(conn)
                .await?;
        }
        EntityKind::Music => {
            playlist_item::Entity::delete_many()
                .filter(playlist_item::Column::MusicId.eq(id))
                .exec(conn)
                .await?;
        }
        EntityKind::Short => {}
    }

    Ok(())
}
