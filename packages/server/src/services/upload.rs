use std::str::FromStr;

use chrono::Utc;
use movies_space_common::storage::{BlobStore, ContentHash, StoredBlob};
use sea_orm::*;

use crate::entity::{music, upload};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::shared::{Page, PageRequest};
use crate::models::upload::{ConvertToMusicRequest, UploadKind, UploadStatus, content_url};
use crate::services::music::{MusicService, NewTrack};

/// Metadata for a blob that has already been written to the store.
pub struct NewUpload {
    pub filename: String,
    pub content_type: String,
    pub kind: UploadKind,
    pub title: Option<String>,
    pub blob: StoredBlob,
}

pub struct UploadService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UploadService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, new: NewUpload) -> Result<upload::Model, AppError> {
        let now = Utc::now();
        let model = upload::ActiveModel {
            user_id: Set(user_id),
            filename: Set(new.filename),
            content_type: Set(Some(new.content_type)),
            size: Set(i64::try_from(new.blob.size).unwrap_or(i64::MAX)),
            content_hash: Set(new.blob.hash.to_hex()),
            kind: Set(new.kind.as_str().to_string()),
            status: Set(upload::STATUS_PENDING.to_string()),
            title: Set(new.title),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.conn).await?)
    }

    pub async fn find(&self, id: i32) -> Result<upload::Model, AppError> {
        upload::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {id} not found")))
    }

    /// Owner or admin only.
    pub async fn get(&self, caller: &AuthUser, id: i32) -> Result<upload::Model, AppError> {
        let upload = self.find(id).await?;
        caller.require_owner_or_admin(self.conn, upload.user_id).await?;
        Ok(upload)
    }

    /// Processed uploads are public. Anything else needs the owner or an admin.
    pub async fn readable(
        &self,
        caller: Option<&AuthUser>,
        id: i32,
    ) -> Result<upload::Model, AppError> {
        let upload = self.find(id).await?;
        if upload.status == upload::STATUS_PROCESSED {
            return Ok(upload);
        }
        let caller = caller.ok_or(AppError::TokenMissing)?;
        caller.require_owner_or_admin(self.conn, upload.user_id).await?;
        Ok(upload)
    }

    pub async fn list_mine(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<upload::Model>, AppError> {
        let query = upload::Entity::find().filter(upload::Column::UserId.eq(user_id));
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(upload::Column::CreatedAt)
            .order_by_desc(upload::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(rows, total, page))
    }

    /// Every user's uploads, newest first.
    pub async fn list_all(
        &self,
        status: Option<UploadStatus>,
        page: PageRequest,
    ) -> Result<Page<upload::Model>, AppError> {
        let mut query = upload::Entity::find();
        if let Some(status) = status {
            query = query.filter(upload::Column::Status.eq(status.as_str()));
        }
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(upload::Column::CreatedAt)
            .order_by_desc(upload::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(rows, total, page))
    }

    /// Delete the row, then the blob if no other upload shares its content.
    pub async fn delete(
        &self,
        caller: &AuthUser,
        id: i32,
        blobs: &dyn BlobStore,
    ) -> Result<(), AppError> {
        let upload = self.get(caller, id).await?;
        upload::Entity::delete_by_id(id).exec(self.conn).await?;

        let hash = ContentHash::from_str(&upload.content_hash)?;
        self.release_blob(&hash, blobs).await
    }

    /// Remove a blob from the store unless some upload row still points at it.
    pub async fn release_blob(
        &self,
        hash: &ContentHash,
        blobs: &dyn BlobStore,
    ) -> Result<(), AppError> {
        let hex = hash.to_hex();
        let still_referenced = upload::Entity::find()
            .filter(upload::Column::ContentHash.eq(&hex))
            .count(self.conn)
            .await?;
        if still_referenced > 0 {
            return Ok(());
        }
        match blobs.remove(hash).await {
            Ok(true) => tracing::debug!(hash = %hex, "Removed unreferenced blob"),
            Ok(false) => {}
            // No row needs it; a leftover blob only costs disk space.
            Err(e) => tracing::warn!(hash = %hex, "Failed to remove blob: {e}"),
        }
        Ok(())
    }

    /// Turn a pending audio upload into a music track pointing at its content.
    pub async fn convert_to_music(
        &self,
        caller: &AuthUser,
        id: i32,
        payload: ConvertToMusicRequest,
    ) -> Result<music::Model, AppError>
    where
        C: TransactionTrait,
    {
        let upload = self.get(caller, id).await?;
        if upload.kind != UploadKind::Audio.as_str() {
            return Err(AppError::Validation(
                "Only audio uploads can be converted to music".into(),
            ));
        }
        if upload.status != upload::STATUS_PENDING {
            return Err(AppError::Validation(format!(
                "Upload is already {}",
                upload.status
            )));
        }

        let artist = match payload.artist {
            Some(artist) => artist.trim().to_string(),
            None => caller.fetch(self.conn).await?.username,
        };
        let title = payload
            .title
            .or_else(|| upload.title.clone())
            .unwrap_or_else(|| upload.filename.clone());

        let txn = self.conn.begin().await?;
        let track = MusicService::new(&txn)
            .create_from(NewTrack {
                title: title.trim().to_string(),
                artist,
                audio_url: content_url(upload.id),
                duration_seconds: payload.duration_seconds,
                uploaded_by: Some(upload.user_id),
            })
            .await?;

        let mut active: upload::ActiveModel = upload.into();
        active.status = Set(upload::STATUS_PROCESSED.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        txn.commit().await?;

        Ok(track)
    }
}
