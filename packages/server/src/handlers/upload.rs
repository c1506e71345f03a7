use std::str::FromStr;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use movies_space_common::storage::{BlobStore, BoxReader, ContentHash, StoredBlob};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::upload;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::ValidJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::music::MusicResponse;
use crate::models::shared::{Page, PageQuery};
use crate::models::upload::{ConvertToMusicRequest, UploadKind, UploadResponse};
use crate::response::ApiResponse;
use crate::services::upload::{NewUpload, UploadService};
use crate::state::AppState;
use crate::utils::filename::{content_disposition_value, guess_content_type, validate_upload_filename};

/// Multipart framing on top of the largest accepted file.
pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_blob_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(64 * 1024))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Uploads",
    operation_id = "createUpload",
    summary = "Upload a media file",
    description = "The `file` multipart field is required and `title` is optional. The kind \
        (`video`, `audio` or `image`) is derived from the file extension; other types are rejected. \
        New uploads start `pending`.",
    request_body(content_type = "multipart/form-data", description = "File upload with optional title"),
    responses(
        (status = 201, description = "Upload stored", body = UploadResponse),
        (status = 400, description = "Missing file, bad filename, unsupported type or too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Uploads disabled or account banned (FEATURE_DISABLED, ACCOUNT_BANNED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<UploadResponse>, AppError> {
    if !state.config.features.uploads_enabled {
        return Err(AppError::FeatureDisabled("Uploads"));
    }
    if auth_user.fetch(&state.db).await?.is_banned {
        return Err(AppError::AccountBanned);
    }

    let mut stored: Option<StoredBlob> = None;
    let created = async {
        let (filename, title) = read_upload_form(&mut multipart, &state, &mut stored).await?;
        let blob = stored.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
        let filename =
            filename.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
        let (kind, content_type) = upload_kind(&filename)?;

        UploadService::new(&state.db)
            .create(
                auth_user.user_id,
                NewUpload {
                    filename,
                    content_type,
                    kind,
                    title,
                    blob,
                },
            )
            .await
    }
    .await;

    let upload = match created {
        Ok(upload) => upload,
        Err(e) => {
            // A blob written for a rejected request must not outlive it.
            if let Some(blob) = stored {
                if let Err(cleanup) = UploadService::new(&state.db)
                    .release_blob(&blob.hash, &*state.blob_store)
                    .await
                {
                    tracing::warn!(
                        hash = %blob.hash.to_hex(),
                        "Failed to release rejected upload: {cleanup}"
                    );
                }
            }
            return Err(e);
        }
    };
    tracing::info!(upload_id = upload.id, size = upload.size, kind = %upload.kind, "Upload stored");

    Ok(ApiResponse::created(UploadResponse::from(upload)).with_message("Upload stored"))
}

/// Read the `file` and `title` fields. The file is streamed into the store
/// as soon as it arrives and recorded in `stored`.
async fn read_upload_form(
    multipart: &mut Multipart,
    state: &AppState,
    stored: &mut Option<StoredBlob>,
) -> Result<(Option<String>, Option<String>), AppError> {
    let mut file_name: Option<String> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                if stored.is_some() {
                    return Err(AppError::Validation(
                        "Only one 'file' field is allowed".into(),
                    ));
                }
                // Checked before streaming so a bad name never touches the store.
                let name = field
                    .file_name()
                    .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
                let name = validate_upload_filename(name)
                    .map_err(|e| AppError::Validation(e.to_string()))?
                    .to_string();
                upload_kind(&name)?;
                file_name = Some(name);
                *stored = Some(
                    stream_field_to_store(
                        field,
                        &*state.blob_store,
                        state.config.storage.max_blob_size,
                    )
                    .await?,
                );
            }
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read title: {e}")))?;
                let text = text.trim();
                if text.chars().count() > 256 {
                    return Err(AppError::Validation(
                        "Title must be at most 256 characters".into(),
                    ));
                }
                title = Some(text.to_string()).filter(|t| !t.is_empty());
            }
            _ => {}
        }
    }

    Ok((file_name, title))
}

fn upload_kind(filename: &str) -> Result<(UploadKind, String), AppError> {
    let content_type = guess_content_type(filename).ok_or_else(|| {
        AppError::Validation("Unsupported file type: could not determine media type".into())
    })?;
    let kind = UploadKind::from_mime(&content_type).ok_or_else(|| {
        AppError::Validation(format!(
            "Unsupported file type {content_type}: only video, audio and image files are accepted"
        ))
    })?;
    Ok((kind, content_type))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Uploads",
    operation_id = "listMyUploads",
    summary = "The caller's uploads",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of uploads, newest first", body = Page<UploadResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_uploads(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page<UploadResponse>>, AppError> {
    let page = UploadService::new(&state.db)
        .list_mine(auth_user.user_id, query.page_request()?)
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Uploads",
    operation_id = "getUpload",
    summary = "Get upload metadata",
    params(("id" = i32, Path, description = "Upload ID")),
    responses(
        (status = 200, description = "Upload metadata", body = UploadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, upload_id = id))]
pub async fn get_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<UploadResponse>, AppError> {
    let upload = UploadService::new(&state.db).get(&auth_user, id).await?;
    Ok(ApiResponse::ok(upload.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/content",
    tag = "Uploads",
    operation_id = "downloadUpload",
    summary = "Download upload content",
    description = "Streams the stored bytes. Processed uploads are public; others are visible to \
        the owner and admins. Supports `If-None-Match` with the content-hash ETag.",
    params(("id" = i32, Path, description = "Upload ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 304, description = "Not modified"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, headers), fields(upload_id = id))]
pub async fn download_upload(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let upload = UploadService::new(&state.db)
        .readable(auth_user.as_ref(), id)
        .await?;
    build_blob_response(&upload, &headers, &*state.blob_store).await
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Uploads",
    operation_id = "deleteUpload",
    summary = "Delete an upload",
    description = "The stored file is removed once no other upload has the same content.",
    params(("id" = i32, Path, description = "Upload ID")),
    responses(
        (status = 200, description = "Upload deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, upload_id = id))]
pub async fn delete_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>, AppError> {
    UploadService::new(&state.db)
        .delete(&auth_user, id, &*state.blob_store)
        .await?;
    Ok(ApiResponse::message("Upload deleted"))
}

#[utoipa::path(
    post,
    path = "/{id}/convert-to-music",
    tag = "Uploads",
    operation_id = "convertUploadToMusic",
    summary = "Publish an audio upload as a music track",
    description = "Only `audio` uploads in `pending` state qualify. The track's audio URL points \
        at the upload content and the upload becomes `processed`. Send `{}` to use the defaults.",
    params(("id" = i32, Path, description = "Upload ID")),
    request_body = ConvertToMusicRequest,
    responses(
        (status = 201, description = "Track created", body = MusicResponse),
        (status = 400, description = "Not a pending audio upload (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, upload_id = id))]
pub async fn convert_to_music(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    ValidJson(payload): ValidJson<ConvertToMusicRequest>,
) -> Result<ApiResponse<MusicResponse>, AppError> {
    let track = UploadService::new(&state.db)
        .convert_to_music(&auth_user, id, payload)
        .await?;
    tracing::info!(music_id = track.id, "Upload converted to music");
    Ok(ApiResponse::created(MusicResponse::from(track)).with_message("Music track created"))
}

async fn build_blob_response(
    upload: &upload::Model,
    headers: &HeaderMap,
    blob_store: &dyn BlobStore,
) -> Result<Response, AppError> {
    let etag_value = format!("\"{}\"", upload.content_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let hash = ContentHash::from_str(&upload.content_hash)?;
    let reader = blob_store.open(&hash).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = upload
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    // Processed uploads are public and immutable by hash.
    let cache_control = if upload.status == upload::STATUS_PROCESSED {
        "public, max-age=3600"
    } else {
        "private, max-age=3600"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, upload.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&upload.filename),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, cache_control)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Spool the field to a temp file, enforcing `max_size`, then hand it to the store.
async fn stream_field_to_store(
    mut field: axum::extract::multipart::Field<'_>,
    blob_store: &dyn BlobStore,
    max_size: u64,
) -> Result<StoredBlob, AppError> {
    let temp_path = std::env::temp_dir().join(format!("movies-space-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }
        if total_size == 0 {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        Ok(blob_store.put_stream(reader).await?)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}
