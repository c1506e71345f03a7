use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use movies_space_common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::middleware::request_id;

/// A single invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldError {
    #[schema(example = "email")]
    pub field: String,
    #[schema(example = "Email must be a valid address")]
    pub message: String,
}

/// Error envelope returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Always `"error"`.
    #[schema(example = "error")]
    pub status: &'static str,
    #[schema(example = 400)]
    pub status_code: u16,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`,
    /// `FEATURE_DISABLED`, `ACCOUNT_BANNED`, `NOT_FOUND`, `CONFLICT`,
    /// `RATE_LIMITED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    #[schema(example = "Rating must be between 1 and 5")]
    pub message: String,
    /// Per-field details for validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[schema(example = "0190b5d2-7c1e-7a40-9c3f-4f1c2d9e8b10")]
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Validation failure carrying one entry per offending field.
    InvalidFields(Vec<FieldError>),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    /// A feature flag turned the endpoint off. Contains the feature name.
    FeatureDisabled(&'static str),
    AccountBanned,
    NotFound(String),
    Conflict(String),
    /// Rate limit exceeded. Contains seconds until retry is allowed.
    RateLimited {
        retry_after: u64,
    },
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => "VALIDATION_ERROR",
            AppError::TokenMissing => "TOKEN_MISSING",
            AppError::TokenInvalid => "TOKEN_INVALID",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::FeatureDisabled(_) => "FEATURE_DISABLED",
            AppError::AccountBanned => "ACCOUNT_BANNED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::TokenMissing | AppError::TokenInvalid | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::PermissionDenied
            | AppError::FeatureDisabled(_)
            | AppError::AccountBanned => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorBody {
        let status = self.status();
        let code = self.code();
        let (message, errors) = match self {
            AppError::Validation(msg) => (msg, Vec::new()),
            AppError::InvalidFields(errors) => ("Validation failed".into(), errors),
            AppError::TokenMissing => ("Authentication required".into(), Vec::new()),
            AppError::TokenInvalid => ("Invalid or expired token".into(), Vec::new()),
            AppError::InvalidCredentials => ("Invalid email or password".into(), Vec::new()),
            AppError::PermissionDenied => ("Insufficient permissions".into(), Vec::new()),
            AppError::FeatureDisabled(feature) => {
                (format!("{feature} is currently disabled"), Vec::new())
            }
            AppError::AccountBanned => ("This account has been banned".into(), Vec::new()),
            AppError::NotFound(msg) | AppError::Conflict(msg) => (msg, Vec::new()),
            AppError::RateLimited { retry_after } => (
                format!("Rate limit exceeded. Try again in {retry_after} seconds"),
                Vec::new(),
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ("An unexpected error occurred".into(), Vec::new())
            }
        };

        ErrorBody {
            status: "error",
            status_code: status.as_u16(),
            code,
            message,
            errors,
            request_id: request_id::current(),
            timestamp: Utc::now(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => write!(f, "{}: {msg}", self.code()),
            other => f.write_str(other.code()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = if let AppError::RateLimited { retry_after } = &self {
            Some(*retry_after)
        } else {
            None
        };

        let status = self.status();
        let body = self.into_body();

        if let Some(seconds) = retry_after {
            (status, [("Retry-After", seconds.to_string())], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(hash) => {
                tracing::warn!("Blob referenced by an upload is missing: {hash}");
                AppError::NotFound("Upload content not found".into())
            }
            StorageError::TooLarge { limit, .. } => {
                AppError::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            other if other.is_client_error() => AppError::Validation(other.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<FieldError> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid")),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::InvalidFields(errors)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("Rejected token: {err}");
        AppError::TokenInvalid
    }
}
