use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::request_id;

/// Success envelope wrapping every JSON payload.
///
/// ```json
/// {"status": "success", "statusCode": 200, "message": "OK", "data": {...},
///  "requestId": "0190...", "timestamp": "2026-01-01T00:00:00Z"}
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    fn build(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: "success",
            status_code: status.as_u16(),
            message: message.into(),
            data,
            request_id: request_id::current(),
            timestamp: Utc::now(),
        }
    }

    pub fn ok(data: T) -> Self {
        Self::build(StatusCode::OK, "OK", Some(data))
    }

    pub fn created(data: T) -> Self {
        Self::build(StatusCode::CREATED, "Created", Some(data))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl ApiResponse<()> {
    /// An envelope with no `data`, for deletes and other acknowledgements.
    pub fn message(message: impl Into<String>) -> Self {
        Self::build(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
