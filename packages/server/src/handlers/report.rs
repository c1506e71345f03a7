use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::ValidJson;
use crate::models::report::{CreateReportRequest, ReportResponse};
use crate::response::ApiResponse;
use crate::services::report::ReportService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Reports",
    operation_id = "createReport",
    summary = "Report content or a user",
    description = "Targets: `movie`, `short`, `music`, `comment`, `user` or `playlist`. The target must exist.",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report filed", body = ReportResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Target not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, target_type = payload.target_type.as_str(), target_id = payload.target_id))]
pub async fn create_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateReportRequest>,
) -> Result<ApiResponse<ReportResponse>, AppError> {
    let report = ReportService::new(&state.db)
        .create(auth_user.user_id, payload)
        .await?;
    tracing::info!(report_id = report.id, "Report filed");
    Ok(ApiResponse::created(ReportResponse::from(report)).with_message("Report submitted"))
}
