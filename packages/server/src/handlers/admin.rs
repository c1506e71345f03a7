use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::admin::{
    AdminUserListQuery, AdminUserResponse, StatsResponse, UpdateUserRequest,
};
use crate::models::report::{ReportListQuery, ReportResponse, ResolveReportRequest};
use crate::models::shared::Page;
use crate::models::upload::{UploadListQuery, UploadResponse};
use crate::response::ApiResponse;
use crate::services::admin::AdminService;
use crate::services::report::ReportService;
use crate::services::upload::UploadService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "adminStats",
    summary = "Dashboard counters",
    responses(
        (status = 200, description = "Current totals", body = StatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.id))]
pub async fn stats(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<StatsResponse>, AppError> {
    let stats = AdminService::new(&state.db).stats().await?;
    Ok(ApiResponse::ok(stats))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "adminListUsers",
    summary = "List users",
    params(AdminUserListQuery),
    responses(
        (status = 200, description = "Page of users", body = Page<AdminUserResponse>),
        (status = 400, description = "Bad parameters (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, query), fields(admin_id = admin.id))]
pub async fn list_users(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AdminUserListQuery>,
) -> Result<ApiResponse<Page<AdminUserResponse>>, AppError> {
    let (term, page) = query.into_parts()?;
    let users = AdminService::new(&state.db).list_users(term, page).await?;
    Ok(ApiResponse::ok(users.map(Into::into)))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Admin",
    operation_id = "adminUpdateUser",
    summary = "Change a user's role or ban flag",
    description = "An admin cannot ban or demote themselves.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = AdminUserResponse),
        (status = 400, description = "Empty update or self-ban/self-demotion (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.id, user_id = id))]
pub async fn update_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<ApiResponse<AdminUserResponse>, AppError> {
    let user = AdminService::new(&state.db)
        .update_user(&admin, id, payload)
        .await?;
    Ok(ApiResponse::ok(AdminUserResponse::from(user)).with_message("User updated"))
}

#[utoipa::path(
    get,
    path = "/reports",
    tag = "Admin",
    operation_id = "adminListReports",
    summary = "List reports",
    params(ReportListQuery),
    responses(
        (status = 200, description = "Page of reports, newest first", body = Page<ReportResponse>),
        (status = 400, description = "Bad parameters (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, query), fields(admin_id = admin.id))]
pub async fn list_reports(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReportListQuery>,
) -> Result<ApiResponse<Page<ReportResponse>>, AppError> {
    let (status, page) = query.into_parts()?;
    let reports = ReportService::new(&state.db).list(status, page).await?;
    Ok(ApiResponse::ok(reports.map(Into::into)))
}

#[utoipa::path(
    patch,
    path = "/reports/{id}",
    tag = "Admin",
    operation_id = "adminResolveReport",
    summary = "Resolve or dismiss a report",
    description = "Only open reports can be closed. The reporter receives a `report_update` notification.",
    params(("id" = i32, Path, description = "Report ID")),
    request_body = ResolveReportRequest,
    responses(
        (status = 200, description = "Report closed", body = ReportResponse),
        (status = 400, description = "Invalid outcome (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Report not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Report already closed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.id, report_id = id))]
pub async fn resolve_report(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<ResolveReportRequest>,
) -> Result<ApiResponse<ReportResponse>, AppError> {
    let outcome = payload.validate_outcome()?;
    let report = ReportService::new(&state.db)
        .resolve(admin.id, id, outcome)
        .await?;
    Ok(ApiResponse::ok(ReportResponse::from(report)).with_message("Report updated"))
}

#[utoipa::path(
    get,
    path = "/uploads",
    tag = "Admin",
    operation_id = "adminListUploads",
    summary = "List every user's uploads",
    params(UploadListQuery),
    responses(
        (status = 200, description = "Page of uploads, newest first", body = Page<UploadResponse>),
        (status = 400, description = "Bad parameters (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, query), fields(admin_id = admin.id))]
pub async fn list_uploads(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UploadListQuery>,
) -> Result<ApiResponse<Page<UploadResponse>>, AppError> {
    let (status, page) = query.into_parts()?;
    let uploads = UploadService::new(&state.db).list_all(status, page).await?;
    Ok(ApiResponse::ok(uploads.map(Into::into)))
}
