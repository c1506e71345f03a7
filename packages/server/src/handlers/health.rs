use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` when the database answered, `degraded` otherwise.
    #[schema(example = "ok")]
    pub status: &'static str,
    pub database: bool,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness and database reachability",
    responses(
        (status = 200, description = "Service is up; see `database` for connectivity", body = HealthResponse),
    ),
)]
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Database ping failed: {e}");
            false
        }
    };
    ApiResponse::ok(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}
