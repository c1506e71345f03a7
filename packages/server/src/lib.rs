pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::middleware::rate_limit::rate_limit;
use crate::middleware::request_id::{MakeRequestUuidV7, REQUEST_ID_HEADER, scope_request_id};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Movies Space API",
        version = "1.0.0",
        description = "Media catalog, engagement and social backend"
    ),
    tags(
        (name = "Health", description = "Liveness and database reachability"),
        (name = "Auth", description = "Registration, tokens and the caller's profile"),
        (name = "Movies", description = "Movie catalog"),
        (name = "Shorts", description = "User-posted short videos"),
        (name = "Music", description = "Music catalog and play counts"),
        (name = "Playlists", description = "Ordered music playlists"),
        (name = "Engagement", description = "Ratings, favorites, watchlist and watch history"),
        (name = "Comments", description = "Threaded comments on catalog items"),
        (name = "Social", description = "Follows, profiles, activity feed and curated lists"),
        (name = "Notifications", description = "The caller's notifications"),
        (name = "Search", description = "Catalog and user search"),
        (name = "Uploads", description = "Media uploads and conversion to music"),
        (name = "Reports", description = "Content reports"),
        (name = "Admin", description = "Moderation and dashboard"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// An empty origin list allows any origin.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::IF_NONE_MATCH])
        .expose_headers([
            HeaderName::from_static(REQUEST_ID_HEADER),
            header::RETRY_AFTER,
            header::ETAG,
        ])
        .max_age(Duration::from_secs(config.max_age));

    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let api = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit,
        ));

    let (router, api) = api
        .routes(routes!(handlers::health::health))
        .split_for_parts();

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // Outermost last.
    router
        .layer(axum::middleware::from_fn(scope_request_id))
        .layer(cors_layer(&state.config.server.cors))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuidV7))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
}
