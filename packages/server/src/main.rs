use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use movies_space::config::AppConfig;
use movies_space::database::init_db;
use movies_space::middleware::rate_limit::RateLimiter;
use movies_space::services::auth::AuthService;
use movies_space::state::AppState;
use movies_space::{build_router, seed};
use movies_space_common::storage::FilesystemBlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// How often expired rate-limit windows and token revocations are dropped.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movies_space=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected and schema synced");

    seed::ensure_indexes(&db).await?;
    if let Some(admin) = &config.admin {
        seed::ensure_admin(&db, admin)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    let blob_store = FilesystemBlobStore::new(
        config.storage.data_dir.clone(),
        config.storage.max_blob_size,
    )
    .await
    .context("Failed to initialise blob storage")?;
    info!(dir = %config.storage.data_dir.display(), "Blob storage ready");

    let rate_limiter = RateLimiter::from_config(&config.rate_limit);

    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        blob_store: Arc::new(blob_store),
        rate_limiter: rate_limiter.clone(),
    };

    let auth_config = config.auth.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            rate_limiter.cleanup().await;
            match AuthService::new(&db, &auth_config).purge_expired_revocations().await {
                Ok(0) => {}
                Ok(n) => info!("Purged {n} expired token revocations"),
                Err(e) => tracing::warn!("Failed to purge token revocations: {e:?}"),
            }
        }
    });

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
