use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use batchtone_engine::blob::LocalBlobStore;
use batchtone_engine::store::{MemoryStore, NotifyingStore, PgStore, RowStore};
use batchtone_engine::Engine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use batchtone_api::auth::session::SessionIssuer;
use batchtone_api::config::ServerConfig;
use batchtone_api::state::AppState;
use batchtone_api::{app, background};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "batchtone_api=debug,batchtone_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Row store ---
    let (base_store, pool) = match &config.database_url {
        Some(database_url) => {
            let pool = batchtone_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            batchtone_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            batchtone_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let rows: Arc<dyn RowStore> = Arc::new(PgStore::new(pool.clone()));
            (rows, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory row store");
            let rows: Arc<dyn RowStore> = Arc::new(MemoryStore::new());
            (rows, None)
        }
    };
    let store = Arc::new(NotifyingStore::new(base_store));

    // --- Engine ---
    let blobs = Arc::new(LocalBlobStore::new(
        &config.blob_root,
        config.public_blob_base_url.clone(),
    ));
    let identity = Arc::new(SessionIssuer::new(config.session.clone()));
    let engine = Engine::new(store.clone(), blobs, identity, config.limits);

    // --- Background tasks ---
    let cancel = tokio_util::sync::CancellationToken::new();
    let change_log_handle = tokio::spawn(background::change_log::run(
        store.subscribe(),
        cancel.clone(),
    ));
    let recovery_handle = tokio::spawn(background::stuck_images::run(
        engine.clone(),
        config.stuck_processing_minutes,
        cancel.clone(),
    ));
    tracing::info!("Background tasks started (change log, stuck image recovery)");

    // --- App ---
    let blob_root = config.blob_root.clone();
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState {
        engine,
        config: Arc::new(config),
        pool,
    };
    let app = app::build_router(state, Some(&blob_root));

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), recovery_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), change_log_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
