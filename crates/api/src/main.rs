use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moondance_api::config::{pipeline_config_from_env, storage_config_from_env, ServerConfig};
use moondance_api::router::build_app_router;
use moondance_api::state::AppState;
use moondance_pipeline::ExtractionPipeline;
use moondance_storage::{ObjectStore, S3ObjectStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moondance_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = moondance_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    moondance_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    moondance_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Object store ---
    let store: Arc<dyn ObjectStore> =
        Arc::new(S3ObjectStore::connect(storage_config_from_env()).await);
    tracing::info!("Object store connected");

    // --- Extraction pipeline ---
    let pipeline_cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(
        pool.clone(),
        Arc::clone(&store),
        pipeline_config_from_env(),
        pipeline_cancel.clone(),
    );

    // Reconcile notes stranded by a previous crash before accepting traffic,
    // so the scan cannot race a fresh upload of the same note.
    let report = pipeline
        .recover_on_startup()
        .await
        .expect("Startup recovery scan failed");
    tracing::info!(
        orphans_reset = report.orphans_reset,
        resubmitted = report.resubmitted,
        "Extraction pipeline recovered",
    );

    // --- App state and router ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        store,
        pipeline,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
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

    // Stop the extraction workers; in-flight jobs run to completion and
    // anything left queued is re-found by the next startup scan.
    pipeline_cancel.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
