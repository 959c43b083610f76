//! papershare server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use papershare_api::{AppState, router as api_router};
use papershare_common::{Config, LocalStorage};
use papershare_core::{CommentService, PaperService, VoteService};
use papershare_db::repositories::{CommentRepository, PaperRepository, VoteRepository};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Room for multipart framing and text fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "papershare=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting papershare server...");

    let config = Config::load()?;

    let db = Arc::new(papershare_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    papershare_db::migrate(&db).await?;
    info!("Migrations completed");

    tokio::fs::create_dir_all(&config.storage.upload_dir).await?;
    let storage = Arc::new(LocalStorage::new(
        config.storage.upload_dir.clone(),
        config.storage.public_url.clone(),
    ));

    // Initialize repositories
    let paper_repo = PaperRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));

    // Initialize services
    let state = AppState {
        paper_service: PaperService::new(
            paper_repo,
            vote_repo.clone(),
            storage,
            config.storage.max_file_size,
        ),
        comment_service: CommentService::new(comment_repo),
        vote_service: VoteService::with_repository(vote_repo),
    };

    let mut app = Router::new().nest("/api", api_router());

    // Only a path-style public URL is served from disk here.
    let mount = config.storage.public_url.trim_end_matches('/');
    if mount.starts_with('/') {
        app = app.nest_service(mount, ServeDir::new(&config.storage.upload_dir));
    }

    let app = app
        .layer(DefaultBodyLimit::max(
            config.storage.max_file_size + MULTIPART_OVERHEAD,
        ))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
