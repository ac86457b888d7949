use crate::config::Config;
use crate::pipeline::{build_pipeline, ImagePipeline};
use crate::removal::BackgroundRemover;
use crate::store::{JsonFileStore, MetadataStore};
use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod routes_images;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Metadata store (file-backed in production, in-memory in tests)
    pub store: Arc<dyn MetadataStore>,
    /// Upload processing pipeline
    pub pipeline: Arc<ImagePipeline>,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let max_upload_bytes = ctx.config.server.max_upload_bytes;
    let processed_dir = ctx.config.storage.processed_dir();
    let uploads_dir = ctx.config.storage.uploads_dir();
    let static_dir = ctx.config.server.static_dir.clone();

    let mut app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes
        .nest("/api", routes_images::image_routes(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
        // Processed and original artifacts by derived filename
        .nest_service("/processed", ServeDir::new(processed_dir))
        .nest_service("/uploads", ServeDir::new(uploads_dir));

    // Serve static files if directory is provided
    // Uses SPA fallback: serves index.html for any route that doesn't match a file
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        }
    }

    app
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "message": "Image Processor API is running"
    }))
}

/// Build the production context: file-backed store and a pipeline using the
/// configured removal adapter, with all storage directories created.
pub fn build_context(config: Config) -> Result<AppContext> {
    let store = JsonFileStore::new(config.storage.metadata_file());
    store
        .ensure_file()
        .context("Failed to initialize metadata file")?;

    let remover = BackgroundRemover::from_config(&config.removal);
    let pipeline = build_pipeline(
        &config.storage.uploads_dir(),
        &config.storage.processed_dir(),
        remover,
    )
    .context("Failed to create storage directories")?;

    Ok(AppContext {
        config: Arc::new(config),
        store: Arc::new(store),
        pipeline: Arc::new(pipeline),
    })
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = build_context(config)?;
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
