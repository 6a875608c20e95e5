//! HTTP server setup and routing

use crate::controller::PlayerController;
use crate::error::{Error, Result};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub controller: Arc<PlayerController>,
}

impl AppContext {
    pub fn new(controller: Arc<PlayerController>) -> Self {
        Self { controller }
    }
}

/// Build the router with every endpoint
pub fn create_router(ctx: AppContext) -> Router {
    use super::handlers;

    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))

        // Playback control
        .route("/playback/state", get(handlers::get_playback_state))
        .route("/playback/play", post(handlers::play))
        .route("/playback/pause", post(handlers::pause))
        .route("/playback/stop", post(handlers::stop))
        .route("/playback/next", post(handlers::skip_next))
        .route("/playback/previous", post(handlers::skip_previous))
        .route("/playback/seek", post(handlers::seek))
        .route("/playback/select", post(handlers::select))

        // Volume
        .route("/audio/volume", get(handlers::get_volume).post(handlers::set_volume))

        // Playlist management
        .route("/playlist", get(handlers::get_playlist))
        .route("/playlist/files", post(handlers::add_files))
        .route("/playlist/folder", post(handlers::add_folder))
        .route("/playlist/stream", post(handlers::add_stream))
        .route("/playlist/move", post(handlers::move_item))
        .route("/playlist/swap", post(handlers::swap_items))
        .route("/playlist/shuffle", post(handlers::shuffle))
        .route("/playlist/clear", post(handlers::clear_playlist))
        .route("/playlist/new", post(handlers::new_playlist))
        .route("/playlist/load", post(handlers::load_playlist))
        .route("/playlist/save", post(handlers::save_playlist))
        .route("/playlist/:track_number", delete(handlers::remove_item))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        // Attach application context
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Serve the API on `port` until `shutdown` completes
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
