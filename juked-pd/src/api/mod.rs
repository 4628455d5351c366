//! REST API for the playlist daemon
//!
//! One verb per core operation, JSON bodies, nested under `/api/v1`.

pub mod handlers;
pub mod sse;

use crate::registry::PlaylistRegistry;
use axum::{
    extract::State,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Playlist registry
    pub registry: Arc<PlaylistRegistry>,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        // API v1 routes
        .nest("/api/v1", Router::new()
            // Registry-level operations
            .route("/playlists", get(handlers::get_all).post(handlers::create_playlist))
            .route("/playlists/:id", get(handlers::get_playlist).delete(handlers::delete_playlist))
            .route("/playlists/:id/name", patch(handlers::rename_playlist))
            .route("/playlists/:id/time", patch(handlers::set_time))

            // Transport commands
            .route("/playlists/:id/launch", post(handlers::launch))
            .route("/playlists/:id/stop", post(handlers::stop))
            .route("/playlists/:id/play", post(handlers::play))
            .route("/playlists/:id/pause", post(handlers::pause))
            .route("/playlists/:id/next", post(handlers::next))
            .route("/playlists/:id/prev", post(handlers::prev))

            // Song management
            .route("/playlists/:id/songs", post(handlers::add_songs))
            .route("/playlists/:id/songs/:sid", patch(handlers::edit_song).delete(handlers::remove_song))

            // SSE playback events
            .route("/events", get(sse::event_stream))
        )
        .with_state(state)

        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "juked-pd",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "active_loops": state.registry.active_loops(),
    }))
}
