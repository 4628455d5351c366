//! HTTP request handlers
//!
//! Each handler resolves the playlist through the registry, invokes one core
//! operation, and returns JSON. Core errors convert to transport statuses
//! through `Error::into_response`.

use crate::api::AppState;
use crate::error::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use juked_common::api::{
    AddSongsResponse, CreatePlaylistRequest, CreatePlaylistResponse, EditSongRequest,
    PlaylistDetail, RenameRequest, SeekRequest, StatusMessage,
};
use tracing::info;

// ============================================================================
// Registry-level operations
// ============================================================================

/// GET /api/v1/playlists - status + song snapshot for every playlist
pub async fn get_all(State(state): State<AppState>) -> Json<Vec<PlaylistDetail>> {
    Json(state.registry.details().await)
}

/// GET /api/v1/playlists/:id - status + song snapshot for one playlist
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PlaylistDetail>> {
    Ok(Json(state.registry.detail(id).await?))
}

/// POST /api/v1/playlists - create a playlist with optional initial songs
pub async fn create_playlist(
    State(state): State<AppState>,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<CreatePlaylistResponse>)> {
    info!(name = %req.name, songs = req.songs.len(), "create playlist request");
    let id = state.registry.create_playlist(&req.name, req.songs).await?;
    Ok((StatusCode::CREATED, Json(CreatePlaylistResponse { id })))
}

/// PATCH /api/v1/playlists/:id/name - rename a playlist
pub async fn rename_playlist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<StatusMessage>> {
    state.registry.rename_playlist(id, &req.name).await?;
    Ok(Json(StatusMessage::ok()))
}

/// DELETE /api/v1/playlists/:id - delete a playlist, stopping it if active
pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusMessage>> {
    state.registry.delete_playlist(id).await?;
    Ok(Json(StatusMessage::ok()))
}

// ============================================================================
// Transport commands
// ============================================================================

/// POST /api/v1/playlists/:id/launch - start the control loop
pub async fn launch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusMessage>> {
    state.registry.launch(id).await?;
    Ok(Json(StatusMessage::ok()))
}

/// POST /api/v1/playlists/:id/stop - terminate the control loop
pub async fn stop(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusMessage>> {
    state.registry.get(id).await?.stop().await?;
    Ok(Json(StatusMessage::ok()))
}

/// POST /api/v1/playlists/:id/play - resume the clock
pub async fn play(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusMessage>> {
    state.registry.get(id).await?.play().await?;
    Ok(Json(StatusMessage::ok()))
}

/// POST /api/v1/playlists/:id/pause - halt the clock
pub async fn pause(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusMessage>> {
    state.registry.get(id).await?.pause().await?;
    Ok(Json(StatusMessage::ok()))
}

/// POST /api/v1/playlists/:id/next - switch to the next song
pub async fn next(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusMessage>> {
    state.registry.get(id).await?.next().await?;
    Ok(Json(StatusMessage::ok()))
}

/// POST /api/v1/playlists/:id/prev - switch to the previous song
pub async fn prev(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusMessage>> {
    state.registry.get(id).await?.prev().await?;
    Ok(Json(StatusMessage::ok()))
}

/// PATCH /api/v1/playlists/:id/time - seek within the current song
pub async fn set_time(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<StatusMessage>> {
    state.registry.get(id).await?.set_time(req.time).await?;
    Ok(Json(StatusMessage::ok()))
}

// ============================================================================
// Song management
// ============================================================================

/// POST /api/v1/playlists/:id/songs - append songs
pub async fn add_songs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Vec<juked_common::api::NewSong>>,
) -> Result<(StatusCode, Json<AddSongsResponse>)> {
    info!(playlist = id, songs = req.len(), "add songs request");
    let ids = state.registry.add_songs(id, req).await?;
    Ok((StatusCode::CREATED, Json(AddSongsResponse { ids })))
}

/// PATCH /api/v1/playlists/:id/songs/:sid - edit a song
pub async fn edit_song(
    State(state): State<AppState>,
    Path((id, sid)): Path<(i64, i64)>,
    Json(req): Json<EditSongRequest>,
) -> Result<Json<StatusMessage>> {
    state
        .registry
        .edit_song(id, sid, &req.name, req.duration)
        .await?;
    Ok(Json(StatusMessage::ok()))
}

/// DELETE /api/v1/playlists/:id/songs/:sid - remove a song
pub async fn remove_song(
    State(state): State<AppState>,
    Path((id, sid)): Path<(i64, i64)>,
) -> Result<Json<StatusMessage>> {
    state.registry.remove_song(id, sid).await?;
    Ok(Json(StatusMessage::ok()))
}
