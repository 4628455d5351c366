//! API request/response types
//!
//! Shared between the HTTP handlers and integration tests so both sides
//! serialize the same shapes.

use serde::{Deserialize, Serialize};

/// One song as exposed over the API (also the shape of list snapshots)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongEntry {
    pub id: i64,
    pub name: String,
    /// Duration in whole seconds
    pub duration: u64,
}

/// Read-only playlist snapshot: the stable contract surface of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistStatus {
    pub id: i64,
    pub name: String,
    pub processing: bool,
    pub playing: bool,
    /// Seconds accumulated against the current song
    pub elapsed: u64,
    /// Current song, absent when the list is empty or playback exhausted it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<SongEntry>,
}

/// Full playlist view: status plus the ordered song snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistDetail {
    pub status: PlaylistStatus,
    pub songs: Vec<SongEntry>,
}

/// Song fields supplied by a caller (id is assigned by the store)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSong {
    pub name: String,
    /// Duration in whole seconds
    pub duration: u64,
}

/// Create playlist request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    /// Optional initial songs, appended in order
    #[serde(default)]
    pub songs: Vec<NewSong>,
}

/// Create playlist response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: i64,
}

/// Rename playlist request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// Seek request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeekRequest {
    /// New elapsed time for the current song, in whole seconds
    pub time: u64,
}

/// Edit song request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditSongRequest {
    pub name: String,
    pub duration: u64,
}

/// Add songs response: ids assigned by the store, in request order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSongsResponse {
    pub ids: Vec<i64>,
}

/// Generic status acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
}

impl StatusMessage {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
