//! Database models

use serde::{Deserialize, Serialize};

/// One row of the `playlists` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistRow {
    pub id: i64,
    pub name: String,
}

/// One row of the `songs` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongRow {
    pub id: i64,
    pub playlist_id: i64,
    pub name: String,
    /// Duration in whole seconds
    pub duration: i64,
}
