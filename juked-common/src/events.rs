//! Playback event types
//!
//! Events are broadcast by each engine's control loop and fanned out to SSE
//! clients. Delivery is lossy: with no subscribers the send is dropped.

use serde::{Deserialize, Serialize};

/// Events emitted by playlist control loops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaybackEvent {
    /// A control loop started processing a playlist
    PlaylistStarted { playlist_id: i64 },

    /// The control loop ran off the end of the song list
    PlaylistFinished { playlist_id: i64 },

    /// The control loop terminated on an explicit stop or cancellation
    PlaylistStopped { playlist_id: i64 },

    /// The clock started advancing against a song
    Playing { playlist_id: i64, song_id: i64 },

    /// The clock halted with time accumulated against a song
    Paused {
        playlist_id: i64,
        song_id: i64,
        elapsed: u64,
    },

    /// The current position moved to a different song
    SongChanged { playlist_id: i64, song_id: i64 },
}

impl PlaybackEvent {
    /// SSE event name for this variant
    pub fn event_name(&self) -> &'static str {
        match self {
            PlaybackEvent::PlaylistStarted { .. } => "playlist_started",
            PlaybackEvent::PlaylistFinished { .. } => "playlist_finished",
            PlaybackEvent::PlaylistStopped { .. } => "playlist_stopped",
            PlaybackEvent::Playing { .. } => "playing",
            PlaybackEvent::Paused { .. } => "paused",
            PlaybackEvent::SongChanged { .. } => "song_changed",
        }
    }

    /// Playlist the event belongs to
    pub fn playlist_id(&self) -> i64 {
        match self {
            PlaybackEvent::PlaylistStarted { playlist_id }
            | PlaybackEvent::PlaylistFinished { playlist_id }
            | PlaybackEvent::PlaylistStopped { playlist_id }
            | PlaybackEvent::Playing { playlist_id, .. }
            | PlaybackEvent::Paused { playlist_id, .. }
            | PlaybackEvent::SongChanged { playlist_id, .. } => *playlist_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_round_trip_as_tagged_json() {
        let event = PlaybackEvent::SongChanged {
            playlist_id: 3,
            song_id: 11,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"SongChanged\""));

        let back: PlaybackEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.playlist_id(), 3);
        assert_eq!(back.event_name(), "song_changed");
    }
}
