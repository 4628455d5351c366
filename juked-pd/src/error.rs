//! Error types for juked-pd
//!
//! One closed enum covers every failure a core operation can return, plus
//! passthrough kinds for the persistence and HTTP layers. Each kind carries
//! enough identity to log and to answer the request that triggered it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Convenience Result type using the juked-pd Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for juked-pd
#[derive(Error, Debug)]
pub enum Error {
    /// Playlist or song identity lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Launch on an engine whose control loop is already running
    #[error("Playlist {0} is already processing")]
    AlreadyProcessing(i64),

    /// Stop on an engine whose control loop is not running
    #[error("Playlist {0} is already stopped")]
    AlreadyStopped(i64),

    /// Play while the clock is already advancing
    #[error("Playlist {0} is already playing")]
    AlreadyPlaying(i64),

    /// Pause while the clock is already halted
    #[error("Playlist {0} is already paused")]
    AlreadyPaused(i64),

    /// Transport command against an idle control loop
    #[error("Playlist {0} is not processing")]
    NotProcessing(i64),

    /// Next at the tail of the list
    #[error("Current song in playlist {0} is the last one")]
    NoSuccessor(i64),

    /// Prev at the head of the list
    #[error("Current song in playlist {0} is the first one")]
    NoPredecessor(i64),

    /// Insertion collision on song identity
    #[error("Playlist {0} already contains song {1}")]
    DuplicateId(i64, i64),

    /// Structural operation on an empty list
    #[error("Playlist {0} has no songs")]
    EmptyList(i64),

    /// Seek past the current song's duration
    #[error("Time {time} exceeds current song duration {duration}")]
    TimeExceedsDuration { time: u64, duration: u64 },

    /// Structural mutation of the song the clock is advancing against
    #[error("Song {1} in playlist {0} is currently playing")]
    RemovePlayingItem(i64, i64),

    /// Persistence collaborator failure, passed through unmodified
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NOT_FOUND",
            Error::AlreadyProcessing(_) => "ALREADY_PROCESSING",
            Error::AlreadyStopped(_) => "ALREADY_STOPPED",
            Error::AlreadyPlaying(_) => "ALREADY_PLAYING",
            Error::AlreadyPaused(_) => "ALREADY_PAUSED",
            Error::NotProcessing(_) => "NOT_PROCESSING",
            Error::NoSuccessor(_) => "NO_SUCCESSOR",
            Error::NoPredecessor(_) => "NO_PREDECESSOR",
            Error::DuplicateId(_, _) => "DUPLICATE_ID",
            Error::EmptyList(_) => "EMPTY_LIST",
            Error::TimeExceedsDuration { .. } => "TIME_EXCEEDS_DURATION",
            Error::RemovePlayingItem(_, _) => "REMOVE_PLAYING_ITEM",
            Error::Database(_) => "DATABASE_ERROR",
            Error::Http(_) => "HTTP_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// HTTP status for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyProcessing(_)
            | Error::AlreadyStopped(_)
            | Error::AlreadyPlaying(_)
            | Error::AlreadyPaused(_)
            | Error::NotProcessing(_)
            | Error::NoSuccessor(_)
            | Error::NoPredecessor(_)
            | Error::DuplicateId(_, _)
            | Error::EmptyList(_)
            | Error::RemovePlayingItem(_, _) => StatusCode::CONFLICT,
            Error::TimeExceedsDuration { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Database(_) | Error::Http(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
