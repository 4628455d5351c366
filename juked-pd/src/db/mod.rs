//! Persistence controllers for playlists and songs
//!
//! Thin write-through layer over SQLite: every call either succeeds or
//! surfaces the sqlx error unmodified. No retries.

pub mod playlists;
pub mod songs;
