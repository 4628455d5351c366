//! Song table controllers

use crate::error::Result;
use juked_common::db::SongRow;
use sqlx::{Pool, Sqlite};
use tracing::debug;

/// Load every stored song ordered by id, so per-playlist insertion order is
/// reproduced when hydrating engines
pub async fn load_songs(pool: &Pool<Sqlite>) -> Result<Vec<SongRow>> {
    debug!("load songs");

    let rows = sqlx::query_as::<_, (i64, i64, String, i64)>(
        "SELECT id, playlist_id, name, duration FROM songs ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, playlist_id, name, duration)| SongRow {
            id,
            playlist_id,
            name,
            duration,
        })
        .collect())
}

/// Insert a song row; returns the assigned id
pub async fn create_song(
    pool: &Pool<Sqlite>,
    playlist_id: i64,
    name: &str,
    duration: u64,
) -> Result<i64> {
    let id = sqlx::query("INSERT INTO songs (playlist_id, name, duration) VALUES (?, ?, ?)")
        .bind(playlist_id)
        .bind(name)
        .bind(duration as i64)
        .execute(pool)
        .await?
        .last_insert_rowid();

    debug!(playlist = playlist_id, song = id, "created song row");
    Ok(id)
}

/// Update a song's name and duration
pub async fn update_song(pool: &Pool<Sqlite>, id: i64, name: &str, duration: u64) -> Result<()> {
    sqlx::query("UPDATE songs SET name = ?, duration = ? WHERE id = ?")
        .bind(name)
        .bind(duration as i64)
        .bind(id)
        .execute(pool)
        .await?;

    debug!(song = id, "updated song row");
    Ok(())
}

/// Delete a song row
pub async fn delete_song(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    debug!(song = id, "deleted song row");
    Ok(())
}

/// Delete every song belonging to a playlist
pub async fn delete_songs_for(pool: &Pool<Sqlite>, playlist_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM songs WHERE playlist_id = ?")
        .bind(playlist_id)
        .execute(pool)
        .await?;

    debug!(playlist = playlist_id, "deleted song rows");
    Ok(())
}
