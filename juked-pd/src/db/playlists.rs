//! Playlist table controllers

use crate::error::Result;
use juked_common::db::PlaylistRow;
use sqlx::{Pool, Sqlite};
use tracing::debug;

/// Load every stored playlist, ordered by id
pub async fn load_playlists(pool: &Pool<Sqlite>) -> Result<Vec<PlaylistRow>> {
    debug!("load playlists");

    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM playlists ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| PlaylistRow { id, name })
        .collect())
}

/// Insert a playlist row; returns the assigned id
pub async fn create_playlist(pool: &Pool<Sqlite>, name: &str) -> Result<i64> {
    let id = sqlx::query("INSERT INTO playlists (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?
        .last_insert_rowid();

    debug!(playlist = id, "created playlist row");
    Ok(id)
}

/// Update a playlist's name
pub async fn update_playlist(pool: &Pool<Sqlite>, id: i64, name: &str) -> Result<()> {
    sqlx::query("UPDATE playlists SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;

    debug!(playlist = id, "updated playlist row");
    Ok(())
}

/// Delete a playlist row
pub async fn delete_playlist(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    debug!(playlist = id, "deleted playlist row");
    Ok(())
}
