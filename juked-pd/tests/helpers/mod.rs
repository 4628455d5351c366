//! Shared harness for juked-pd integration tests
//!
//! Owns a temp-directory SQLite database and a registry wired to it, the
//! same construction order `main` uses.

use juked_common::api::NewSong;
use juked_pd::PlaylistRegistry;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestRegistry {
    pub registry: Arc<PlaylistRegistry>,
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestRegistry {
    pub async fn new() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test_juked.db");

        let pool = juked_common::db::connect(&db_path).await?;
        juked_common::db::init_schema(&pool).await?;

        let registry = Arc::new(PlaylistRegistry::new(pool.clone()));

        Ok(Self {
            registry,
            pool,
            _temp_dir: temp_dir,
        })
    }

    /// Create a playlist with songs; returns (playlist_id, song_ids)
    pub async fn playlist_with(
        &self,
        name: &str,
        songs: &[(&str, u64)],
    ) -> anyhow::Result<(i64, Vec<i64>)> {
        let id = self.registry.create_playlist(name, Vec::new()).await?;
        let ids = self
            .registry
            .add_songs(
                id,
                songs
                    .iter()
                    .map(|(name, duration)| NewSong {
                        name: name.to_string(),
                        duration: *duration,
                    })
                    .collect(),
            )
            .await?;
        Ok((id, ids))
    }
}
