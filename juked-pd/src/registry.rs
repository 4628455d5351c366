//! Playlist registry: owns engine lifetime and mediates concurrent launches
//!
//! Constructed once in `main` and passed by `Arc` to the HTTP layer.
//! Mutations are write-through: the database call runs first, and a failing
//! write aborts the in-memory change so memory and store never diverge.

use crate::db;
use crate::error::{Error, Result};
use crate::playlist::PlaylistEngine;
use juked_common::api::{NewSong, PlaylistDetail, PlaylistStatus, SongEntry};
use juked_common::events::PlaybackEvent;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Buffered playback events before slow SSE clients start losing them
const EVENT_CHANNEL_CAPACITY: usize = 100;

pub struct PlaylistRegistry {
    pool: Pool<Sqlite>,
    engines: RwLock<HashMap<i64, Arc<PlaylistEngine>>>,
    /// Shared by every control loop; cancelled once at shutdown
    cancel: CancellationToken,
    /// Counts running control loops for coordinated drain
    tracker: TaskTracker,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaylistRegistry {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pool,
            engines: RwLock::new(HashMap::new()),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            events,
        }
    }

    /// Hydrate engines from the store at startup
    pub async fn load(&self) -> Result<()> {
        let playlists = db::playlists::load_playlists(&self.pool).await?;
        let songs = db::songs::load_songs(&self.pool).await?;

        let mut engines = self.engines.write().await;
        for row in &playlists {
            engines.insert(
                row.id,
                Arc::new(PlaylistEngine::new(
                    row.id,
                    row.name.clone(),
                    self.events.clone(),
                )),
            );
        }
        drop(engines);

        let mut loaded = 0usize;
        for song in songs {
            let Some(engine) = self.engines.read().await.get(&song.playlist_id).cloned() else {
                warn!(
                    song = song.id,
                    playlist = song.playlist_id,
                    "skipping song row for unknown playlist"
                );
                continue;
            };
            match engine
                .add_song(song.id, song.name, song.duration.max(0) as u64)
                .await
            {
                Ok(()) => loaded += 1,
                Err(e) => warn!(song = song.id, "skipping song row: {}", e),
            }
        }

        info!(
            playlists = playlists.len(),
            songs = loaded,
            "registry hydrated"
        );
        Ok(())
    }

    /// Resolve an engine by playlist id
    pub async fn get(&self, id: i64) -> Result<Arc<PlaylistEngine>> {
        self.engines
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no playlist with id {}", id)))
    }

    /// Start a playlist's control loop as a tracked task
    pub async fn launch(&self, id: i64) -> Result<()> {
        let engine = self.get(id).await?;
        engine.launch(self.cancel.clone(), &self.tracker).await
    }

    /// Create a playlist (and optional initial songs); returns the new id
    pub async fn create_playlist(&self, name: &str, songs: Vec<NewSong>) -> Result<i64> {
        let id = db::playlists::create_playlist(&self.pool, name).await?;

        let engine = Arc::new(PlaylistEngine::new(
            id,
            name.to_string(),
            self.events.clone(),
        ));
        self.engines.write().await.insert(id, engine.clone());
        info!(playlist = id, "created playlist");

        for song in songs {
            let sid = db::songs::create_song(&self.pool, id, &song.name, song.duration).await?;
            engine.add_song(sid, song.name, song.duration).await?;
        }

        Ok(id)
    }

    /// Rename a playlist
    pub async fn rename_playlist(&self, id: i64, name: &str) -> Result<()> {
        let engine = self.get(id).await?;
        db::playlists::update_playlist(&self.pool, id, name).await?;
        engine.rename(name.to_string()).await;
        info!(playlist = id, name, "renamed playlist");
        Ok(())
    }

    /// Delete a playlist, stopping its control loop if one is running
    pub async fn delete_playlist(&self, id: i64) -> Result<()> {
        let engine = self.get(id).await?;

        db::playlists::delete_playlist(&self.pool, id).await?;
        db::songs::delete_songs_for(&self.pool, id).await?;

        if engine.status().await.processing {
            // The loop may have terminated on its own between the status
            // read and the stop; that is not a failed delete
            if let Err(e) = engine.stop().await {
                warn!(playlist = id, "stop during delete: {}", e);
            }
        }

        self.engines.write().await.remove(&id);
        info!(playlist = id, "deleted playlist");
        Ok(())
    }

    /// Append songs to a playlist; returns the assigned ids in order
    pub async fn add_songs(&self, id: i64, songs: Vec<NewSong>) -> Result<Vec<i64>> {
        let engine = self.get(id).await?;

        let mut ids = Vec::with_capacity(songs.len());
        for song in songs {
            let sid = db::songs::create_song(&self.pool, id, &song.name, song.duration).await?;
            engine.add_song(sid, song.name, song.duration).await?;
            ids.push(sid);
        }
        Ok(ids)
    }

    /// Update a song's name and duration
    pub async fn edit_song(&self, id: i64, sid: i64, name: &str, duration: u64) -> Result<()> {
        let engine = self.get(id).await?;

        // Validate against the engine before touching the store so a doomed
        // edit never writes
        if !engine.has_song(sid).await {
            return Err(Error::NotFound(format!(
                "no song {} in playlist {}",
                sid, id
            )));
        }
        let status = engine.status().await;
        if status.playing && status.current.as_ref().map(|c| c.id) == Some(sid) {
            return Err(Error::RemovePlayingItem(id, sid));
        }

        db::songs::update_song(&self.pool, sid, name, duration).await?;
        engine.edit_song(sid, name.to_string(), duration).await
    }

    /// Remove a song from a playlist
    pub async fn remove_song(&self, id: i64, sid: i64) -> Result<()> {
        let engine = self.get(id).await?;

        if !engine.has_song(sid).await {
            return Err(Error::NotFound(format!(
                "no song {} in playlist {}",
                sid, id
            )));
        }
        let status = engine.status().await;
        if status.playing && status.current.as_ref().map(|c| c.id) == Some(sid) {
            return Err(Error::RemovePlayingItem(id, sid));
        }

        db::songs::delete_song(&self.pool, sid).await?;
        engine.remove_song(sid).await
    }

    /// Status + song snapshot for one playlist
    pub async fn detail(&self, id: i64) -> Result<PlaylistDetail> {
        let engine = self.get(id).await?;
        Ok(PlaylistDetail {
            status: engine.status().await,
            songs: engine.songs().await,
        })
    }

    /// Status + song snapshot for every playlist, ordered by id
    pub async fn details(&self) -> Vec<PlaylistDetail> {
        let engines: Vec<Arc<PlaylistEngine>> = {
            let map = self.engines.read().await;
            let mut engines: Vec<_> = map.values().cloned().collect();
            engines.sort_by_key(|e| e.id());
            engines
        };

        let mut details = Vec::with_capacity(engines.len());
        for engine in engines {
            details.push(PlaylistDetail {
                status: engine.status().await,
                songs: engine.songs().await,
            });
        }
        details
    }

    /// Status snapshot for one playlist
    pub async fn status(&self, id: i64) -> Result<PlaylistStatus> {
        Ok(self.get(id).await?.status().await)
    }

    /// Song snapshot for one playlist
    pub async fn songs(&self, id: i64) -> Result<Vec<SongEntry>> {
        Ok(self.get(id).await?.songs().await)
    }

    /// Subscribe to playback events (for SSE fan-out)
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Number of control loops currently running
    pub fn active_loops(&self) -> usize {
        self.tracker.len()
    }

    /// Handles for the shutdown coordinator
    pub fn shutdown_handle(&self) -> (CancellationToken, TaskTracker) {
        (self.cancel.clone(), self.tracker.clone())
    }
}
