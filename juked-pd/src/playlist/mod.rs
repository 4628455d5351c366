//! Per-playlist playback core: the song list and the engine that drives it

pub mod engine;
pub mod songlist;

pub use engine::PlaylistEngine;
pub use songlist::{Song, SongList};
