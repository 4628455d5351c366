//! Database plumbing shared by the daemon and its tests

pub mod init;
pub mod models;

pub use init::{connect, init_schema};
pub use models::{PlaylistRow, SongRow};
