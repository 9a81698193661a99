//! Data models for raw playlist batches and the derived entity tables.

pub mod album;
pub mod artist;
pub mod common;
pub mod playlist;
pub mod song;

pub use album::AlbumRow;
pub use artist::ArtistRow;
pub use common::ExternalUrls;
pub use playlist::{AlbumObject, ArtistObject, PlaylistBatch, PlaylistItem, TrackObject};
pub use song::SongRow;
