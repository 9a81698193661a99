//! Song entity rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::common::serialize_timestamp;

/// One row of the song table.
///
/// `artist_id` is the first album artist only; songs with several
/// performers still produce a single row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SongRow {
    /// Spotify track ID (unique key).
    pub song_id: String,

    /// Track name.
    pub song_name: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Link to the track on Spotify.
    pub url: String,

    /// Popularity score (0-100).
    pub popularity: u8,

    /// When the track was added to the playlist.
    #[serde(serialize_with = "serialize_timestamp")]
    pub song_added: DateTime<Utc>,

    /// Album the song belongs to.
    pub album_id: String,

    /// First credited album artist.
    pub artist_id: String,
}

impl SongRow {
    /// CSV header, in column order.
    pub const COLUMNS: [&'static str; 8] = [
        "song_id",
        "song_name",
        "duration_ms",
        "url",
        "popularity",
        "song_added",
        "album_id",
        "artist_id",
    ];
}

