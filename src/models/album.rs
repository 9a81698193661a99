//! Album entity rows.

use chrono::NaiveDate;
use serde::Serialize;

use super::common::serialize_date;

/// One row of the album table.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlbumRow {
    /// Spotify album ID (unique key).
    pub album_id: String,

    /// Album name.
    pub name: String,

    /// Release date.
    #[serde(serialize_with = "serialize_date")]
    pub release_date: NaiveDate,

    /// Total number of tracks in the album.
    pub total_tracks: u32,

    /// Link to the album on Spotify.
    pub url: String,
}

impl AlbumRow {
    /// CSV header, in column order.
    pub const COLUMNS: [&'static str; 5] =
        ["album_id", "name", "release_date", "total_tracks", "url"];
}
