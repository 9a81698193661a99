//! Artist entity rows.

use serde::Serialize;

/// One row of the artist table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArtistRow {
    /// Spotify artist ID (unique key).
    pub artist_id: String,

    /// Artist name.
    pub name: String,

    /// Web API endpoint for the artist.
    pub url: String,
}

impl ArtistRow {
    /// CSV header, in column order.
    pub const COLUMNS: [&'static str; 3] = ["artist_id", "name", "url"];
}
