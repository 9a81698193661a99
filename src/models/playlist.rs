//! Playlist-related models.
//!
//! These are the typed shapes of a raw batch object as written by the
//! extractor. Only the fields the transformer projects are declared; every
//! other field in the API response is ignored on deserialization.

use serde::{Deserialize, Serialize};

use super::common::ExternalUrls;

/// Artist when nested inside a track or album.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtistObject {
    /// Spotify artist ID.
    pub id: String,

    /// Artist name.
    pub name: String,

    /// Web API endpoint for the artist.
    pub href: String,
}

#[cfg(test)]
impl ArtistObject {
    /// Create a new artist with ID and name; the href is derived from the ID.
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, name: S2) -> Self {
        let id = id.into();
        Self {
            href: format!("https://api.spotify.com/v1/artists/{}", id),
            name: name.into(),
            id,
        }
    }
}

/// Album when nested inside a track.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlbumObject {
    /// Spotify album ID.
    pub id: String,

    /// Album name.
    pub name: String,

    /// Release date as reported by the API (year, month or day precision).
    pub release_date: String,

    /// Total number of tracks in the album.
    pub total_tracks: u32,

    /// External URLs.
    #[serde(default)]
    pub external_urls: ExternalUrls,

    /// Album artists, in credit order.
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
}

/// Track inside a playlist item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackObject {
    /// Spotify track ID.
    pub id: String,

    /// Track name.
    pub name: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Popularity score (0-100).
    #[serde(default)]
    pub popularity: u8,

    /// External URLs.
    #[serde(default)]
    pub external_urls: ExternalUrls,

    /// Album the track belongs to.
    pub album: AlbumObject,

    /// Artists who performed the track.
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
}

/// One entry of a playlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistItem {
    /// When the track was added to the playlist (RFC 3339).
    pub added_at: String,

    /// The track; `None` for tracks that were removed or are local files.
    #[serde(default)]
    pub track: Option<TrackObject>,
}

/// A raw batch: one extraction run's full item list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistBatch {
    /// Playlist items in playlist order.
    pub items: Vec<PlaylistItem>,
}

impl PlaylistBatch {
    /// Parse a raw batch from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Items that carry a track.
    pub fn tracks(&self) -> impl Iterator<Item = (&PlaylistItem, &TrackObject)> {
        self.items
            .iter()
            .filter_map(|item| item.track.as_ref().map(|track| (item, track)))
    }
}
