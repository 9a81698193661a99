//! Playlist source clients.
//!
//! - [`PlaylistSource`]: the seam the extractor depends on
//! - [`SpotifyApi`]: Spotify Web API client (client-credentials auth)

pub mod spotify;

pub use spotify::{Credentials, SpotifyApi};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EtlError, Result};

/// Something that can list every item of a playlist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Fetch all items of a playlist, across every page, as raw JSON records.
    async fn fetch_playlist_items(&self, playlist_id: &str) -> Result<Vec<Value>>;
}

/// Extract a playlist ID from a link.
///
/// Accepts `https://open.spotify.com/playlist/<id>?si=...`,
/// `spotify:playlist:<id>`, or a bare ID. The ID is the final path segment.
pub fn parse_playlist_id(link: &str) -> Result<String> {
    let link = link.trim();
    let without_query = link.split(['?', '#']).next().unwrap_or_default();
    let id = without_query
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();

    if id.is_empty() {
        return Err(EtlError::InvalidLink(link.to_string()));
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlist_url() {
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/34NbomaTu7YuOYnky8nLXL").unwrap(),
            "34NbomaTu7YuOYnky8nLXL"
        );
    }

    #[test]
    fn test_parse_playlist_url_with_query() {
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/abc123?si=deadbeef").unwrap(),
            "abc123"
        );
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/abc123/").unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_parse_playlist_uri_and_bare_id() {
        assert_eq!(parse_playlist_id("spotify:playlist:abc123").unwrap(), "abc123");
        assert_eq!(parse_playlist_id("abc123").unwrap(), "abc123");
    }

    #[test]
    fn test_parse_playlist_empty() {
        assert!(matches!(parse_playlist_id(""), Err(EtlError::InvalidLink(_))));
        assert!(matches!(parse_playlist_id("?si=x"), Err(EtlError::InvalidLink(_))));
    }
}
