//! Raw batch to entity table converters.
//!
//! Each projection walks the batch's items in order and emits one row per
//! item (one per credited artist for the artist table) without any
//! deduplication. Projected rows still carry dates exactly as the API
//! reported them. [`EntityTables::from_batch`] runs the three projections,
//! collapses each table to its unique key, and only then normalizes the
//! surviving rows' dates, so a repeat that is dropped can never fail the
//! batch.

pub mod output;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::{EtlError, Result};
use crate::models::common::{parse_added_at, parse_release_date};
use crate::models::{AlbumRow, ArtistRow, PlaylistBatch, SongRow};

/// Album row as projected, before its release date is parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAlbumRow {
    pub album_id: String,
    pub name: String,
    /// Release date string at year, month or day precision.
    pub release_date: String,
    pub total_tracks: u32,
    pub url: String,
}

impl RawAlbumRow {
    /// Parse the release date into a typed album row.
    pub fn normalize(self) -> Result<AlbumRow> {
        Ok(AlbumRow {
            release_date: parse_release_date(&self.release_date)?,
            album_id: self.album_id,
            name: self.name,
            total_tracks: self.total_tracks,
            url: self.url,
        })
    }
}

/// Song row as projected, before its `added_at` timestamp is parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSongRow {
    pub song_id: String,
    pub song_name: String,
    pub duration_ms: u64,
    pub url: String,
    pub popularity: u8,
    /// RFC 3339 timestamp the track was added at.
    pub song_added: String,
    pub album_id: String,
    pub artist_id: String,
}

impl RawSongRow {
    /// Parse the added timestamp into a typed song row.
    pub fn normalize(self) -> Result<SongRow> {
        Ok(SongRow {
            song_added: parse_added_at(&self.song_added)?,
            song_id: self.song_id,
            song_name: self.song_name,
            duration_ms: self.duration_ms,
            url: self.url,
            popularity: self.popularity,
            album_id: self.album_id,
            artist_id: self.artist_id,
        })
    }
}

/// Project every item's album into an album row.
pub fn extract_albums(batch: &PlaylistBatch) -> Vec<RawAlbumRow> {
    batch
        .tracks()
        .map(|(_, track)| {
            let album = &track.album;
            RawAlbumRow {
                album_id: album.id.clone(),
                name: album.name.clone(),
                release_date: album.release_date.clone(),
                total_tracks: album.total_tracks,
                url: album.external_urls.spotify.clone().unwrap_or_default(),
            }
        })
        .collect()
}

/// Project every credited artist of every track into an artist row.
pub fn extract_artists(batch: &PlaylistBatch) -> Vec<ArtistRow> {
    batch
        .tracks()
        .flat_map(|(_, track)| track.artists.iter())
        .map(|artist| ArtistRow {
            artist_id: artist.id.clone(),
            name: artist.name.clone(),
            url: artist.href.clone(),
        })
        .collect()
}

/// Project every item's track into a song row.
///
/// The song's artist is the first artist of its album, not of the track.
pub fn extract_songs(batch: &PlaylistBatch) -> Result<Vec<RawSongRow>> {
    batch
        .tracks()
        .map(|(item, track)| -> Result<RawSongRow> {
            let artist = track.album.artists.first().ok_or_else(|| {
                EtlError::malformed(
                    String::new(),
                    format!("album {} of track {} has no artists", track.album.id, track.id),
                )
            })?;

            Ok(RawSongRow {
                song_id: track.id.clone(),
                song_name: track.name.clone(),
                duration_ms: track.duration_ms,
                url: track.external_urls.spotify.clone().unwrap_or_default(),
                popularity: track.popularity,
                song_added: item.added_at.clone(),
                album_id: track.album.id.clone(),
                artist_id: artist.id.clone(),
            })
        })
        .collect()
}

/// Keep the first row for each key, preserving order of first appearance.
pub fn dedup_by_key<T, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(key(row).to_string()))
        .collect()
}

/// The three deduplicated tables derived from one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTables {
    /// Unique albums.
    pub albums: Vec<AlbumRow>,
    /// Unique artists.
    pub artists: Vec<ArtistRow>,
    /// Unique songs.
    pub songs: Vec<SongRow>,
}

impl EntityTables {
    /// Derive all three tables from a parsed batch.
    pub fn from_batch(batch: &PlaylistBatch) -> Result<Self> {
        let skipped = batch.items.len() - batch.tracks().count();
        if skipped > 0 {
            debug!("Skipping {} playlist items without a track", skipped);
        }

        let albums = dedup_by_key(extract_albums(batch), |a| a.album_id.as_str());
        let artists = dedup_by_key(extract_artists(batch), |a| a.artist_id.as_str());
        let songs = dedup_by_key(extract_songs(batch)?, |s| s.song_id.as_str());

        let tables = Self {
            albums: albums
                .into_iter()
                .map(RawAlbumRow::normalize)
                .collect::<Result<_>>()?,
            artists,
            songs: songs
                .into_iter()
                .map(RawSongRow::normalize)
                .collect::<Result<_>>()?,
        };

        let dangling = tables.dangling_refs();
        if dangling > 0 {
            warn!(
                "{} song rows reference albums or artists missing from the batch",
                dangling
            );
        }

        Ok(tables)
    }

    /// Number of songs whose album or artist has no row in this batch.
    pub fn dangling_refs(&self) -> usize {
        let album_ids: HashSet<&str> = self.albums.iter().map(|a| a.album_id.as_str()).collect();
        let artist_ids: HashSet<&str> =
            self.artists.iter().map(|a| a.artist_id.as_str()).collect();

        self.songs
            .iter()
            .filter(|s| {
                !album_ids.contains(s.album_id.as_str()) || !artist_ids.contains(s.artist_id.as_str())
            })
            .count()
    }
}
