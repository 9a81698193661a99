//! Persisted storage layout and object key generation.
//!
//! All objects live under one logical store:
//!
//! ```text
//! raw_data/to_be_processed/<name>.json     pending raw batches
//! raw_data/processed/<name>.json           archived raw batches
//! transformed_data/album_data/*.csv        album tables
//! transformed_data/artist_data/*.csv       artist tables
//! transformed_data/songs_data/*.csv        song tables
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Default prefix for raw batches awaiting transformation.
pub const PENDING_PREFIX: &str = "raw_data/to_be_processed/";

/// Default prefix for archived raw batches.
pub const DONE_PREFIX: &str = "raw_data/processed/";

/// Default prefix for album tables.
pub const ALBUM_PREFIX: &str = "transformed_data/album_data/";

/// Default prefix for artist tables.
pub const ARTIST_PREFIX: &str = "transformed_data/artist_data/";

/// Default prefix for song tables.
pub const SONG_PREFIX: &str = "transformed_data/songs_data/";

/// The three entity tables written per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Album,
    Artist,
    Song,
}

impl Entity {
    /// File name stem used for output objects.
    pub fn stem(&self) -> &'static str {
        match self {
            Entity::Album => "album_transformed",
            Entity::Artist => "artist_transformed",
            Entity::Song => "song_transformed",
        }
    }
}

/// Prefixes used by both pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    /// Raw batches awaiting transformation.
    pub pending_prefix: String,
    /// Archived raw batches.
    pub done_prefix: String,
    /// Album table outputs.
    pub album_prefix: String,
    /// Artist table outputs.
    pub artist_prefix: String,
    /// Song table outputs.
    pub song_prefix: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            pending_prefix: PENDING_PREFIX.to_string(),
            done_prefix: DONE_PREFIX.to_string(),
            album_prefix: ALBUM_PREFIX.to_string(),
            artist_prefix: ARTIST_PREFIX.to_string(),
            song_prefix: SONG_PREFIX.to_string(),
        }
    }
}

impl StoreLayout {
    /// Output prefix for an entity table.
    pub fn output_prefix(&self, entity: Entity) -> &str {
        match entity {
            Entity::Album => &self.album_prefix,
            Entity::Artist => &self.artist_prefix,
            Entity::Song => &self.song_prefix,
        }
    }

    /// Key for a new raw batch.
    pub fn raw_batch_key(&self, generation: &Generation) -> String {
        format!("{}spotify_raw_{}.json", self.pending_prefix, generation)
    }

    /// Key for a new entity table.
    pub fn output_key(&self, entity: Entity, generation: &Generation) -> String {
        format!(
            "{}{}_{}.csv",
            self.output_prefix(entity),
            entity.stem(),
            generation
        )
    }

    /// Archive key for a pending object, keeping its trailing file name.
    pub fn archive_key(&self, pending_key: &str) -> String {
        let name = pending_key.rsplit('/').next().unwrap_or(pending_key);
        format!("{}{}", self.done_prefix, name)
    }
}

/// Whether a key names a JSON object (its text after the last `.` is `json`).
pub fn is_json_key(key: &str) -> bool {
    key.rsplit_once('.').is_some_and(|(_, ext)| ext == "json")
}

/// Generation stamp embedded in object keys.
///
/// Combines the generation timestamp with a random UUID so that two
/// objects produced within the same clock tick still get distinct keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// When the object was produced.
    pub timestamp: DateTime<Utc>,
    /// Collision breaker.
    pub id: Uuid,
}

impl Generation {
    /// Stamp for an object produced now.
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Stamp for an object produced at `timestamp`.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            id: Uuid::new_v4(),
        }
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}",
            self.timestamp.format("%Y%m%dT%H%M%S%.6fZ"),
            self.id.simple()
        )
    }
}
