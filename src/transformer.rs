//! Transformation stage.
//!
//! Each pending raw batch moves through
//! `Pending -> Parsed -> Extracted -> Written -> Archived`. Any failure
//! stops that batch where it is: the raw object stays in the pending area
//! and the run carries on with the next one.
//!
//! Archiving is copy-then-delete. If the delete fails the object exists in
//! both areas and will be picked up again by the next run, so output tables
//! are at-least-once.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::converters::output::to_csv;
use crate::converters::EntityTables;
use crate::error::{EtlError, Result};
use crate::layout::{is_json_key, Entity, Generation, StoreLayout};
use crate::models::{AlbumRow, ArtistRow, PlaylistBatch, SongRow};
use crate::storage::BlobStore;

/// Furthest state a raw batch reached during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BatchStage {
    /// Listed, not yet parsed.
    Pending,
    /// Body fetched and parsed into playlist items.
    Parsed,
    /// Entity tables derived.
    Extracted,
    /// All three tables written.
    Written,
    /// Moved to the archive area.
    Archived,
}

/// A batch that went all the way through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedBatch {
    /// Pending key the batch was read from.
    pub source_key: String,
    /// Key the batch was archived under.
    pub archive_key: String,
    /// Album table key.
    pub album_key: String,
    /// Artist table key.
    pub artist_key: String,
    /// Song table key.
    pub song_key: String,
    /// Rows in the album table.
    pub albums: usize,
    /// Rows in the artist table.
    pub artists: usize,
    /// Rows in the song table.
    pub songs: usize,
    /// Songs pointing at an album or artist missing from this batch.
    pub dangling_refs: usize,
}

/// A batch that stopped early.
#[derive(Debug)]
pub struct FailedBatch {
    /// Pending key of the batch.
    pub key: String,
    /// Last stage the batch completed.
    pub stage: BatchStage,
    /// Why it stopped.
    pub error: EtlError,
}

/// Result of one transformation run.
#[derive(Debug, Default)]
pub struct TransformResult {
    /// Batches written and archived.
    pub processed: Vec<ProcessedBatch>,
    /// Batches left pending.
    pub failed: Vec<FailedBatch>,
}

impl TransformResult {
    /// Total number of batches attempted.
    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len()
    }

    /// Check if every batch was processed.
    pub fn all_successful(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stage two of the pipeline.
///
/// At most one run may be active against a store at a time. Two
/// overlapping runs can both pick up the same pending object, write its
/// tables twice and race on archiving it; mutual exclusion is the
/// scheduler's job.
pub struct Transformer {
    store: Arc<dyn BlobStore>,
    layout: StoreLayout,
}

impl Transformer {
    /// Create a transformer with the default storage layout.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            layout: StoreLayout::default(),
        }
    }

    /// Use a custom storage layout.
    pub fn with_layout(mut self, layout: StoreLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Process every pending `.json` object once.
    ///
    /// # Errors
    ///
    /// Only a failure to list the pending area fails the run; per-batch
    /// failures are reported in [`TransformResult::failed`].
    pub async fn run(&self) -> Result<TransformResult> {
        let keys: Vec<String> = self
            .store
            .list(&self.layout.pending_prefix)
            .await?
            .into_iter()
            .filter(|key| is_json_key(key))
            .collect();

        info!("Found {} pending batches", keys.len());

        let mut result = TransformResult::default();
        for key in keys {
            match self.process_batch(&key).await {
                Ok(processed) => {
                    info!(
                        "Processed {}: {} albums, {} artists, {} songs",
                        key, processed.albums, processed.artists, processed.songs
                    );
                    result.processed.push(processed);
                }
                Err((stage, error)) => {
                    error!("Batch {} failed after {:?}: {}", key, stage, error);
                    result.failed.push(FailedBatch { key, stage, error });
                }
            }
        }

        info!(
            "Transformation finished: {}/{} batches archived",
            result.processed.len(),
            result.total()
        );
        Ok(result)
    }

    /// Take one batch from pending to archived.
    async fn process_batch(
        &self,
        key: &str,
    ) -> std::result::Result<ProcessedBatch, (BatchStage, EtlError)> {
        let mut stage = BatchStage::Pending;
        let at = |stage: BatchStage| move |e: EtlError| (stage, e);

        let body = self.store.get(key).await.map_err(at(stage))?;
        let batch = PlaylistBatch::from_slice(&body)
            .map_err(|e| EtlError::malformed(key, e))
            .map_err(at(stage))?;
        stage = BatchStage::Parsed;
        debug!("Parsed {} with {} items", key, batch.items.len());

        let tables = EntityTables::from_batch(&batch)
            .map_err(|e| e.in_batch(key))
            .map_err(at(stage))?;
        stage = BatchStage::Extracted;

        let generation = Generation::now();
        let album_key = self
            .write_table(Entity::Album, &generation, &AlbumRow::COLUMNS, &tables.albums)
            .await
            .map_err(at(stage))?;
        let artist_key = self
            .write_table(Entity::Artist, &generation, &ArtistRow::COLUMNS, &tables.artists)
            .await
            .map_err(at(stage))?;
        let song_key = self
            .write_table(Entity::Song, &generation, &SongRow::COLUMNS, &tables.songs)
            .await
            .map_err(at(stage))?;
        stage = BatchStage::Written;

        let archive_key = self.archive(key).await.map_err(at(stage))?;
        debug!("Batch {} reached {:?}", key, BatchStage::Archived);

        Ok(ProcessedBatch {
            source_key: key.to_string(),
            archive_key,
            album_key,
            artist_key,
            song_key,
            albums: tables.albums.len(),
            artists: tables.artists.len(),
            songs: tables.songs.len(),
            dangling_refs: tables.dangling_refs(),
        })
    }

    /// Serialize one table and write it under its entity prefix.
    async fn write_table<T: serde::Serialize>(
        &self,
        entity: Entity,
        generation: &Generation,
        columns: &[&str],
        rows: &[T],
    ) -> Result<String> {
        let key = self.layout.output_key(entity, generation);
        let csv = to_csv(columns, rows)?;
        self.store.put(&key, Bytes::from(csv)).await?;
        debug!("Wrote {} rows to {}", rows.len(), key);
        Ok(key)
    }

    /// Move a raw batch from the pending area to the archive area.
    async fn archive(&self, key: &str) -> Result<String> {
        let archive_key = self.layout.archive_key(key);
        self.store.copy(key, &archive_key).await?;

        if let Err(e) = self.store.delete(key).await {
            warn!(
                "Archived copy {} written but {} could not be deleted: {}",
                archive_key, key, e
            );
            return Err(EtlError::PartialArchive {
                source_key: key.to_string(),
                archive_key,
                reason: e.to_string(),
            });
        }

        Ok(archive_key)
    }
}
