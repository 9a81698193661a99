//! Extraction stage.
//!
//! Pulls every item of a playlist from a [`PlaylistSource`] and writes the
//! raw records as one timestamped JSON object into the pending area. The
//! object is written only after the full item list has been fetched, so a
//! failed fetch never leaves a partial batch behind.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::api::{parse_playlist_id, PlaylistSource};
use crate::error::Result;
use crate::layout::{Generation, StoreLayout};
use crate::models::common::format_timestamp;
use crate::storage::BlobStore;

/// Outcome of one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Key of the raw batch object written.
    pub key: String,
    /// Playlist the items were fetched from.
    pub playlist_id: String,
    /// Number of items in the batch.
    pub item_count: usize,
}

/// Stage one of the pipeline.
///
/// Concurrent runs are safe: each writes a single, uniquely keyed object.
pub struct Extractor {
    source: Arc<dyn PlaylistSource>,
    store: Arc<dyn BlobStore>,
    layout: StoreLayout,
}

impl Extractor {
    /// Create an extractor with the default storage layout.
    pub fn new(source: Arc<dyn PlaylistSource>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            source,
            store,
            layout: StoreLayout::default(),
        }
    }

    /// Use a custom storage layout.
    pub fn with_layout(mut self, layout: StoreLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Fetch the playlist behind `playlist_link` and store it as a raw batch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLink` if no playlist ID can be parsed, `Auth` or
    /// `Fetch` if the source fails, and `Storage`/`Io` if the write fails.
    pub async fn run(&self, playlist_link: &str) -> Result<ExtractionResult> {
        let playlist_id = parse_playlist_id(playlist_link)?;
        info!("Extracting playlist {}", playlist_id);

        let items = self.source.fetch_playlist_items(&playlist_id).await?;
        let item_count = items.len();

        let fetched_at = Utc::now();
        let body = json!({
            "playlist_id": playlist_id,
            "fetched_at": format_timestamp(&fetched_at),
            "total": item_count,
            "items": items,
        });

        let key = self.layout.raw_batch_key(&Generation::at(fetched_at));
        self.store
            .put(&key, Bytes::from(serde_json::to_vec(&body)?))
            .await?;

        info!("Wrote {} playlist items to {}", item_count, key);
        Ok(ExtractionResult {
            key,
            playlist_id,
            item_count,
        })
    }
}
