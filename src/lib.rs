//! # Playlist ETL
//!
//! A two-stage batch pipeline that turns a Spotify playlist into three
//! CSV tables (albums, artists, songs).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use playlist_etl::{Credentials, Extractor, LocalBlobStore, SpotifyApi, Transformer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(LocalBlobStore::new("bucket"));
//!
//!     // Stage one: playlist -> raw_data/to_be_processed/*.json
//!     let api = SpotifyApi::new(Credentials::new("client_id", "client_secret"))?;
//!     let extractor = Extractor::new(Arc::new(api), store.clone());
//!     extractor
//!         .run("https://open.spotify.com/playlist/34NbomaTu7YuOYnky8nLXL")
//!         .await?;
//!
//!     // Stage two: pending batches -> transformed_data/*/*.csv
//!     let result = Transformer::new(store).run().await?;
//!     println!("{} batches archived", result.processed.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Stages
//!
//! - [`Extractor`] fetches every page of a playlist and writes the raw
//!   records as one timestamped JSON object into the pending area
//! - [`Transformer`] turns each pending object into deduplicated album,
//!   artist and song tables, writes them as CSV, then archives the object
//!
//! The two stages share nothing but the [`BlobStore`]; see [`layout`] for
//! the prefixes they use.

pub mod api;
pub mod converters;
pub mod error;
mod extractor;
pub mod layout;
pub mod models;
pub mod storage;
mod transformer;

// Pipeline stages
pub use extractor::{ExtractionResult, Extractor};
pub use transformer::{BatchStage, FailedBatch, ProcessedBatch, TransformResult, Transformer};

// Collaborators
pub use api::{Credentials, PlaylistSource, SpotifyApi};
pub use error::{EtlError, Result};
pub use layout::StoreLayout;
pub use models::{AlbumRow, ArtistRow, PlaylistBatch, SongRow};
pub use storage::{BlobStore, LocalBlobStore, MemoryBlobStore};
