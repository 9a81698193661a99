//! Blob store abstraction.
//!
//! Both pipeline stages talk to storage only through [`BlobStore`], a flat
//! key/value namespace with S3-like semantics: keys are `/`-separated
//! strings and listing is a plain string-prefix match.
//!
//! - [`LocalBlobStore`]: keys map to files under a root directory
//! - [`MemoryBlobStore`]: keys live in a map, used by tests and dry runs

pub mod local;
pub mod memory;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Object storage operations used by the extractor and transformer.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List all keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Fetch an object's body.
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Create or overwrite an object.
    async fn put(&self, key: &str, body: Bytes) -> Result<()>;

    /// Copy an object to a new key.
    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<()>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> Result<()>;
}
