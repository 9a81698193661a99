//! Error types for the ETL pipeline.

use thiserror::Error;

/// Main error type for all extraction and transformation operations.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Client credentials were rejected by the playlist source.
    #[error("Auth error: {0}")]
    Auth(String),

    /// The playlist source could not be queried (network, not-found, API error).
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Invalid playlist link format.
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    /// A raw batch object could not be parsed into playlist items.
    #[error("Malformed batch {key}: {reason}")]
    MalformedBatch { key: String, reason: String },

    /// A date or timestamp field could not be parsed.
    #[error("Invalid {field} value: {value:?}")]
    FieldType { field: &'static str, value: String },

    /// The raw object was copied to the archive but the pending copy survived.
    #[error("Partial archive of {source_key} (copied to {archive_key}): {reason}")]
    PartialArchive {
        source_key: String,
        archive_key: String,
        reason: String,
    },

    /// Blob store operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration.
    #[error("Config error: {0}")]
    Config(String),
}

impl EtlError {
    /// Build a `MalformedBatch` error for the given object key.
    pub fn malformed<K: Into<String>, R: ToString>(key: K, reason: R) -> Self {
        Self::MalformedBatch {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach an object key to a `MalformedBatch` raised without one.
    pub fn in_batch(self, batch_key: &str) -> Self {
        match self {
            Self::MalformedBatch { key, reason } if key.is_empty() => Self::MalformedBatch {
                key: batch_key.to_string(),
                reason,
            },
            other => other,
        }
    }
}

impl From<reqwest::Error> for EtlError {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(err.to_string())
    }
}

/// Result type alias for ETL operations.
pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message() {
        let err = EtlError::malformed("raw_data/to_be_processed/a.json", "expected value");
        assert_eq!(
            err.to_string(),
            "Malformed batch raw_data/to_be_processed/a.json: expected value"
        );
    }

    #[test]
    fn test_in_batch_fills_missing_key() {
        let err = EtlError::malformed("", "no artists").in_batch("raw/b.json");
        assert!(matches!(err, EtlError::MalformedBatch { ref key, .. } if key == "raw/b.json"));

        let err = EtlError::malformed("raw/a.json", "bad").in_batch("raw/b.json");
        assert!(matches!(err, EtlError::MalformedBatch { ref key, .. } if key == "raw/a.json"));
    }
}
