use anvil_core::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("download cache is full (hard limit reached)")]
    CacheFull,

    #[error("artifact from {url} exceeds the configured size ceiling of {limit} bytes")]
    ArtifactTooLarge { url: String, limit: u64 },

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl Categorized for CacheError {
    fn category(&self) -> ErrorCategory {
        match self {
            CacheError::ChecksumMismatch { .. } => ErrorCategory::ChecksumMismatch,
            CacheError::CacheFull => ErrorCategory::CacheFull,
            CacheError::ArtifactTooLarge { .. } => ErrorCategory::ArtifactTooLarge,
            CacheError::Network(_) => ErrorCategory::Network,
            CacheError::Io(_) | CacheError::Serialize(_) => ErrorCategory::InstallFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
