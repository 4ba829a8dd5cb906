use anvil_core::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("no version source registered for '{0}'")]
    UnknownSource(String),

    #[error("version '{constraint}' not found for '{recipe}'")]
    VersionNotFound { recipe: String, constraint: String },

    #[error("version source '{source}' returned no versions for '{recipe}'")]
    NoVersionsAvailable { recipe: String, source: String },

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error("invalid source configuration for '{recipe}': {message}")]
    InvalidSourceConfig { recipe: String, message: String },

    #[error(transparent)]
    Cache(#[from] anvil_cache::CacheError),
}

impl Categorized for ResolverError {
    fn category(&self) -> ErrorCategory {
        match self {
            ResolverError::VersionNotFound { .. } => ErrorCategory::VersionNotFound,
            ResolverError::Network(_) => ErrorCategory::Network,
            ResolverError::UnknownSource(_)
            | ResolverError::NoVersionsAvailable { .. }
            | ResolverError::Io(_)
            | ResolverError::Serialize(_)
            | ResolverError::InvalidSourceConfig { .. }
            | ResolverError::Cache(_) => ErrorCategory::InstallFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolverError>;
