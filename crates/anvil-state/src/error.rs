use anvil_core::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not acquire state.json lock within the configured wait")]
    Busy,

    #[error("tool '{0}' is not present in state")]
    ToolNotFound(String),

    #[error("version '{version}' of '{tool}' is not present in state")]
    VersionNotFound { tool: String, version: String },

    #[error("'{tool}' is still required by {required_by:?}; remove those first or use force")]
    DependencyStillRequired { tool: String, required_by: Vec<String> },

    #[error("state.json schema_version {0} is newer than this build understands")]
    UnknownSchemaVersion(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Cache(#[from] anvil_cache::CacheError),
}

impl Categorized for StateError {
    fn category(&self) -> ErrorCategory {
        match self {
            StateError::Busy => ErrorCategory::Busy,
            StateError::ToolNotFound(_)
            | StateError::VersionNotFound { .. }
            | StateError::DependencyStillRequired { .. }
            | StateError::UnknownSchemaVersion(_)
            | StateError::Io(_)
            | StateError::Serialize(_)
            | StateError::Cache(_) => ErrorCategory::InstallFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, StateError>;
