use anvil_core::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("plan format_version {found} is not supported (executor supports up to {max_supported})")]
    UnsupportedFormatVersion { found: u32, max_supported: u32 },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch { url: String, expected: String, actual: String },

    #[error("step {step_index} ('{action}') references a path outside the staging root: {path}")]
    PathEscape { step_index: usize, action: String, path: String },

    #[error("step {step_index} ('{action}') requires a prior download step, but none has run")]
    NoArtifactStaged { step_index: usize, action: String },

    #[error("unknown action '{action}' at step {step_index}")]
    UnknownAction { action: String, step_index: usize },

    #[error("unsupported archive format for '{path}'")]
    UnsupportedArchiveFormat { path: String },

    #[error("step {step_index} ('{action}') command exited with status {status}")]
    CommandFailed {
        step_index: usize,
        action: String,
        status: i32,
    },

    #[error("install cancelled")]
    Cancelled,

    #[error(transparent)]
    Cache(#[from] anvil_cache::CacheError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl Categorized for ExecError {
    fn category(&self) -> ErrorCategory {
        match self {
            ExecError::ChecksumMismatch { .. } => ErrorCategory::ChecksumMismatch,
            ExecError::Cancelled => ErrorCategory::Cancelled,
            ExecError::Cache(e) => e.category(),
            ExecError::UnsupportedFormatVersion { .. }
            | ExecError::PathEscape { .. }
            | ExecError::NoArtifactStaged { .. }
            | ExecError::UnknownAction { .. }
            | ExecError::UnsupportedArchiveFormat { .. }
            | ExecError::CommandFailed { .. }
            | ExecError::Io(_)
            | ExecError::Zip(_) => ErrorCategory::InstallFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;
