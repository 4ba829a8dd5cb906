//! Shared error taxonomy.
//!
//! Every stage crate (`anvil-recipe`, `anvil-resolver`, `anvil-plan`,
//! `anvil-executor`, `anvil-state`, `anvil-orchestrator`, ...) defines its own
//! `thiserror`-derived error enum local to that stage. This module provides
//! the externally-stable [`ErrorCategory`] each of those enums maps onto via
//! a `category()` method, plus [`AnvilError`], the top-level error the
//! orchestrator and CLI actually see.

use std::fmt;

/// Stable external error category, as listed in the on-disk/CLI contract.
///
/// These names are part of the external interface: the CLI maps them to
/// exit codes and scripts may match on them. Never rename a variant here
/// without treating it as a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    RecipeNotFound,
    VersionNotFound,
    UnsupportedPlatform,
    Network,
    ChecksumMismatch,
    ArtifactTooLarge,
    DependencyFailed,
    CircularDependency,
    Cancelled,
    Busy,
    CacheFull,
    InstallFailed,
}

impl ErrorCategory {
    /// The stable lower_snake_case name used in logs and CLI error output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::RecipeNotFound => "recipe_not_found",
            ErrorCategory::VersionNotFound => "version_not_found",
            ErrorCategory::UnsupportedPlatform => "unsupported_platform",
            ErrorCategory::Network => "network",
            ErrorCategory::ChecksumMismatch => "checksum_mismatch",
            ErrorCategory::ArtifactTooLarge => "artifact_too_large",
            ErrorCategory::DependencyFailed => "dependency_failed",
            ErrorCategory::CircularDependency => "circular_dependency",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::Busy => "busy",
            ErrorCategory::CacheFull => "cache_full",
            ErrorCategory::InstallFailed => "install_failed",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Implemented by every stage-local error enum so the orchestrator can
/// surface a stable category regardless of which stage failed.
pub trait Categorized {
    fn category(&self) -> ErrorCategory;
}

/// Top-level error surfaced by `anvil-orchestrator` and the CLI.
///
/// Stage crates keep their own error enums (`RecipeError`, `ResolverError`,
/// `PlanError`, `ExecutorError`, `StateError`, ...); this wraps any of them
/// behind `anyhow` while preserving the category for exit-code mapping.
#[derive(Debug, thiserror::Error)]
pub enum AnvilError {
    #[error("{message}")]
    Categorized {
        category: ErrorCategory,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnvilError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        AnvilError::Categorized {
            category,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        category: ErrorCategory,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        AnvilError::Categorized {
            category,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Category for exit-code mapping. Errors that arrive via the
    /// transparent `anyhow` variant (not produced by a categorized stage
    /// error) default to `install_failed`, the catch-all fatal category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnvilError::Categorized { category, .. } => *category,
            AnvilError::Other(_) => ErrorCategory::InstallFailed,
        }
    }
}

/// Crate-local result alias used throughout `anvil-core`.
pub type Result<T> = std::result::Result<T, AnvilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_as_str_matches_external_contract() {
        assert_eq!(ErrorCategory::VersionNotFound.as_str(), "version_not_found");
        assert_eq!(ErrorCategory::CircularDependency.as_str(), "circular_dependency");
    }

    #[test]
    fn other_variant_defaults_to_install_failed() {
        let err = AnvilError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.category(), ErrorCategory::InstallFailed);
    }

    #[test]
    fn categorized_variant_preserves_category() {
        let err = AnvilError::new(ErrorCategory::Busy, "state is locked");
        assert_eq!(err.category(), ErrorCategory::Busy);
    }
}
