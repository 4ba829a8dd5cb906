use anvil_core::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("'{tool}' is not supported on {os}/{arch}")]
    UnsupportedPlatform { tool: String, os: String, arch: String },

    #[error("no steps remain for '{tool}' on {os}/{arch} after platform filtering")]
    NoStepsForPlatform { tool: String, os: String, arch: String },

    #[error("artifact from {url} exceeds the configured size ceiling of {limit} bytes")]
    ArtifactTooLarge { url: String, limit: u64 },

    #[error("evaluating '{action}' requires {tools:?} to already be on disk, but auto-accept was declined")]
    EvalDependenciesRequired { action: String, tools: Vec<String> },

    #[error("unknown action '{action}' at step {step_index}")]
    UnknownAction { action: String, step_index: usize },

    #[error(transparent)]
    Recipe(#[from] anvil_recipe::RecipeError),

    #[error(transparent)]
    Cache(#[from] anvil_cache::CacheError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl Categorized for PlanError {
    fn category(&self) -> ErrorCategory {
        match self {
            PlanError::UnsupportedPlatform { .. } => ErrorCategory::UnsupportedPlatform,
            PlanError::ArtifactTooLarge { .. } => ErrorCategory::ArtifactTooLarge,
            PlanError::Cache(e) => e.category(),
            PlanError::Recipe(e) => e.category(),
            PlanError::NoStepsForPlatform { .. }
            | PlanError::EvalDependenciesRequired { .. }
            | PlanError::UnknownAction { .. }
            | PlanError::Io(_)
            | PlanError::Serialize(_) => ErrorCategory::InstallFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
