//! Top-level error (spec.md §4.6/§7): wraps every stage error behind
//! `#[from]` while preserving the externally-stable category each stage
//! already computes for itself.

use anvil_core::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("circular dependency detected while installing '{tool}'")]
    CircularDependency { tool: String },

    #[error("installing dependency '{dependency}' of '{tool}' failed: {source}")]
    DependencyFailed {
        tool: String,
        dependency: String,
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("'{tool}' is not installed")]
    NotInstalled { tool: String },

    #[error(transparent)]
    Recipe(#[from] anvil_recipe::RecipeError),

    #[error(transparent)]
    Resolver(#[from] anvil_resolver::ResolverError),

    #[error(transparent)]
    Plan(#[from] anvil_plan::PlanError),

    #[error(transparent)]
    Exec(#[from] anvil_executor::ExecError),

    #[error(transparent)]
    State(#[from] anvil_state::StateError),

    #[error(transparent)]
    Cache(#[from] anvil_cache::CacheError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Categorized for OrchestratorError {
    fn category(&self) -> ErrorCategory {
        match self {
            OrchestratorError::CircularDependency { .. } => ErrorCategory::CircularDependency,
            OrchestratorError::DependencyFailed { .. } => ErrorCategory::DependencyFailed,
            OrchestratorError::NotInstalled { .. } => ErrorCategory::InstallFailed,
            OrchestratorError::Recipe(e) => e.category(),
            OrchestratorError::Resolver(e) => e.category(),
            OrchestratorError::Plan(e) => e.category(),
            OrchestratorError::Exec(e) => e.category(),
            OrchestratorError::State(e) => e.category(),
            OrchestratorError::Cache(e) => e.category(),
            OrchestratorError::Io(_) => ErrorCategory::InstallFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
