//! Plan generation and caching (C7, C8): turns a recipe and resolved
//! version into a serializable `InstallationPlan`, and memoizes that plan
//! by fingerprint so repeat installs skip re-decomposition.

pub mod decomposer;
pub mod error;
pub mod model;
pub mod placeholder;
pub mod plan_cache;

pub use decomposer::{Decomposer, DenyAllEvalDependencies, EvalDependencyGate};
pub use error::{PlanError, Result};
pub use model::{InstallationPlan, PlanPlatform, RecipeSource, ResolvedStep, CURRENT_FORMAT_VERSION};
pub use placeholder::SubstitutionContext;
pub use plan_cache::PlanCache;
