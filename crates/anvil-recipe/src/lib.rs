//! Recipe model, action registry, and recipe loading (C2/C3).

pub mod action;
pub mod error;
pub mod loader;
pub mod model;
pub mod shadow;

pub use action::{ActionDescriptor, ActionRegistry, DecomposeInput, DecomposeOutcome, Evaluability};
pub use error::{RecipeError, Result};
pub use loader::RecipeLoader;
pub use model::{Metadata, Recipe, RecipeKind, Step, Verify, VersionSpec, WhenClause};
pub use shadow::{find_shadowed_dependencies, ShadowedDependency};
