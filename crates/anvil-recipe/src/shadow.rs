//! Shadowed-dependency detection: a recipe's explicit `dependencies` list
//! naming something already implied by one of its own actions.

use crate::action::ActionRegistry;
use crate::model::Recipe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedDependency {
    pub dependency: String,
    /// The action whose implicit dependency already covers it.
    pub action: String,
    pub step_index: usize,
}

impl std::fmt::Display for ShadowedDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dependency '{}' is already implied by action '{}' at step {} \
             (listing it under [metadata].dependencies is redundant)",
            self.dependency, self.action, self.step_index
        )
    }
}

/// Returns one entry per explicit dependency that's also implied by an
/// action somewhere in the recipe's steps. Does not fail the recipe: the
/// caller decides whether to surface these as warnings.
pub fn find_shadowed_dependencies(recipe: &Recipe, registry: &ActionRegistry) -> Vec<ShadowedDependency> {
    let mut found = Vec::new();
    for (index, step) in recipe.steps.iter().enumerate() {
        for implied in registry.implicit_dependencies_for(&step.action) {
            if recipe.metadata.dependencies.iter().any(|d| d == implied) {
                found.push(ShadowedDependency {
                    dependency: (*implied).to_string(),
                    action: step.action.clone(),
                    step_index: index,
                });
            }
        }
    }
    found
}
