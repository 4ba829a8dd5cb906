//! Recipe loading: local user-authored recipes take precedence over the
//! cached registry copy. Grounded in `vx-manifest::provider::manifest`'s
//! TOML load pattern.

use anvil_paths::HomeLayout;
use tracing::debug;

use crate::error::{RecipeError, Result};
use crate::model::Recipe;

pub struct RecipeLoader<'a> {
    layout: &'a HomeLayout,
}

impl<'a> RecipeLoader<'a> {
    pub fn new(layout: &'a HomeLayout) -> Self {
        Self { layout }
    }

    /// Local recipe (`recipes/<name>.toml`) first, then the registry cache
    /// (`registry/<name>.toml`). Fails with `RecipeError::NotFound` if
    /// neither exists.
    pub fn load(&self, name: &str) -> Result<Recipe> {
        let local = self.layout.local_recipe_file(name);
        if local.exists() {
            debug!(recipe = name, path = %local.display(), "loading local recipe");
            let contents = std::fs::read_to_string(&local)?;
            return Recipe::parse(&contents);
        }

        let registry = self.layout.registry_recipe_file(name);
        if registry.exists() {
            debug!(recipe = name, path = %registry.display(), "loading registry-cached recipe");
            let contents = std::fs::read_to_string(&registry)?;
            return Recipe::parse(&contents);
        }

        Err(RecipeError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_recipe_takes_precedence_over_registry() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(dir.path());
        layout.ensure_dirs().unwrap();

        let local_toml = r#"
[metadata]
name = "tool"
[version]
source = "registry"
"#;
        let registry_toml = r#"
[metadata]
name = "tool"
description = "from registry"
[version]
source = "registry"
"#;
        std::fs::write(layout.local_recipe_file("tool"), local_toml).unwrap();
        std::fs::write(layout.registry_recipe_file("tool"), registry_toml).unwrap();

        let loader = RecipeLoader::new(&layout);
        let recipe = loader.load("tool").unwrap();
        assert!(recipe.metadata.description.is_none());
    }

    #[test]
    fn missing_recipe_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let loader = RecipeLoader::new(&layout);
        let err = loader.load("ghost").unwrap_err();
        assert!(matches!(err, RecipeError::NotFound(_)));
    }
}
