//! Registry source: the recipe's own `[version].source_config.versions`
//! list is the version list, newest-first. Used by recipes that pin an
//! explicit, author-curated set of versions rather than querying an
//! upstream API.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{ResolverError, Result};
use crate::source::{VersionList, VersionSource};

pub struct RegistrySource;

#[async_trait]
impl VersionSource for RegistrySource {
    async fn fetch_versions(
        &self,
        recipe_name: &str,
        source_config: &BTreeMap<String, toml::Value>,
    ) -> Result<VersionList> {
        let versions = source_config
            .get("versions")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect::<Vec<_>>())
            .ok_or_else(|| ResolverError::InvalidSourceConfig {
                recipe: recipe_name.to_string(),
                message: "registry source requires a `versions` array in [version].source_config".to_string(),
            })?;

        if versions.is_empty() {
            return Err(ResolverError::NoVersionsAvailable {
                recipe: recipe_name.to_string(),
                source: "registry".to_string(),
            });
        }

        Ok(VersionList {
            versions,
            source_description: "registry".to_string(),
        })
    }

    fn name(&self) -> &str {
        "registry"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(versions: &[&str]) -> BTreeMap<String, toml::Value> {
        let mut map = BTreeMap::new();
        map.insert(
            "versions".to_string(),
            toml::Value::Array(versions.iter().map(|v| toml::Value::String(v.to_string())).collect()),
        );
        map
    }

    #[tokio::test]
    async fn fetches_pinned_version_list() {
        let source = RegistrySource;
        let list = source.fetch_versions("tool", &config(&["1.2.0", "1.1.0"])).await.unwrap();
        assert_eq!(list.versions, vec!["1.2.0", "1.1.0"]);
    }

    #[tokio::test]
    async fn missing_versions_key_is_invalid_config() {
        let source = RegistrySource;
        let err = source.fetch_versions("tool", &BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, ResolverError::InvalidSourceConfig { .. }));
    }
}
