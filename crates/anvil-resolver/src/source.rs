//! `VersionSource`: one async trait per version-source kind, grounded in
//! `vx-version-fetcher::fetcher::VersionFetcher`. Implementations fetch an
//! ordered (newest-first) list of version strings for a recipe; the
//! resolver never talks to the network directly.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// A list of versions newest-first, as returned by one source.
#[derive(Debug, Clone)]
pub struct VersionList {
    pub versions: Vec<String>,
    pub source_description: String,
}

#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Fetch the ordered version list for a recipe. `source_config` is the
    /// recipe's `[version].source_config` table, passed through unparsed
    /// so each source interprets its own keys.
    async fn fetch_versions(
        &self,
        recipe_name: &str,
        source_config: &std::collections::BTreeMap<String, toml::Value>,
    ) -> Result<VersionList>;

    fn name(&self) -> &str;
}

pub type BoxedVersionSource = Box<dyn VersionSource>;

/// Trait-object registry so additional sources can be added without
/// touching `Resolver::resolve`'s core logic. Grounded in
/// `vx-version-fetcher::fetchers::mod`'s builder pattern.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, BoxedVersionSource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, source: BoxedVersionSource) {
        self.sources.insert(key.into(), source);
    }

    pub fn get(&self, key: &str) -> Option<&BoxedVersionSource> {
        self.sources.get(key)
    }

    /// The three built-in sources named in spec.md §4.2: `registry`,
    /// `github_releases` (upstream metadata API), `release_feed` (upstream
    /// release feed).
    pub fn builtin(client: reqwest::Client) -> Self {
        let mut registry = Self::new();
        registry.register("registry", Box::new(crate::sources::registry::RegistrySource));
        registry.register(
            "github_releases",
            Box::new(crate::sources::github::GithubReleasesSource::new(client.clone())),
        );
        registry.register(
            "release_feed",
            Box::new(crate::sources::release_feed::ReleaseFeedSource::new(client)),
        );
        registry
    }
}
