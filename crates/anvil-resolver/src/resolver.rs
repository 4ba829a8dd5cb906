//! `resolve(recipe, constraint) -> ResolvedVersion` (spec.md §4.2).
//!
//! Empty constraint and `"latest"` both mean "newest per source ordering".
//! A pinned constraint must appear verbatim in the source's version list.
//! Network failures are retried with bounded backoff (`backon`); partial
//! results (a version list obtained but not the one needed) are never
//! cached — only a fully successful resolution is written to the version
//! cache.

use std::time::Duration;

use anvil_recipe::Recipe;
use backon::{ExponentialBuilder, Retryable};
use tracing::{debug, info, warn};

use crate::cache::VersionCache;
use crate::error::{ResolverError, Result};
use crate::resolved::ResolvedVersion;
use crate::source::SourceRegistry;

/// Sentinel version used by the one documented fallback path: an empty
/// user constraint whose resolution failed entirely (spec.md §4.2, §7).
pub const DEV_SENTINEL_VERSION: &str = "dev";

pub struct Resolver {
    sources: SourceRegistry,
    cache: VersionCache,
    max_retries: usize,
    min_delay: Duration,
    max_delay: Duration,
}

impl Resolver {
    pub fn new(sources: SourceRegistry, cache: VersionCache) -> Self {
        Self {
            sources,
            cache,
            max_retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    pub fn with_retry_budget(mut self, max_retries: usize, min_delay: Duration, max_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    fn retry_strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    /// `resolve(recipe, constraint) -> ResolvedVersion`, idempotent for a
    /// given `(recipe, constraint, time-of-fetch)` modulo TTL expiry.
    pub async fn resolve(&self, recipe: &Recipe, constraint: &str) -> Result<ResolvedVersion> {
        let recipe_name = recipe.metadata.name.as_str();

        if let Some(cached) = self.cache.get(recipe_name, constraint) {
            return Ok(cached);
        }

        let source = self
            .sources
            .get(&recipe.version.source)
            .ok_or_else(|| ResolverError::UnknownSource(recipe.version.source.clone()))?;

        let recipe_name_owned = recipe_name.to_string();
        let list = (|| async { source.fetch_versions(&recipe_name_owned, &recipe.version.source_config).await })
            .retry(self.retry_strategy())
            .notify(|err: &ResolverError, dur: Duration| {
                warn!(recipe = recipe_name_owned, error = %err, delay = ?dur, "version fetch failed, retrying");
            })
            .when(|e| matches!(e, ResolverError::Network(_)))
            .await?;

        let resolved = if constraint.is_empty() || constraint.eq_ignore_ascii_case("latest") {
            let version = list
                .versions
                .first()
                .ok_or_else(|| ResolverError::NoVersionsAvailable {
                    recipe: recipe_name.to_string(),
                    source: source.name().to_string(),
                })?
                .clone();
            ResolvedVersion::new(version, list.source_description)
        } else if list.versions.iter().any(|v| v == constraint) {
            ResolvedVersion::new(constraint.to_string(), list.source_description)
        } else {
            return Err(ResolverError::VersionNotFound {
                recipe: recipe_name.to_string(),
                constraint: constraint.to_string(),
            });
        };

        if let Err(e) = self.cache.put(recipe_name, constraint, &resolved) {
            warn!(recipe = recipe_name, error = %e, "failed to write version cache entry, ignoring");
        }
        info!(recipe = recipe_name, version = resolved.version, source = resolved.source_description, "resolved version");

        Ok(resolved)
    }

    /// Wraps [`resolve`](Self::resolve) with the one documented fallback
    /// path (spec.md §4.2/§7): an *empty* constraint whose resolution
    /// failed falls back to the `"dev"` sentinel. A pinned constraint
    /// never falls back — its failure is always fatal.
    pub async fn resolve_or_dev_fallback(&self, recipe: &Recipe, constraint: &str) -> Result<ResolvedVersion> {
        match self.resolve(recipe, constraint).await {
            Ok(resolved) => Ok(resolved),
            Err(e) if constraint.is_empty() => {
                debug!(
                    recipe = recipe.metadata.name,
                    error = %e,
                    "empty constraint failed to resolve, falling back to dev sentinel"
                );
                Ok(ResolvedVersion::new(DEV_SENTINEL_VERSION, "fallback"))
            }
            Err(e) => Err(e),
        }
    }
}
