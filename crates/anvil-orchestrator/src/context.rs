//! Everything one orchestrator call needs: the layout, the stage
//! components each wired to it, and the cancellation token for this
//! operation. One `OrchestratorContext` is built per `anvil` invocation
//! and shared (via `&`) across every recursive dependency install.

use std::time::Duration;

use anvil_cache::{CacheLimits, DownloadCache, RecipeCache};
use anvil_core::{CancellationToken, Platform};
use anvil_paths::HomeLayout;
use anvil_plan::PlanCache;
use anvil_recipe::action::ActionRegistry;
use anvil_recipe::loader::RecipeLoader;
use anvil_resolver::{Resolver, SourceRegistry, VersionCache};
use anvil_state::StateManager;

/// The config-derived knobs an `OrchestratorContext` needs beyond the
/// layout/platform/client every call already has: the download-cache
/// watermarks plus every TTL/ceiling `AnvilConfig::defaults` declares.
/// Bundled so the constructor doesn't grow a positional parameter per
/// config field. Grounded in `anvil_core::config::DefaultSettings`.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorLimits {
    pub download_cache: CacheLimits,
    pub recipe_cache_ttl: Duration,
    pub version_cache_ttl: Duration,
    pub max_artifact_size_bytes: u64,
}

impl Default for OrchestratorLimits {
    fn default() -> Self {
        Self {
            download_cache: CacheLimits {
                soft_limit_bytes: 5 * 1024 * 1024 * 1024,
                hard_limit_bytes: 10 * 1024 * 1024 * 1024,
            },
            recipe_cache_ttl: Duration::from_secs(86_400),
            version_cache_ttl: Duration::from_secs(3600),
            max_artifact_size_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

pub struct OrchestratorContext {
    pub layout: HomeLayout,
    pub platform: Platform,
    pub actions: ActionRegistry,
    pub download_cache: DownloadCache,
    pub recipe_cache: RecipeCache,
    pub plan_cache: PlanCache,
    pub resolver: Resolver,
    pub state: StateManager,
    pub cancel: CancellationToken,
    pub max_artifact_size_bytes: u64,
}

impl OrchestratorContext {
    pub fn new(layout: HomeLayout, platform: Platform, client: reqwest::Client, limits: CacheLimits) -> Self {
        Self::with_limits(
            layout,
            platform,
            client,
            OrchestratorLimits {
                download_cache: limits,
                ..OrchestratorLimits::default()
            },
        )
    }

    pub fn with_limits(layout: HomeLayout, platform: Platform, client: reqwest::Client, limits: OrchestratorLimits) -> Self {
        let download_cache = DownloadCache::new(layout.clone(), limits.download_cache, client.clone());
        let recipe_cache = RecipeCache::new(layout.clone(), limits.recipe_cache_ttl);
        let plan_cache = PlanCache::new(layout.clone());
        let version_cache = VersionCache::new(layout.clone(), limits.version_cache_ttl);
        let resolver = Resolver::new(SourceRegistry::builtin(client), version_cache);
        let state = StateManager::new(layout.clone());

        Self {
            layout,
            platform,
            actions: ActionRegistry::builtin(),
            download_cache,
            recipe_cache,
            plan_cache,
            resolver,
            state,
            cancel: CancellationToken::new(),
            max_artifact_size_bytes: limits.max_artifact_size_bytes,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn recipe_loader(&self) -> RecipeLoader<'_> {
        RecipeLoader::new(&self.layout)
    }
}
