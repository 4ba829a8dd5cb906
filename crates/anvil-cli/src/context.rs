//! Builds the one [`anvil_orchestrator::Orchestrator`] a CLI invocation uses,
//! wiring together config, the resolved home layout, and an HTTP client.

use anvil_cache::CacheLimits;
use anvil_core::{ConfigManager, Platform};
use anvil_orchestrator::{Orchestrator, OrchestratorContext, OrchestratorLimits};
use anvil_paths::HomeLayout;

pub async fn build_orchestrator() -> anyhow::Result<Orchestrator> {
    let config_manager = ConfigManager::load()?;
    let config = config_manager.config();

    let layout = HomeLayout::resolve()?;
    layout.ensure_dirs()?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("anvil/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let limits = OrchestratorLimits {
        download_cache: CacheLimits {
            soft_limit_bytes: config.defaults.download_cache_soft_limit_bytes,
            hard_limit_bytes: config.defaults.download_cache_hard_limit_bytes,
        },
        recipe_cache_ttl: std::time::Duration::from_secs(config.defaults.recipe_cache_ttl_secs),
        version_cache_ttl: std::time::Duration::from_secs(config.defaults.version_cache_ttl_secs),
        max_artifact_size_bytes: config.defaults.max_artifact_size_bytes,
    };

    let ctx = OrchestratorContext::with_limits(layout, Platform::current(), client, limits);
    Ok(Orchestrator::new(ctx))
}
