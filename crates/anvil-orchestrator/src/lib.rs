//! Install/remove/list orchestration (C11): the top-level flow combining
//! every other component — preflight, dependency induction, plan obtain,
//! execute, promote, state update, orphan cleanup.

pub mod context;
pub mod error;
pub mod install;
pub mod list;
pub mod promote;
pub mod remove;

pub use context::{OrchestratorContext, OrchestratorLimits};
pub use error::{OrchestratorError, Result};
pub use install::{install, InstallOutcome};
pub use list::{list, which, InstalledSummary};
pub use remove::{cleanup_orphans, remove};

/// Thin facade over [`OrchestratorContext`] so CLI code has one type to
/// hold rather than threading the context through free functions itself.
pub struct Orchestrator {
    ctx: OrchestratorContext,
}

impl Orchestrator {
    pub fn new(ctx: OrchestratorContext) -> Self {
        Self { ctx }
    }

    pub async fn install(&self, name: &str, constraint: &str) -> Result<InstallOutcome> {
        install::install(&self.ctx, name, constraint).await
    }

    pub fn remove(&self, name: &str) -> Result<Vec<String>> {
        remove::remove(&self.ctx, name)
    }

    pub fn cleanup_orphans(&self) -> Result<Vec<String>> {
        remove::cleanup_orphans(&self.ctx)
    }

    pub fn list(&self) -> Result<Vec<InstalledSummary>> {
        list::list(&self.ctx)
    }

    pub fn which(&self, binary_name: &str) -> Result<Option<std::path::PathBuf>> {
        list::which(&self.ctx, binary_name)
    }

    pub fn cleanup_downloads(&self, mode: anvil_cache::CleanupMode) -> Result<anvil_cache::CleanupReport> {
        Ok(self.ctx.download_cache.cleanup(mode)?)
    }

    pub fn context(&self) -> &OrchestratorContext {
        &self.ctx
    }
}
