//! Plan cache (spec.md §4.4): fingerprint-keyed, no TTL. A cached plan is
//! reused verbatim when its `(tool, version, os, arch, recipe_hash)` match
//! the current request; otherwise the decomposer runs again and the result
//! overwrites the stale entry. Grounded in `vx-cache`'s file-backed,
//! best-effort-write cache idiom, reused here for JSON plan documents
//! instead of raw blobs.

use anvil_paths::HomeLayout;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::InstallationPlan;

pub struct PlanCache {
    layout: HomeLayout,
}

impl PlanCache {
    pub fn new(layout: HomeLayout) -> Self {
        Self { layout }
    }

    /// Phase 1 of spec.md §4.4's two-phase retrieval: look up a plan
    /// already on disk whose fingerprint matches, unless the caller passed
    /// `--fresh`. Returns `None` on any miss (absent, corrupt, or
    /// fingerprint mismatch) — a corrupt cache entry is never fatal.
    pub fn get(&self, tool: &str, version: &str, fresh: bool, recipe_hash: &str, platform: &anvil_core::Platform) -> Option<InstallationPlan> {
        if fresh {
            return None;
        }
        let path = self.layout.plan_cache_file(tool, version);
        let plan: InstallationPlan = anvil_cache::read_json_file(&path).ok()?;
        if plan.matches_fingerprint(tool, version, platform, recipe_hash) {
            debug!(tool, version, "plan cache hit");
            Some(plan)
        } else {
            debug!(tool, version, "plan cache entry present but fingerprint mismatch");
            None
        }
    }

    /// Best-effort write; failures are logged and otherwise ignored per
    /// spec.md §4.4.
    pub fn put(&self, plan: &InstallationPlan) -> Result<()> {
        let path = self.layout.plan_cache_file(&plan.tool, &plan.version);
        if let Err(e) = anvil_cache::write_json_file(&path, plan) {
            warn!(tool = plan.tool, version = plan.version, error = %e, "failed to write plan cache entry, ignoring");
        }
        Ok(())
    }
}
