//! Version cache: memoizes `resolve(recipe, constraint)` results under
//! `cache/versions/<recipe>/<constraint>.json`, keyed by `(recipe-name,
//! constraint)` with a configurable TTL. Grounded in
//! `vx-resolver::resolution_cache::ResolutionCache` (TTL-validated,
//! best-effort disk cache) but keyed by the much simpler
//! `(recipe, constraint)` pair spec.md §4.2 names, rather than a full
//! context fingerprint.

use std::time::Duration;

use anvil_cache::{now_epoch_secs, read_json_file, write_json_file};
use anvil_paths::HomeLayout;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::resolved::ResolvedVersion;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    resolved: ResolvedVersion,
    cached_at_epoch: u64,
}

/// Turns a user-supplied constraint into a filesystem-safe cache key
/// component. Empty constraint and `"latest"` share a key, since spec.md
/// §4.2 treats them as equivalent.
pub fn constraint_key(constraint: &str) -> String {
    let normalized = if constraint.is_empty() { "latest" } else { constraint };
    normalized.replace(['/', '\\', ':'], "_")
}

pub struct VersionCache {
    layout: HomeLayout,
    ttl: Duration,
}

impl VersionCache {
    pub fn new(layout: HomeLayout, ttl: Duration) -> Self {
        Self { layout, ttl }
    }

    /// Returns `Some` only for a fresh (within-TTL) hit. A stale or
    /// missing entry is `None`; the resolver treats either as a miss.
    pub fn get(&self, recipe_name: &str, constraint: &str) -> Option<ResolvedVersion> {
        let path = self.layout.version_cache_file(recipe_name, &constraint_key(constraint));
        let entry: CacheEntry = read_json_file(&path).ok()?;
        let age = now_epoch_secs().saturating_sub(entry.cached_at_epoch);
        if age > self.ttl.as_secs() {
            debug!(recipe = recipe_name, constraint, "version cache entry expired");
            return None;
        }
        debug!(recipe = recipe_name, constraint, "version cache hit");
        Some(entry.resolved)
    }

    /// Best-effort write; a failure here is logged by the caller and
    /// otherwise ignored, per spec.md §4.4's "write failure is logged and
    /// ignored" policy (applied uniformly to every disk cache in this
    /// system, not just the plan cache).
    pub fn put(&self, recipe_name: &str, constraint: &str, resolved: &ResolvedVersion) -> Result<()> {
        let path = self.layout.version_cache_file(recipe_name, &constraint_key(constraint));
        write_json_file(
            &path,
            &CacheEntry {
                resolved: resolved.clone(),
                cached_at_epoch: now_epoch_secs(),
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let cache = VersionCache::new(layout, Duration::from_secs(3600));

        let resolved = ResolvedVersion::new("1.2.3", "github_releases");
        cache.put("tool", "latest", &resolved).unwrap();
        assert_eq!(cache.get("tool", "latest"), Some(resolved));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let cache = VersionCache::new(layout, Duration::from_secs(0));

        cache.put("tool", "latest", &ResolvedVersion::new("1.2.3", "github_releases")).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(cache.get("tool", "latest"), None);
    }

    #[test]
    fn empty_constraint_and_latest_share_a_cache_key() {
        assert_eq!(constraint_key(""), constraint_key("latest"));
    }
}
