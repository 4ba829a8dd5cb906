//! Recipe cache (spec.md §4.10): fetched remote recipes cached under
//! `registry/<name>.toml` with a sibling `<name>.access` sidecar. New code
//! grounded in `vx-cache::download`'s metadata-sidecar idiom, since the
//! teacher has no cache of this shape.

use std::path::PathBuf;
use std::time::Duration;

use anvil_paths::HomeLayout;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::file::{atomic_write_string, now_epoch_secs, read_json_file, write_json_file};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessSidecar {
    last_access_epoch: u64,
    last_fetch_epoch: u64,
}

#[derive(Debug, Clone)]
pub struct RecipeCacheEntry {
    pub toml_source: String,
    /// `true` if this entry is past its TTL; the caller decides whether a
    /// stale entry is still acceptable (spec.md: "the stale entry is still
    /// returned with a staleness indicator" when refresh fails).
    pub stale: bool,
}

#[derive(Debug, Default, Clone)]
pub struct RecipeCacheStats {
    pub entry_count: usize,
    pub stale_count: usize,
    pub oldest_fetch_epoch: Option<u64>,
    pub newest_fetch_epoch: Option<u64>,
}

pub struct RecipeCache {
    layout: HomeLayout,
    ttl: Duration,
}

impl RecipeCache {
    pub fn new(layout: HomeLayout, ttl: Duration) -> Self {
        Self { layout, ttl }
    }

    fn access_path(&self, name: &str) -> PathBuf {
        self.layout.registry_dir().join(format!("{name}.access"))
    }

    /// Look up a cached entry, marking it accessed. Returns `None` only
    /// when nothing has ever been cached for `name`.
    pub fn get(&self, name: &str) -> Result<Option<RecipeCacheEntry>> {
        let recipe_path = self.layout.registry_recipe_file(name);
        if !recipe_path.exists() {
            return Ok(None);
        }
        let toml_source = std::fs::read_to_string(&recipe_path)?;

        let access_path = self.access_path(name);
        let mut sidecar: AccessSidecar = read_json_file(&access_path).unwrap_or(AccessSidecar {
            last_access_epoch: 0,
            last_fetch_epoch: 0,
        });
        let now = now_epoch_secs();
        let stale = now.saturating_sub(sidecar.last_fetch_epoch) > self.ttl.as_secs();
        sidecar.last_access_epoch = now;
        write_json_file(&access_path, &sidecar)?;

        Ok(Some(RecipeCacheEntry { toml_source, stale }))
    }

    /// Store a freshly-fetched recipe, resetting its fetch timestamp.
    pub fn put(&self, name: &str, toml_source: &str) -> Result<()> {
        std::fs::create_dir_all(self.layout.registry_dir())?;
        atomic_write_string(&self.layout.registry_recipe_file(name), toml_source)?;
        let now = now_epoch_secs();
        write_json_file(
            &self.access_path(name),
            &AccessSidecar {
                last_access_epoch: now,
                last_fetch_epoch: now,
            },
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<RecipeCacheStats> {
        let dir = self.layout.registry_dir();
        if !dir.exists() {
            return Ok(RecipeCacheStats::default());
        }
        let now = now_epoch_secs();
        let mut stats = RecipeCacheStats::default();
        let mut fetch_times = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("access") {
                continue;
            }
            let sidecar: AccessSidecar = match read_json_file(&path) {
                Ok(s) => s,
                Err(_) => continue,
            };
            stats.entry_count += 1;
            if now.saturating_sub(sidecar.last_fetch_epoch) > self.ttl.as_secs() {
                stats.stale_count += 1;
            }
            fetch_times.push(sidecar.last_fetch_epoch);
        }

        stats.oldest_fetch_epoch = fetch_times.iter().copied().min();
        stats.newest_fetch_epoch = fetch_times.iter().copied().max();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips_and_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let cache = RecipeCache::new(layout, Duration::from_secs(86_400));

        cache.put("node", "[metadata]\nname = \"node\"").unwrap();
        let entry = cache.get("node").unwrap().unwrap();
        assert!(!entry.stale);
        assert!(entry.toml_source.contains("node"));
    }

    #[test]
    fn get_on_missing_entry_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let cache = RecipeCache::new(layout, Duration::from_secs(86_400));
        assert!(cache.get("ghost").unwrap().is_none());
    }

    #[test]
    fn zero_ttl_marks_entry_stale_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let cache = RecipeCache::new(layout, Duration::from_secs(0));
        cache.put("node", "[metadata]\nname = \"node\"").unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        let entry = cache.get("node").unwrap().unwrap();
        assert!(entry.stale);
    }
}
