//! Content-addressed download cache (C5) and recipe cache (C6), plus the
//! atomic JSON/file-write helpers shared with `anvil-state`'s `state.json`.

pub mod download;
pub mod error;
pub mod file;
pub mod recipe_cache;

pub use download::{CacheLimits, CachedArtifact, CleanupMode, CleanupReport, DownloadCache, DownloadCacheStats};
pub use error::{CacheError, Result};
pub use file::{atomic_write_bytes, atomic_write_string, now_epoch_secs, read_json_file, write_json_file};
pub use recipe_cache::{RecipeCache, RecipeCacheEntry, RecipeCacheStats};
