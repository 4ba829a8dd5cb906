//! Content-addressed download cache (spec.md §4.9).
//!
//! Layout: `cache/downloads/<first-2-hex>/<rest-of-hex>`, keyed by the
//! artifact's expected sha256. Grounded in `vx-cache::download`'s sharded
//! stage-then-rename design; the soft/hard watermark eviction and
//! `.meta` access-time sidecar are new, added in the same file's idiom
//! since the teacher's `DownloadCache` has no LRU eviction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anvil_paths::HomeLayout;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::file::{atomic_write_bytes, now_epoch_secs, read_json_file, write_json_file};

/// Sidecar metadata stored alongside each cached blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobMeta {
    size: u64,
    last_access_epoch: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheLimits {
    pub soft_limit_bytes: u64,
    pub hard_limit_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct CachedArtifact {
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
}

#[derive(Debug, Default, Clone)]
pub struct DownloadCacheStats {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub oldest_access_epoch: Option<u64>,
    pub newest_access_epoch: Option<u64>,
}

pub enum CleanupMode {
    /// Evict entries whose last access is older than `threshold`.
    MaxAge(Duration),
    /// Evict least-recently-used entries until usage is back at or below
    /// the soft limit.
    ForceLimit,
}

#[derive(Debug, Default, Clone)]
pub struct CleanupReport {
    pub evicted_count: usize,
    pub evicted_bytes: u64,
}

pub struct DownloadCache {
    layout: HomeLayout,
    limits: CacheLimits,
    client: reqwest::Client,
}

impl DownloadCache {
    pub fn new(layout: HomeLayout, limits: CacheLimits, client: reqwest::Client) -> Self {
        Self {
            layout,
            limits,
            client,
        }
    }

    fn meta_path(&self, blob_path: &Path) -> PathBuf {
        blob_path.with_extension("meta")
    }

    /// Ensure the artifact named by `expected_sha256` is present in the
    /// cache, downloading it from `url` if necessary. Returns the on-disk
    /// path plus verified size.
    pub async fn ensure(&self, url: &str, expected_sha256: &str) -> Result<CachedArtifact> {
        let blob_path = self.layout.download_path(expected_sha256);

        if blob_path.exists() {
            self.touch(expected_sha256)?;
            let size = std::fs::metadata(&blob_path)?.len();
            debug!(url, sha256 = expected_sha256, "download cache hit");
            return Ok(CachedArtifact {
                path: blob_path,
                sha256: expected_sha256.to_string(),
                size,
            });
        }

        debug!(url, sha256 = expected_sha256, "download cache miss, fetching");
        let (tmp_path, size, actual_sha256) = self.stream_to_tmp(url, None).await?;

        if actual_sha256 != expected_sha256 {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(CacheError::ChecksumMismatch {
                url: url.to_string(),
                expected: expected_sha256.to_string(),
                actual: actual_sha256,
            });
        }

        self.make_room_for(size)?;

        if let Some(parent) = blob_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&tmp_path, &blob_path)?;
        write_json_file(
            &self.meta_path(&blob_path),
            &BlobMeta {
                size,
                last_access_epoch: now_epoch_secs(),
            },
        )?;

        Ok(CachedArtifact {
            path: blob_path,
            sha256: expected_sha256.to_string(),
            size,
        })
    }

    /// Fetch `url` with no checksum known in advance, storing the result
    /// under its own computed sha256. Used by the plan decomposer (spec.md
    /// §4.3 step 4), which must learn an artifact's checksum by fetching it
    /// once; later executions verify against the checksum this recorded.
    /// `max_size_bytes`, if set, aborts the transfer (before it completes,
    /// though a chunk boundary may already be on disk) the moment either a
    /// declared `Content-Length` or the running byte count exceeds it.
    pub async fn ingest(&self, url: &str, max_size_bytes: Option<u64>) -> Result<CachedArtifact> {
        let (tmp_path, size, sha256) = self.stream_to_tmp(url, max_size_bytes).await?;
        let blob_path = self.layout.download_path(&sha256);

        if blob_path.exists() {
            let _ = std::fs::remove_file(&tmp_path);
            self.touch(&sha256)?;
            return Ok(CachedArtifact { path: blob_path, sha256, size });
        }

        self.make_room_for(size)?;
        if let Some(parent) = blob_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&tmp_path, &blob_path)?;
        write_json_file(
            &self.meta_path(&blob_path),
            &BlobMeta {
                size,
                last_access_epoch: now_epoch_secs(),
            },
        )?;

        Ok(CachedArtifact { path: blob_path, sha256, size })
    }

    async fn stream_to_tmp(&self, url: &str, max_size_bytes: Option<u64>) -> Result<(PathBuf, u64, String)> {
        let tmp_path = self.layout.work_dir().join(format!("{}.tmp", uuid::Uuid::new_v4()));
        if let Some(parent) = tmp_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let response = self.client.get(url).send().await?.error_for_status()?;

        if let Some(limit) = max_size_bytes {
            if let Some(declared) = response.content_length() {
                if declared > limit {
                    return Err(CacheError::ArtifactTooLarge {
                        url: url.to_string(),
                        limit,
                    });
                }
            }
        }

        let mut stream = response.bytes_stream();
        let mut file = std::fs::File::create(&tmp_path)?;
        let mut hasher = Sha256::new();
        let mut size: u64 = 0;

        use std::io::Write;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            if let Some(limit) = max_size_bytes {
                if size > limit {
                    drop(file);
                    let _ = std::fs::remove_file(&tmp_path);
                    return Err(CacheError::ArtifactTooLarge {
                        url: url.to_string(),
                        limit,
                    });
                }
            }
            hasher.update(&chunk);
            file.write_all(&chunk)?;
        }

        Ok((tmp_path, size, hex::encode(hasher.finalize())))
    }

    /// Update the access-time sidecar for an existing entry.
    pub fn touch(&self, sha256_hex: &str) -> Result<()> {
        let blob_path = self.layout.download_path(sha256_hex);
        let meta_path = self.meta_path(&blob_path);
        let size = std::fs::metadata(&blob_path)?.len();
        write_json_file(
            &meta_path,
            &BlobMeta {
                size,
                last_access_epoch: now_epoch_secs(),
            },
        )?;
        Ok(())
    }

    /// Whether the on-disk contents for `sha256_hex` actually hash to that
    /// value, re-verifying the cache-soundness invariant on demand.
    pub fn verify(&self, sha256_hex: &str) -> Result<bool> {
        let blob_path = self.layout.download_path(sha256_hex);
        if !blob_path.exists() {
            return Ok(false);
        }
        let bytes = std::fs::read(&blob_path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()) == sha256_hex)
    }

    fn entries(&self) -> Result<Vec<(PathBuf, BlobMeta)>> {
        let downloads_dir = self.layout.downloads_dir();
        let mut entries = Vec::new();
        if !downloads_dir.exists() {
            return Ok(entries);
        }
        for shard in std::fs::read_dir(&downloads_dir)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for file in std::fs::read_dir(shard.path())? {
                let file = file?;
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) == Some("meta") {
                    continue;
                }
                let meta_path = self.meta_path(&path);
                let meta: BlobMeta = read_json_file(&meta_path).unwrap_or(BlobMeta {
                    size: file.metadata().map(|m| m.len()).unwrap_or(0),
                    last_access_epoch: 0,
                });
                entries.push((path, meta));
            }
        }
        Ok(entries)
    }

    pub fn stats(&self) -> Result<DownloadCacheStats> {
        let entries = self.entries()?;
        let total_bytes = entries.iter().map(|(_, m)| m.size).sum();
        let oldest = entries.iter().map(|(_, m)| m.last_access_epoch).min();
        let newest = entries.iter().map(|(_, m)| m.last_access_epoch).max();
        Ok(DownloadCacheStats {
            entry_count: entries.len(),
            total_bytes,
            oldest_access_epoch: oldest,
            newest_access_epoch: newest,
        })
    }

    /// Evict entries (oldest access first) until total usage leaves room
    /// for `incoming_size` more bytes under the hard limit. Fails with
    /// `CacheFull` if even evicting everything wouldn't make room.
    fn make_room_for(&self, incoming_size: u64) -> Result<()> {
        let mut entries = self.entries()?;
        let mut total: u64 = entries.iter().map(|(_, m)| m.size).sum();

        if total + incoming_size <= self.limits.hard_limit_bytes {
            return Ok(());
        }
        if incoming_size > self.limits.hard_limit_bytes {
            return Err(CacheError::CacheFull);
        }

        entries.sort_by_key(|(_, m)| m.last_access_epoch);
        for (path, meta) in entries {
            if total + incoming_size <= self.limits.hard_limit_bytes {
                break;
            }
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to evict cache entry");
                continue;
            }
            let _ = std::fs::remove_file(self.meta_path(&path));
            total = total.saturating_sub(meta.size);
        }

        if total + incoming_size > self.limits.hard_limit_bytes {
            return Err(CacheError::CacheFull);
        }
        Ok(())
    }

    pub fn cleanup(&self, mode: CleanupMode) -> Result<CleanupReport> {
        let mut entries = self.entries()?;
        entries.sort_by_key(|(_, m)| m.last_access_epoch);

        let mut report = CleanupReport::default();
        match mode {
            CleanupMode::MaxAge(threshold) => {
                let now = now_epoch_secs();
                let threshold_secs = threshold.as_secs();
                for (path, meta) in entries {
                    if now.saturating_sub(meta.last_access_epoch) > threshold_secs {
                        std::fs::remove_file(&path)?;
                        let _ = std::fs::remove_file(self.meta_path(&path));
                        report.evicted_count += 1;
                        report.evicted_bytes += meta.size;
                    }
                }
            }
            CleanupMode::ForceLimit => {
                let mut total: u64 = entries.iter().map(|(_, m)| m.size).sum();
                for (path, meta) in entries {
                    if total <= self.limits.soft_limit_bytes {
                        break;
                    }
                    std::fs::remove_file(&path)?;
                    let _ = std::fs::remove_file(self.meta_path(&path));
                    total = total.saturating_sub(meta.size);
                    report.evicted_count += 1;
                    report.evicted_bytes += meta.size;
                }
            }
        }
        Ok(report)
    }
}
