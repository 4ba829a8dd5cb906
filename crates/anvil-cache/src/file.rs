//! Atomic file I/O helpers, reused by the download cache, the recipe cache,
//! and `anvil-state`'s `state.json` writer. Grounded directly in
//! `vx-cache::file`.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Write bytes to `dest` via a temp file + rename so no reader ever
/// observes a partial write.
pub fn atomic_write_bytes(dest: &Path, data: &[u8]) -> Result<()> {
    let tmp = dest.with_extension("tmp");
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&tmp, data)?;

    if dest.exists() {
        let _ = std::fs::remove_file(dest);
    }
    std::fs::rename(&tmp, dest)?;
    Ok(())
}

pub fn atomic_write_string(dest: &Path, s: &str) -> Result<()> {
    atomic_write_bytes(dest, s.as_bytes())
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    atomic_write_string(path, &s)
}

/// Seconds since the Unix epoch, used for cache access/fetch timestamps.
pub fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_then_read_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b.json");
        write_json_file(&path, &serde_json::json!({"k": 1})).unwrap();
        let value: serde_json::Value = read_json_file(&path).unwrap();
        assert_eq!(value["k"], 1);
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        atomic_write_string(&path, "first").unwrap();
        atomic_write_string(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
