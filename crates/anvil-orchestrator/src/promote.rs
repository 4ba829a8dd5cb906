//! Atomic publication (spec.md §4.6): staging root -> `tools/<tool>-
//! <version>/` (or `libs/` for a library), then `current/<bin>` symlinks
//! for every declared binary. A same-filesystem directory rename is the
//! atomicity point; crossing devices falls back to copy-then-remove.

use std::collections::BTreeMap;
use std::path::Path;

use anvil_executor::ExecutionReport;
use anvil_recipe::Recipe;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::Result;

/// Promotes the staging root, then returns a `relative path -> sha256` map
/// of every regular file in the promoted tree, for `VersionState::file_hashes`
/// (spec.md §3's post-install integrity check map).
pub fn promote(
    ctx: &crate::context::OrchestratorContext,
    recipe: &Recipe,
    version: &str,
    staging_root: &Path,
    report: &ExecutionReport,
) -> Result<BTreeMap<String, String>> {
    let name = recipe.metadata.name.as_str();
    let target_dir = if recipe.is_library() {
        ctx.layout.lib_version_dir(name, version)
    } else {
        ctx.layout.tool_version_dir(name, version)
    };

    if target_dir.exists() {
        std::fs::remove_dir_all(&target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        std::fs::create_dir_all(parent)?;
    }
    rename_or_copy(staging_root, &target_dir)?;
    info!(tool = name, version, dir = %target_dir.display(), "promoted staging root");

    if !recipe.is_library() {
        for relative in &report.declared_binaries {
            let binary_path = target_dir.join(relative);
            let bin_name = Path::new(relative)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(relative.as_str());
            let link = ctx.layout.current_binary_link(bin_name);
            relink(&binary_path, &link)?;
        }
    }

    Ok(hash_tree(&target_dir)?)
}

/// Walks the promoted tree and hashes every regular file, skipping
/// symlinks (which already point at a hashed target elsewhere in the
/// tree, or outside it for runtime-dependency binaries).
fn hash_tree(root: &Path) -> std::io::Result<BTreeMap<String, String>> {
    let mut hashes = BTreeMap::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("entry is under root")
            .to_string_lossy()
            .replace('\\', "/");
        let bytes = std::fs::read(entry.path())?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hashes.insert(relative, hex::encode(hasher.finalize()));
    }
    Ok(hashes)
}

/// `std::fs::rename` on the common case; on `EXDEV` (staging and target
/// live on different filesystems) falls back to a recursive copy followed
/// by removing the source, preserving the same "appears atomically or not
/// at all from the target's perspective" contract as best effort allows.
fn rename_or_copy(from: &Path, to: &Path) -> Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc_exdev()) => {
            warn!(from = %from.display(), to = %to.display(), "cross-device promotion, falling back to copy");
            copy_dir_recursive(from, to)?;
            std::fs::remove_dir_all(from)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn libc_exdev() -> i32 {
    18
}
#[cfg(not(unix))]
fn libc_exdev() -> i32 {
    17
}

fn copy_dir_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in walkdir::WalkDir::new(from).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from).expect("entry is under from");
        let dest = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else if entry.file_type().is_symlink() {
            #[cfg(unix)]
            {
                let target = std::fs::read_link(entry.path())?;
                let _ = std::os::unix::fs::symlink(target, &dest);
            }
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Replace (or create) the `current/<bin>` symlink, removing whatever was
/// there before. Re-pointing this link is the commit of a version switch
/// (spec.md §4.6).
fn relink(target: &Path, link: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match std::fs::symlink_metadata(link) {
        Ok(_) => std::fs::remove_file(link)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link)?;
    #[cfg(windows)]
    std::os::windows::fs::symlink_file(target, link)?;

    Ok(())
}
