//! Removal and orphan cleanup (spec.md §4.8): uninstall a tool, then
//! delete the on-disk footprint of everything the state manager's cascade
//! determined is now orphaned.

use tracing::info;

use crate::context::OrchestratorContext;
use crate::error::{OrchestratorError, Result};

/// Remove `name` and cascade-delete any dependency that becomes orphaned
/// as a result. Fails with `DependencyStillRequired` (via `StateError`) if
/// another tool still depends on `name`. Returns every name actually
/// removed, `name` included.
pub fn remove(ctx: &OrchestratorContext, name: &str) -> Result<Vec<String>> {
    let before = ctx.state.load()?;
    let removed = ctx.state.mutate(|doc| doc.uninstall_tool(name))?;

    for removed_name in &removed {
        if let Some(tool) = before.get_tool(removed_name) {
            for version in tool.versions.keys() {
                let dir = ctx.layout.tool_version_dir(removed_name, version);
                if dir.exists() {
                    std::fs::remove_dir_all(&dir)?;
                }
            }
            for binary in &tool.binaries {
                let link = ctx.layout.current_binary_link(binary);
                if link.symlink_metadata().is_ok() {
                    std::fs::remove_file(&link)?;
                }
            }
        } else if let Some(lib) = before.get_library(removed_name) {
            for version in lib.versions.keys() {
                let dir = ctx.layout.lib_version_dir(removed_name, version);
                if dir.exists() {
                    std::fs::remove_dir_all(&dir)?;
                }
            }
        }
        info!(tool = removed_name, "removed");
    }

    Ok(removed)
}

/// Sweep every currently-orphaned tool/library (spec.md §4.8, surfaced as
/// `anvil cleanup --orphans`). Idempotent: a name already removed by an
/// earlier cascade in this sweep is skipped rather than erroring.
pub fn cleanup_orphans(ctx: &OrchestratorContext) -> Result<Vec<String>> {
    let mut removed_all = Vec::new();
    loop {
        let doc = ctx.state.load()?;
        let orphans = doc.orphans();
        if orphans.is_empty() {
            break;
        }
        let mut progressed = false;
        for orphan in orphans {
            match remove(ctx, &orphan) {
                Ok(removed) => {
                    progressed = true;
                    removed_all.extend(removed);
                }
                Err(OrchestratorError::State(anvil_state::StateError::ToolNotFound(_))) => continue,
                Err(e) => return Err(e),
            }
        }
        if !progressed {
            break;
        }
    }
    Ok(removed_all)
}
