//! Read-only introspection: `anvil list` and `anvil which` (spec.md §6's
//! "external interfaces" are satisfied by the state document itself; this
//! module just shapes it for the CLI).

use crate::context::OrchestratorContext;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct InstalledSummary {
    pub name: String,
    pub active_version: String,
    pub is_explicit: bool,
    pub is_library: bool,
    pub required_by: Vec<String>,
}

/// Every tool and library currently tracked in state, tools first.
pub fn list(ctx: &OrchestratorContext) -> Result<Vec<InstalledSummary>> {
    let doc = ctx.state.load()?;
    let mut summaries: Vec<InstalledSummary> = doc
        .tools
        .iter()
        .map(|(name, tool)| InstalledSummary {
            name: name.clone(),
            active_version: tool.active_version.clone(),
            is_explicit: tool.is_explicit,
            is_library: false,
            required_by: tool.required_by.iter().cloned().collect(),
        })
        .collect();
    summaries.extend(doc.libraries.iter().map(|(name, lib)| InstalledSummary {
        name: name.clone(),
        active_version: lib.active_version.clone(),
        is_explicit: lib.is_explicit,
        is_library: true,
        required_by: lib.used_by.iter().map(|r| r.tool.clone()).collect(),
    }));
    Ok(summaries)
}

/// Resolve the on-disk target of `current/<binary_name>`, the same thing
/// the user's shell would resolve by following their PATH.
pub fn which(ctx: &OrchestratorContext, binary_name: &str) -> Result<Option<std::path::PathBuf>> {
    let link = ctx.layout.current_binary_link(binary_name);
    if link.symlink_metadata().is_err() {
        return Ok(None);
    }
    Ok(Some(std::fs::canonicalize(&link).unwrap_or(link)))
}
