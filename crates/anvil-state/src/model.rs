//! The persistent tool/library registry (spec.md §3): `ToolState`,
//! `VersionState`, `LibraryState`, and the `StateDocument` that `state.json`
//! serializes to. Grounded in `vx-core::global_tool_manager`'s
//! load/mutate-in-memory/save-JSON shape, generalized from vx's single
//! `referenced_by: HashSet<String>` into the explicit/induced +
//! `required_by` model spec.md §3/§9 requires.

use std::collections::{BTreeMap, BTreeSet};

use anvil_plan::InstallationPlan;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};

/// Current on-disk schema. Bump whenever `StateDocument`'s shape changes in
/// a way readers of an older version couldn't parse as-is; `migration.rs`
/// carries every step from an older version up to this one.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// A tool's installed footprint at one specific version: the plan that
/// produced it, the binaries it declared, and a post-install integrity map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionState {
    pub plan: InstallationPlan,
    pub binaries: Vec<String>,
    /// relative path -> sha256, checked by `anvil verify`-style tooling.
    #[serde(default)]
    pub file_hashes: BTreeMap<String, String>,
    pub installed_at_epoch: u64,
}

/// `(tool-name, version)` — a dependent of a library, or the induced-by
/// edge of a tool. `Ord`/`Serialize` so it can live in a `BTreeSet` and
/// round-trip through JSON as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsedByRef {
    pub tool: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolState {
    pub active_version: String,
    pub versions: BTreeMap<String, VersionState>,
    pub is_explicit: bool,
    #[serde(default)]
    pub required_by: BTreeSet<String>,
    #[serde(default)]
    pub install_dependencies: BTreeSet<String>,
    #[serde(default)]
    pub runtime_dependencies: BTreeSet<String>,
    #[serde(default)]
    pub is_execution_dependency: bool,
    #[serde(default)]
    pub binaries: Vec<String>,
    /// Epoch seconds of the most recent successful resolve-and-reuse;
    /// reporting-only, per SPEC_FULL.md §3 — no invariant depends on it.
    #[serde(default)]
    pub last_used_at: u64,
}

impl ToolState {
    pub fn is_orphan(&self) -> bool {
        !self.is_explicit && self.required_by.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryState {
    pub active_version: String,
    pub versions: BTreeMap<String, VersionState>,
    pub is_explicit: bool,
    #[serde(default)]
    pub used_by: BTreeSet<UsedByRef>,
    #[serde(default)]
    pub last_used_at: u64,
}

impl LibraryState {
    pub fn is_orphan(&self) -> bool {
        !self.is_explicit && self.used_by.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument {
    pub schema_version: u32,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolState>,
    #[serde(default)]
    pub libraries: BTreeMap<String, LibraryState>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            tools: BTreeMap::new(),
            libraries: BTreeMap::new(),
        }
    }
}

/// Newest-first comparison used when repointing `active_version` after a
/// pruned version was active. Falls back to lexical order for non-semver
/// strings (mirrors `anvil_paths::HomeLayout::list_installed_versions`).
fn newest(versions: impl Iterator<Item = String>) -> Option<String> {
    let mut all: Vec<String> = versions.collect();
    all.sort_by(|a, b| match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    });
    all.pop()
}

impl StateDocument {
    pub fn get_tool(&self, name: &str) -> Option<&ToolState> {
        self.tools.get(name)
    }

    pub fn get_library(&self, name: &str) -> Option<&LibraryState> {
        self.libraries.get(name)
    }

    /// Record a successful install of `name@version`. Creates the
    /// `ToolState` on first install; on a subsequent install of the same
    /// name, merges in the new version and always activates it —
    /// promotion (spec.md §4.6) is the commit point of a version switch.
    /// `is_explicit` only ever flips false -> true here (spec.md §9:
    /// "induced vs. explicit is a property of a call... must flip to
    /// is_explicit=true without reinstalling" applies identically to a
    /// fresh install call that happens to be explicit).
    #[allow(clippy::too_many_arguments)]
    pub fn record_tool_install(
        &mut self,
        name: &str,
        version: &str,
        version_state: VersionState,
        is_explicit: bool,
        is_execution_dependency: bool,
        install_dependencies: BTreeSet<String>,
        runtime_dependencies: BTreeSet<String>,
    ) {
        let binaries = version_state.binaries.clone();
        let entry = self.tools.entry(name.to_string()).or_insert_with(|| ToolState {
            active_version: version.to_string(),
            versions: BTreeMap::new(),
            is_explicit: false,
            required_by: BTreeSet::new(),
            install_dependencies: BTreeSet::new(),
            runtime_dependencies: BTreeSet::new(),
            is_execution_dependency: true,
            binaries: Vec::new(),
            last_used_at: 0,
        });
        entry.versions.insert(version.to_string(), version_state);
        entry.active_version = version.to_string();
        entry.binaries = binaries;
        entry.install_dependencies = install_dependencies;
        entry.runtime_dependencies = runtime_dependencies;
        if is_explicit {
            entry.is_explicit = true;
        }
        // spec.md §9's runtime-dep visibility-flip policy (DESIGN.md open
        // question #2): installing as a runtime dependency always exposes
        // the tool, clearing any previously-hidden execution-dependency
        // flag, without reinstalling.
        if !is_execution_dependency {
            entry.is_execution_dependency = false;
        } else if entry.required_by.is_empty() && !entry.is_explicit {
            entry.is_execution_dependency = true;
        }
    }

    /// A tool or library already at the requested version: no reinstall
    /// work, but the call's explicitness, back-edge, and visibility still
    /// apply (spec.md §4.6: "skip work, but still reconcile `is_explicit`
    /// and `required_by` from the current call"). The same runtime-dep
    /// visibility-flip policy `record_tool_install` applies (DESIGN.md open
    /// question #2) applies here too: reconciling as a runtime dependency
    /// always exposes the tool, without reinstalling.
    pub fn reconcile_existing(&mut self, name: &str, is_explicit: bool, is_execution_dependency: bool) {
        if let Some(tool) = self.tools.get_mut(name) {
            if is_explicit {
                tool.is_explicit = true;
            }
            if !is_execution_dependency {
                tool.is_execution_dependency = false;
            }
            return;
        }
        if let Some(lib) = self.libraries.get_mut(name) {
            if is_explicit {
                lib.is_explicit = true;
            }
        }
    }

    pub fn record_library_install(
        &mut self,
        name: &str,
        version: &str,
        version_state: VersionState,
        is_explicit: bool,
    ) {
        let entry = self.libraries.entry(name.to_string()).or_insert_with(|| LibraryState {
            active_version: version.to_string(),
            versions: BTreeMap::new(),
            is_explicit: false,
            used_by: BTreeSet::new(),
            last_used_at: 0,
        });
        entry.versions.insert(version.to_string(), version_state);
        entry.active_version = version.to_string();
        if is_explicit {
            entry.is_explicit = true;
        }
    }

    /// `add_required_by(child, parent)` (spec.md §4.7), generalized to
    /// route to a tool's `required_by` set or a library's `(tool, version)`
    /// `used_by` set depending on what `child` names. First-class so no
    /// caller has to reach into either structure directly.
    pub fn link_dependency(&mut self, parent_name: &str, parent_version: &str, child_name: &str) {
        if let Some(tool) = self.tools.get_mut(child_name) {
            tool.required_by.insert(parent_name.to_string());
            return;
        }
        if let Some(lib) = self.libraries.get_mut(child_name) {
            lib.used_by.insert(UsedByRef {
                tool: parent_name.to_string(),
                version: parent_version.to_string(),
            });
        }
    }

    /// `remove_required_by(child, parent)` — the mandatory pairing of
    /// [`link_dependency`](Self::link_dependency), per spec.md §4.7.
    pub fn unlink_dependency(&mut self, parent_name: &str, parent_version: &str, child_name: &str) {
        if let Some(tool) = self.tools.get_mut(child_name) {
            tool.required_by.remove(parent_name);
            return;
        }
        if let Some(lib) = self.libraries.get_mut(child_name) {
            lib.used_by.remove(&UsedByRef {
                tool: parent_name.to_string(),
                version: parent_version.to_string(),
            });
        }
    }

    /// Prune a single version of a tool (not a full removal). If the
    /// pruned version was active, repoints `active_version` at the newest
    /// remaining one. If no versions remain and the tool has become an
    /// orphan (spec.md §3's "induced install with no required_by" test),
    /// the tool entry is removed outright — there is nothing left to keep
    /// a now-versionless entry around for.
    pub fn prune_tool_version(&mut self, name: &str, version: &str) -> Result<()> {
        let tool = self.tools.get_mut(name).ok_or_else(|| StateError::ToolNotFound(name.to_string()))?;
        if !tool.versions.contains_key(version) {
            return Err(StateError::VersionNotFound {
                tool: name.to_string(),
                version: version.to_string(),
            });
        }
        tool.versions.remove(version);

        if tool.versions.is_empty() {
            if tool.is_orphan() {
                self.tools.remove(name);
            }
            return Ok(());
        }

        if tool.active_version == version {
            if let Some(next) = newest(tool.versions.keys().cloned()) {
                tool.active_version = next;
            }
        }
        Ok(())
    }

    /// Explicit top-level removal (`anvil remove <tool>`, spec.md §8
    /// scenario 3). Fails with `DependencyStillRequired` if other tools
    /// still depend on it — removal is never silently partial. On
    /// success, cascades orphan cleanup (spec.md §4.8) through the
    /// removed tool's captured install-dependency set and returns every
    /// name actually removed, `name` included.
    pub fn uninstall_tool(&mut self, name: &str) -> Result<Vec<String>> {
        let tool = self.tools.get(name).ok_or_else(|| StateError::ToolNotFound(name.to_string()))?;
        if !tool.required_by.is_empty() {
            return Err(StateError::DependencyStillRequired {
                tool: name.to_string(),
                required_by: tool.required_by.iter().cloned().collect(),
            });
        }
        let install_deps = tool.install_dependencies.clone();
        let active_version = tool.active_version.clone();
        self.tools.remove(name);

        let mut removed = vec![name.to_string()];
        for dep in install_deps {
            self.unlink_dependency(name, &active_version, &dep);
            removed.extend(self.cascade_orphan(&dep));
        }
        Ok(removed)
    }

    /// spec.md §4.8's recursive orphan sweep: if `name` is now an orphan,
    /// remove it and recurse on *its* former install-dependency set. The
    /// traversal terminates because the dependency graph is acyclic by
    /// construction (cycles are rejected at install time, spec.md §4.6).
    fn cascade_orphan(&mut self, name: &str) -> Vec<String> {
        if let Some(tool) = self.tools.get(name) {
            if !tool.is_orphan() {
                return Vec::new();
            }
            let install_deps = tool.install_dependencies.clone();
            let active_version = tool.active_version.clone();
            self.tools.remove(name);
            let mut removed = vec![name.to_string()];
            for dep in install_deps {
                self.unlink_dependency(name, &active_version, &dep);
                removed.extend(self.cascade_orphan(&dep));
            }
            return removed;
        }
        if let Some(lib) = self.libraries.get(name) {
            if !lib.is_orphan() {
                return Vec::new();
            }
            self.libraries.remove(name);
            return vec![name.to_string()];
        }
        Vec::new()
    }

    /// Every tool/library currently eligible for automatic removal —
    /// surfaced by `anvil cleanup --orphans`-style introspection.
    pub fn orphans(&self) -> Vec<String> {
        let mut found: Vec<String> = self
            .tools
            .iter()
            .filter(|(_, t)| t.is_orphan())
            .map(|(n, _)| n.clone())
            .collect();
        found.extend(self.libraries.iter().filter(|(_, l)| l.is_orphan()).map(|(n, _)| n.clone()));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_plan::{InstallationPlan, PlanPlatform, RecipeSource, CURRENT_FORMAT_VERSION};

    fn version_state(plan_version: &str) -> VersionState {
        VersionState {
            plan: InstallationPlan {
                format_version: CURRENT_FORMAT_VERSION,
                tool: "tool".to_string(),
                version: plan_version.to_string(),
                platform: PlanPlatform {
                    os: "linux".to_string(),
                    arch: "x86_64".to_string(),
                    linux_family: None,
                    libc: None,
                },
                generated_at: "2026-01-01T00:00:00Z".to_string(),
                recipe_hash: "deadbeef".to_string(),
                recipe_source: RecipeSource::Registry,
                deterministic: true,
                steps: vec![],
            },
            binaries: vec!["bin/tool".to_string()],
            file_hashes: BTreeMap::new(),
            installed_at_epoch: 0,
        }
    }

    #[test]
    fn record_install_creates_explicit_entry() {
        let mut doc = StateDocument::default();
        doc.record_tool_install("tool", "1.0.0", version_state("1.0.0"), true, false, BTreeSet::new(), BTreeSet::new());
        let tool = doc.get_tool("tool").unwrap();
        assert!(tool.is_explicit);
        assert_eq!(tool.active_version, "1.0.0");
        assert!(!tool.is_orphan());
    }

    #[test]
    fn induced_install_with_no_required_by_is_an_orphan() {
        let mut doc = StateDocument::default();
        doc.record_tool_install("dep", "1.0.0", version_state("1.0.0"), false, true, BTreeSet::new(), BTreeSet::new());
        assert!(doc.get_tool("dep").unwrap().is_orphan());
    }

    #[test]
    fn diamond_dependency_graph_consistency() {
        let mut doc = StateDocument::default();
        doc.record_tool_install("a", "1.0.0", version_state("1.0.0"), true, false, BTreeSet::from(["b".into(), "c".into()]), BTreeSet::new());
        doc.record_tool_install("b", "1.0.0", version_state("1.0.0"), false, false, BTreeSet::from(["d".into()]), BTreeSet::new());
        doc.record_tool_install("c", "1.0.0", version_state("1.0.0"), false, false, BTreeSet::from(["d".into()]), BTreeSet::new());
        doc.record_tool_install("d", "1.0.0", version_state("1.0.0"), false, false, BTreeSet::new(), BTreeSet::new());
        doc.link_dependency("a", "1.0.0", "b");
        doc.link_dependency("a", "1.0.0", "c");
        doc.link_dependency("b", "1.0.0", "d");
        doc.link_dependency("c", "1.0.0", "d");

        assert_eq!(doc.get_tool("d").unwrap().required_by.len(), 2);
        assert!(!doc.get_tool("b").unwrap().is_orphan());
        assert!(!doc.get_tool("d").unwrap().is_orphan());
    }

    #[test]
    fn uninstalling_root_of_diamond_removes_every_orphan() {
        let mut doc = StateDocument::default();
        doc.record_tool_install("a", "1.0.0", version_state("1.0.0"), true, false, BTreeSet::from(["b".into(), "c".into()]), BTreeSet::new());
        doc.record_tool_install("b", "1.0.0", version_state("1.0.0"), false, false, BTreeSet::from(["d".into()]), BTreeSet::new());
        doc.record_tool_install("c", "1.0.0", version_state("1.0.0"), false, false, BTreeSet::from(["d".into()]), BTreeSet::new());
        doc.record_tool_install("d", "1.0.0", version_state("1.0.0"), false, false, BTreeSet::new(), BTreeSet::new());
        doc.link_dependency("a", "1.0.0", "b");
        doc.link_dependency("a", "1.0.0", "c");
        doc.link_dependency("b", "1.0.0", "d");
        doc.link_dependency("c", "1.0.0", "d");

        let removed = doc.uninstall_tool("a").unwrap();
        assert_eq!(removed.len(), 4);
        assert!(doc.get_tool("a").is_none());
        assert!(doc.get_tool("b").is_none());
        assert!(doc.get_tool("c").is_none());
        assert!(doc.get_tool("d").is_none());
        assert!(doc.orphans().is_empty());
    }

    #[test]
    fn uninstall_fails_while_required_by_non_empty() {
        let mut doc = StateDocument::default();
        doc.record_tool_install("b", "1.0.0", version_state("1.0.0"), false, false, BTreeSet::new(), BTreeSet::new());
        doc.link_dependency("a", "1.0.0", "b");
        let err = doc.uninstall_tool("b").unwrap_err();
        assert!(matches!(err, StateError::DependencyStillRequired { .. }));
    }

    #[test]
    fn prune_version_repoints_active_version() {
        let mut doc = StateDocument::default();
        doc.record_tool_install("tool", "1.0.0", version_state("1.0.0"), true, false, BTreeSet::new(), BTreeSet::new());
        doc.record_tool_install("tool", "1.2.0", version_state("1.2.0"), true, false, BTreeSet::new(), BTreeSet::new());
        doc.prune_tool_version("tool", "1.2.0").unwrap();
        assert_eq!(doc.get_tool("tool").unwrap().active_version, "1.0.0");
    }

    #[test]
    fn reconcile_existing_flips_explicit_without_reinstall() {
        let mut doc = StateDocument::default();
        doc.record_tool_install("dep", "1.0.0", version_state("1.0.0"), false, true, BTreeSet::new(), BTreeSet::new());
        assert!(doc.get_tool("dep").unwrap().is_orphan());
        doc.reconcile_existing("dep", true, true);
        assert!(doc.get_tool("dep").unwrap().is_explicit);
        assert!(!doc.get_tool("dep").unwrap().is_orphan());
    }

    #[test]
    fn reconcile_existing_exposes_hidden_execution_dependency() {
        let mut doc = StateDocument::default();
        doc.record_tool_install("x", "1.0.0", version_state("1.0.0"), false, true, BTreeSet::new(), BTreeSet::new());
        doc.link_dependency("a", "1.0.0", "x");
        assert!(doc.get_tool("x").unwrap().is_execution_dependency);

        // `b` declares `x` as a runtime dependency while it's already
        // installed at the same version: exposed, without reinstalling.
        doc.reconcile_existing("x", false, false);
        doc.link_dependency("b", "1.0.0", "x");
        assert!(!doc.get_tool("x").unwrap().is_execution_dependency);
    }
}
