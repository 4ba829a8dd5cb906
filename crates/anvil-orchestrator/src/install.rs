//! Install orchestration (spec.md §4.6): the
//! `NEW → PREFLIGHT → DEPS → PACKAGE_MGRS → RUNTIME_DEPS → PLAN → EXECUTE →
//! PROMOTE → STATE → (DONE | FAILED)` state machine for one `(tool, call)`.
//!
//! Grounded in `vx-dependency::graph::DependencyGraph`'s topological walk,
//! generalized with the already-installed-before-visited fix spec.md §4.6/
//! §9 requires for diamond dependencies, and in
//! `vx-core::global_tool_manager`'s induced-dependency bookkeeping shape.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use anvil_plan::Decomposer;
use anvil_recipe::Recipe;
use anvil_state::VersionState;
use tracing::{debug, info};

use crate::context::OrchestratorContext;
use crate::error::{OrchestratorError, Result};
use crate::promote::promote;

/// `(tool-name, version)` of the call that induced an install, threaded
/// through so the state manager can maintain the `required_by`/`used_by`
/// back-edge.
pub type Parent<'a> = Option<(&'a str, &'a str)>;

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub tool: String,
    pub version: String,
    pub was_already_installed: bool,
}

/// One call into the orchestrator: `install(name, constraint)` with
/// `is_explicit=true` and no parent. Every dependency discovered along the
/// way recurses through [`install_recursive`] with `is_explicit=false`.
pub async fn install(ctx: &OrchestratorContext, name: &str, constraint: &str) -> Result<InstallOutcome> {
    let mut in_progress = HashSet::new();
    install_recursive(ctx, name, constraint, true, false, None, &mut in_progress).await
}

/// Recursive worker. `in_progress` tracks tools *currently being resolved*
/// on this call stack — populated only after the already-installed check,
/// per spec.md §9, so diamond dependencies (A -> [B, C], both -> D) never
/// false-positive as a cycle.
#[allow(clippy::too_many_arguments)]
pub async fn install_recursive<'a>(
    ctx: &OrchestratorContext,
    name: &str,
    constraint: &str,
    is_explicit: bool,
    is_execution_dependency: bool,
    parent: Parent<'a>,
    in_progress: &mut HashSet<String>,
) -> Result<InstallOutcome> {
    let recipe = ctx.recipe_loader().load(name)?;
    let resolved = ctx.resolver.resolve_or_dev_fallback(&recipe, constraint).await?;

    let already_installed = {
        let doc = ctx.state.load()?;
        if recipe.is_library() {
            doc.get_library(name)
                .map(|l| l.versions.contains_key(&resolved.version))
                .unwrap_or(false)
        } else {
            doc.get_tool(name)
                .map(|t| t.versions.contains_key(&resolved.version))
                .unwrap_or(false)
        }
    };

    if already_installed {
        debug!(tool = name, version = resolved.version, "already installed, reconciling call metadata");
        ctx.state.mutate(|doc| {
            doc.reconcile_existing(name, is_explicit, is_execution_dependency);
            if let Some((parent_name, parent_version)) = parent {
                doc.link_dependency(parent_name, parent_version, name);
            }
            Ok(())
        })?;
        return Ok(InstallOutcome {
            tool: name.to_string(),
            version: resolved.version,
            was_already_installed: true,
        });
    }

    if in_progress.contains(name) {
        return Err(OrchestratorError::CircularDependency { tool: name.to_string() });
    }
    in_progress.insert(name.to_string());

    let result = install_fresh(
        ctx,
        &recipe,
        &resolved.version,
        is_explicit,
        is_execution_dependency,
        parent,
        in_progress,
    )
    .await;

    in_progress.remove(name);
    result
}

#[allow(clippy::too_many_arguments)]
async fn install_fresh<'a>(
    ctx: &OrchestratorContext,
    recipe: &Recipe,
    version: &str,
    is_explicit: bool,
    is_execution_dependency: bool,
    parent: Parent<'a>,
    in_progress: &mut HashSet<String>,
) -> Result<InstallOutcome> {
    let name = recipe.metadata.name.as_str();
    let mut dependency_versions: BTreeMap<String, String> = BTreeMap::new();
    let mut install_dependencies: BTreeSet<String> = BTreeSet::new();

    // DEPS: explicit `metadata.dependencies`, depth-first.
    for dep in &recipe.metadata.dependencies {
        let outcome = Box::pin(install_recursive(
            ctx,
            dep,
            "",
            false,
            false,
            Some((name, version)),
            in_progress,
        ))
        .await
        .map_err(|e| OrchestratorError::DependencyFailed {
            tool: name.to_string(),
            dependency: dep.clone(),
            source: Box::new(e),
        })?;
        dependency_versions.insert(dep.clone(), outcome.version);
        install_dependencies.insert(dep.clone());
    }

    // PACKAGE_MGRS: toolchains implied by this recipe's own actions
    // (`npm_install` implies `node`, etc), installed hidden unless already
    // exposed by an explicit or runtime dependency.
    let surviving_steps: Vec<_> = recipe
        .steps
        .iter()
        .filter(|step| step.when.as_ref().map(|w| w.matches(&ctx.platform)).unwrap_or(true))
        .collect();
    let mut implied: BTreeSet<&'static str> = BTreeSet::new();
    for step in &surviving_steps {
        implied.extend(ctx.actions.implicit_dependencies_for(&step.action));
    }
    for dep in implied {
        if dependency_versions.contains_key(dep) {
            continue;
        }
        let outcome = Box::pin(install_recursive(
            ctx,
            dep,
            "",
            false,
            true,
            Some((name, version)),
            in_progress,
        ))
        .await
        .map_err(|e| OrchestratorError::DependencyFailed {
            tool: name.to_string(),
            dependency: dep.to_string(),
            source: Box::new(e),
        })?;
        dependency_versions.insert(dep.to_string(), outcome.version);
        install_dependencies.insert(dep.to_string());
    }

    // RUNTIME_DEPS: `metadata.runtime_dependencies`, always exposed so the
    // user's PATH picks them up, even if they were previously installed
    // hidden as someone else's package-manager dependency.
    let mut runtime_dependencies: BTreeSet<String> = BTreeSet::new();
    for dep in &recipe.metadata.runtime_dependencies {
        let outcome = Box::pin(install_recursive(
            ctx,
            dep,
            "",
            false,
            false,
            Some((name, version)),
            in_progress,
        ))
        .await
        .map_err(|e| OrchestratorError::DependencyFailed {
            tool: name.to_string(),
            dependency: dep.clone(),
            source: Box::new(e),
        })?;
        dependency_versions.insert(dep.clone(), outcome.version);
        install_dependencies.insert(dep.clone());
        runtime_dependencies.insert(dep.clone());
    }

    // PLAN: two-phase retrieval (spec.md §4.4) — a fingerprint-matching
    // cached plan is reused verbatim; otherwise decompose and cache it.
    let recipe_hash = recipe.canonical_hash();
    let plan = match ctx.plan_cache.get(name, version, false, &recipe_hash, &ctx.platform) {
        Some(plan) => {
            debug!(tool = name, version, "plan cache hit, skipping decompose");
            plan
        }
        None => {
            let generated_at = chrono::Utc::now().to_rfc3339();
            let actions = &ctx.actions;
            let gate = anvil_plan::DenyAllEvalDependencies;
            let decomposer =
                Decomposer::new(actions, &ctx.download_cache, &gate).with_max_artifact_size(ctx.max_artifact_size_bytes);
            let recipe_source = if ctx.layout.local_recipe_file(name).exists() {
                anvil_plan::RecipeSource::Local
            } else {
                anvil_plan::RecipeSource::Registry
            };
            let plan = decomposer
                .decompose(recipe, version, &ctx.platform, recipe_source, &generated_at, &dependency_versions)
                .await?;
            ctx.plan_cache.put(&plan)?;
            plan
        }
    };

    // EXECUTE: run every step into a fresh staging root.
    let staging_root = ctx.layout.new_work_dir(&uuid::Uuid::new_v4().to_string());
    let executor = anvil_executor::Executor::new(&ctx.download_cache, ctx.cancel.clone());
    let report = match executor.execute(&plan, &staging_root).await {
        Ok(report) => report,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&staging_root);
            return Err(e.into());
        }
    };

    // PROMOTE: atomic publication into `tools/`/`libs/` plus `current/`
    // symlinks for every declared binary.
    let file_hashes = promote(ctx, recipe, version, &staging_root, &report)?;

    // STATE: commit the version and the back-edge to the caller, if any.
    let version_state = VersionState {
        plan,
        binaries: report.declared_binaries.clone(),
        file_hashes,
        installed_at_epoch: anvil_cache::now_epoch_secs(),
    };
    ctx.state.mutate(|doc| {
        if recipe.is_library() {
            doc.record_library_install(name, version, version_state.clone(), is_explicit);
        } else {
            doc.record_tool_install(
                name,
                version,
                version_state.clone(),
                is_explicit,
                is_execution_dependency,
                install_dependencies.clone(),
                runtime_dependencies.clone(),
            );
        }
        if let Some((parent_name, parent_version)) = parent {
            doc.link_dependency(parent_name, parent_version, name);
        }
        Ok(())
    })?;

    info!(tool = name, version, "install complete");
    Ok(InstallOutcome {
        tool: name.to_string(),
        version: version.to_string(),
        was_already_installed: false,
    })
}
