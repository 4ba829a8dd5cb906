//! Plan generation (spec.md §4.3): recipe + resolved version + target
//! platform → `InstallationPlan`. Grounded in
//! `vx-installer::installer::Installer::build_plan`'s linear pipeline
//! (filter, substitute, fetch-and-hash, aggregate).

use std::collections::BTreeMap;

use anvil_cache::DownloadCache;
use anvil_core::Platform;
use anvil_recipe::action::{ActionRegistry, DecomposeInput, DecomposeOutcome};
use anvil_recipe::Recipe;
use tracing::{info, warn};

use crate::error::{PlanError, Result};
use crate::model::{InstallationPlan, PlanPlatform, RecipeSource, ResolvedStep, CURRENT_FORMAT_VERSION};
use crate::placeholder::SubstitutionContext;

/// Consulted only when an action declares `eval_dependencies`. None of the
/// builtin actions do today; this exists so a recipe-defined action that
/// needs a tool present to run its own Decompose step (e.g. invoking a
/// language runtime to compute a lockfile) has somewhere to ask.
pub trait EvalDependencyGate: Send + Sync {
    /// Return `true` if `tools` may be assumed already installed and usable.
    fn auto_accept(&self, action: &str, tools: &[&'static str]) -> bool;
}

/// Declines every eval-dependency request; the safe default when the caller
/// has no mechanism to pre-stage tools for decomposition.
pub struct DenyAllEvalDependencies;

impl EvalDependencyGate for DenyAllEvalDependencies {
    fn auto_accept(&self, _action: &str, _tools: &[&'static str]) -> bool {
        false
    }
}

pub struct Decomposer<'a> {
    actions: &'a ActionRegistry,
    download_cache: &'a DownloadCache,
    max_artifact_size_bytes: Option<u64>,
    eval_gate: &'a dyn EvalDependencyGate,
}

impl<'a> Decomposer<'a> {
    pub fn new(actions: &'a ActionRegistry, download_cache: &'a DownloadCache, eval_gate: &'a dyn EvalDependencyGate) -> Self {
        Self {
            actions,
            download_cache,
            max_artifact_size_bytes: None,
            eval_gate,
        }
    }

    pub fn with_max_artifact_size(mut self, bytes: u64) -> Self {
        self.max_artifact_size_bytes = Some(bytes);
        self
    }

    /// Build the full plan for `recipe` at `version`, targeting `platform`.
    /// `generated_at` is supplied by the caller (RFC3339 UTC) rather than
    /// read from the clock here, keeping decomposition itself pure apart
    /// from the download-cache side effects step 4 requires.
    /// `dependency_versions` carries the resolved versions of the recipe's
    /// own `metadata.dependencies`, for `{deps.<name>.version}` tokens.
    pub async fn decompose(
        &self,
        recipe: &Recipe,
        version: &str,
        platform: &Platform,
        recipe_source: RecipeSource,
        generated_at: &str,
        dependency_versions: &BTreeMap<String, String>,
    ) -> Result<InstallationPlan> {
        if !recipe.supports_platform(platform) {
            return Err(PlanError::UnsupportedPlatform {
                tool: recipe.metadata.name.clone(),
                os: platform.os.to_string(),
                arch: platform.arch.to_string(),
            });
        }

        let surviving_steps: Vec<_> = recipe
            .steps
            .iter()
            .filter(|step| step.when.as_ref().map(|w| w.matches(platform)).unwrap_or(true))
            .collect();

        if surviving_steps.is_empty() {
            return Err(PlanError::NoStepsForPlatform {
                tool: recipe.metadata.name.clone(),
                os: platform.os.to_string(),
                arch: platform.arch.to_string(),
            });
        }

        let substitution = SubstitutionContext {
            version,
            platform,
            dependency_versions,
        };

        let mut resolved_steps = Vec::with_capacity(surviving_steps.len());
        for (index, step) in surviving_steps.iter().enumerate() {
            self.actions.validate_step(step, index)?;
            let descriptor = self.actions.get(&step.action).expect("validated above");

            let eval_deps = descriptor.eval_dependencies;
            if !eval_deps.is_empty() && !self.eval_gate.auto_accept(descriptor.name, eval_deps) {
                return Err(PlanError::EvalDependenciesRequired {
                    action: descriptor.name.to_string(),
                    tools: eval_deps.iter().map(|s| s.to_string()).collect(),
                });
            }

            let expanded_params = substitution.expand_params(&step.params);
            let input = DecomposeInput {
                params: &expanded_params,
                platform,
                version,
            };
            let outcome = (descriptor.decompose)(&input).map_err(PlanError::Recipe)?;

            let resolved = match outcome {
                DecomposeOutcome::Download { url, params } => {
                    let artifact = self
                        .download_cache
                        .ingest(&url, self.max_artifact_size_bytes)
                        .await
                        .map_err(|e| match e {
                            anvil_cache::CacheError::ArtifactTooLarge { url, limit } => {
                                PlanError::ArtifactTooLarge { url, limit }
                            }
                            other => PlanError::Cache(other),
                        })?;
                    info!(action = descriptor.name, url, sha256 = artifact.sha256, "resolved download step");
                    ResolvedStep {
                        action: descriptor.name.to_string(),
                        params,
                        evaluable: true,
                        url: Some(url),
                        checksum: Some(format!("sha256:{}", artifact.sha256)),
                        size: Some(artifact.size),
                        description: step.description.clone(),
                    }
                }
                DecomposeOutcome::Staged { params } => ResolvedStep {
                    action: descriptor.name.to_string(),
                    params,
                    evaluable: true,
                    url: None,
                    checksum: None,
                    size: None,
                    description: step.description.clone(),
                },
                DecomposeOutcome::Opaque { params } => {
                    warn!(action = descriptor.name, "opaque step makes this plan non-deterministic");
                    ResolvedStep {
                        action: descriptor.name.to_string(),
                        params,
                        evaluable: false,
                        url: None,
                        checksum: None,
                        size: None,
                        description: step.description.clone(),
                    }
                }
            };
            resolved_steps.push(resolved);
        }

        let deterministic = resolved_steps.iter().all(|s| s.evaluable);

        Ok(InstallationPlan {
            format_version: CURRENT_FORMAT_VERSION,
            tool: recipe.metadata.name.clone(),
            version: version.to_string(),
            platform: PlanPlatform::from(platform),
            generated_at: generated_at.to_string(),
            recipe_hash: recipe.canonical_hash(),
            recipe_source,
            deterministic,
            steps: resolved_steps,
        })
    }
}
