//! Action registry: table mapping each action name to its parameter
//! schema, implicit dependencies, evaluability classification, and a
//! Decompose handler.
//!
//! The handler is intentionally synchronous and side-effect-free: it only
//! classifies and reshapes already placeholder-expanded params. The actual
//! asynchronous work for download primitives (fetching bytes through the
//! download cache and hashing them) is performed by `anvil-plan`'s
//! decomposer, keyed off the `DecomposeOutcome` this handler returns.
//! Mirrors `vx-runtime::registry`'s builtin-table pattern rather than a
//! dynamic plugin system — recipe-defined scripting is out of scope.

use std::collections::{BTreeMap, HashMap};

use crate::error::{RecipeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluability {
    /// Emits `url` + `checksum` + `size`; lowering fetches and hashes bytes.
    Download,
    /// Deterministic filesystem operation (extract, copy, chmod, symlink).
    Staged,
    /// Arbitrary shell/process invocation; marks the plan non-deterministic.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Bool,
    Integer,
    StringList,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

/// Input to a Decompose handler: a step's params after placeholder
/// substitution, plus the target platform and resolved version.
pub struct DecomposeInput<'a> {
    pub params: &'a BTreeMap<String, toml::Value>,
    pub platform: &'a anvil_core::Platform,
    pub version: &'a str,
}

/// What a Decompose handler produced, before the plan generator turns it
/// into a fully-resolved `ResolvedStep`.
#[derive(Debug, Clone)]
pub enum DecomposeOutcome {
    Download {
        url: String,
        params: BTreeMap<String, toml::Value>,
    },
    Staged {
        params: BTreeMap<String, toml::Value>,
    },
    Opaque {
        params: BTreeMap<String, toml::Value>,
    },
}

pub type DecomposeHandler = fn(&DecomposeInput) -> Result<DecomposeOutcome>;

#[derive(Clone)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    pub implicit_dependencies: &'static [&'static str],
    /// Tools that must already be on disk to run this action's Decompose
    /// handler itself (distinct from `implicit_dependencies`, which are
    /// install-time deps of the *installed* tool). Empty for every builtin
    /// action today — none of them need to shell out during decomposition
    /// — but the decomposer honors it for recipe-defined actions that do
    /// (e.g. one that computes a lockfile by invoking a language runtime).
    pub eval_dependencies: &'static [&'static str],
    pub evaluability: Evaluability,
    pub decompose: DecomposeHandler,
}

impl ActionDescriptor {
    pub fn required_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.required)
    }
}

pub struct ActionRegistry {
    actions: HashMap<&'static str, ActionDescriptor>,
}

impl ActionRegistry {
    pub fn builtin() -> Self {
        let mut actions = HashMap::new();
        for descriptor in builtin_actions() {
            actions.insert(descriptor.name, descriptor);
        }
        Self { actions }
    }

    pub fn get(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Validate a step's action name and required params against this
    /// registry. Called from `anvil-plan`'s decomposer before lowering.
    pub fn validate_step(&self, step: &crate::model::Step, step_index: usize) -> Result<()> {
        let descriptor = self
            .actions
            .get(step.action.as_str())
            .ok_or_else(|| RecipeError::UnknownAction {
                action: step.action.clone(),
                step_index,
            })?;
        for param in descriptor.required_params() {
            if !step.params.contains_key(param.name) {
                return Err(RecipeError::MissingParam {
                    action: step.action.clone(),
                    param: param.name.to_string(),
                    step_index,
                });
            }
        }
        Ok(())
    }

    pub fn implicit_dependencies_for(&self, action: &str) -> &'static [&'static str] {
        self.actions
            .get(action)
            .map(|d| d.implicit_dependencies)
            .unwrap_or(&[])
    }

    pub fn eval_dependencies_for(&self, action: &str) -> &'static [&'static str] {
        self.actions.get(action).map(|d| d.eval_dependencies).unwrap_or(&[])
    }
}

fn param_str<'a>(params: &'a BTreeMap<String, toml::Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn fetch_decompose(input: &DecomposeInput) -> Result<DecomposeOutcome> {
    let url = param_str(input.params, "url").unwrap_or_default().to_string();
    Ok(DecomposeOutcome::Download {
        url,
        params: input.params.clone(),
    })
}

fn staged_decompose(input: &DecomposeInput) -> Result<DecomposeOutcome> {
    Ok(DecomposeOutcome::Staged {
        params: input.params.clone(),
    })
}

fn opaque_decompose(input: &DecomposeInput) -> Result<DecomposeOutcome> {
    Ok(DecomposeOutcome::Opaque {
        params: input.params.clone(),
    })
}

fn builtin_actions() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor {
            name: "fetch",
            params: &[ParamSpec {
                name: "url",
                kind: ParamKind::String,
                required: true,
            }],
            implicit_dependencies: &[],
            eval_dependencies: &[],
            evaluability: Evaluability::Download,
            decompose: fetch_decompose,
        },
        ActionDescriptor {
            name: "extract",
            params: &[ParamSpec {
                name: "dest_path",
                kind: ParamKind::String,
                required: true,
            }],
            implicit_dependencies: &[],
            eval_dependencies: &[],
            evaluability: Evaluability::Staged,
            decompose: staged_decompose,
        },
        ActionDescriptor {
            name: "install_binaries",
            params: &[ParamSpec {
                name: "binaries",
                kind: ParamKind::StringList,
                required: true,
            }],
            implicit_dependencies: &[],
            eval_dependencies: &[],
            evaluability: Evaluability::Staged,
            decompose: staged_decompose,
        },
        ActionDescriptor {
            name: "chmod",
            params: &[
                ParamSpec {
                    name: "path",
                    kind: ParamKind::String,
                    required: true,
                },
                ParamSpec {
                    name: "mode",
                    kind: ParamKind::String,
                    required: true,
                },
            ],
            implicit_dependencies: &[],
            eval_dependencies: &[],
            evaluability: Evaluability::Staged,
            decompose: staged_decompose,
        },
        ActionDescriptor {
            name: "symlink",
            params: &[
                ParamSpec {
                    name: "path",
                    kind: ParamKind::String,
                    required: true,
                },
                ParamSpec {
                    name: "target_path",
                    kind: ParamKind::String,
                    required: true,
                },
            ],
            implicit_dependencies: &[],
            eval_dependencies: &[],
            evaluability: Evaluability::Staged,
            decompose: staged_decompose,
        },
        ActionDescriptor {
            name: "npm_install",
            params: &[ParamSpec {
                name: "package",
                kind: ParamKind::String,
                required: true,
            }],
            implicit_dependencies: &["node"],
            eval_dependencies: &[],
            evaluability: Evaluability::Opaque,
            decompose: opaque_decompose,
        },
        ActionDescriptor {
            name: "pip_install",
            params: &[ParamSpec {
                name: "package",
                kind: ParamKind::String,
                required: true,
            }],
            implicit_dependencies: &["python"],
            eval_dependencies: &[],
            evaluability: Evaluability::Opaque,
            decompose: opaque_decompose,
        },
        ActionDescriptor {
            name: "system_package_install",
            params: &[ParamSpec {
                name: "package",
                kind: ParamKind::String,
                required: true,
            }],
            implicit_dependencies: &[],
            eval_dependencies: &[],
            evaluability: Evaluability::Opaque,
            decompose: opaque_decompose,
        },
        ActionDescriptor {
            name: "shell",
            params: &[ParamSpec {
                name: "command",
                kind: ParamKind::String,
                required: true,
            }],
            implicit_dependencies: &[],
            eval_dependencies: &[],
            evaluability: Evaluability::Opaque,
            decompose: opaque_decompose,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_fetch_as_a_download_primitive() {
        let registry = ActionRegistry::builtin();
        let fetch = registry.get("fetch").unwrap();
        assert_eq!(fetch.evaluability, Evaluability::Download);
    }

    #[test]
    fn npm_install_implies_node() {
        let registry = ActionRegistry::builtin();
        assert_eq!(registry.implicit_dependencies_for("npm_install"), &["node"]);
    }

    #[test]
    fn validate_step_rejects_unknown_action() {
        let registry = ActionRegistry::builtin();
        let step = crate::model::Step {
            action: "does_not_exist".to_string(),
            params: BTreeMap::new(),
            when: None,
            description: None,
        };
        let err = registry.validate_step(&step, 0).unwrap_err();
        assert!(matches!(err, RecipeError::UnknownAction { .. }));
    }

    #[test]
    fn validate_step_rejects_missing_required_param() {
        let registry = ActionRegistry::builtin();
        let step = crate::model::Step {
            action: "fetch".to_string(),
            params: BTreeMap::new(),
            when: None,
            description: None,
        };
        let err = registry.validate_step(&step, 0).unwrap_err();
        assert!(matches!(err, RecipeError::MissingParam { .. }));
    }
}
