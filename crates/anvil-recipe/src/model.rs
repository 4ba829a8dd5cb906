//! The declarative recipe document: metadata, version source, ordered
//! steps, and a verify command. Grounded in `vx-manifest`'s
//! `ProviderManifest`/`RuntimeDef` TOML shape, trimmed to the fields this
//! system actually needs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RecipeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecipeKind {
    #[default]
    Tool,
    Library,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformTuple {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub kind: RecipeKind,
    /// Additional names this recipe may be invoked under.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub supported_platforms: Vec<PlatformTuple>,
    #[serde(default)]
    pub unsupported_platforms: Vec<PlatformTuple>,
    /// Installed before this tool.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Must remain on PATH when this tool runs.
    #[serde(default)]
    pub runtime_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSpec {
    /// Which `anvil-resolver` source implementation handles this recipe:
    /// `"registry"`, `"github_releases"`, or `"release_feed"`.
    pub source: String,
    #[serde(default)]
    pub source_config: BTreeMap<String, toml::Value>,
    /// Optional format template, e.g. `"v{version}"`.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WhenClause {
    #[serde(default)]
    pub os: Option<Vec<String>>,
    #[serde(default)]
    pub arch: Option<Vec<String>>,
    #[serde(default)]
    pub libc: Option<Vec<String>>,
    #[serde(default)]
    pub linux_family: Option<Vec<String>>,
}

impl WhenClause {
    /// Whether this clause admits the given platform. An absent list means
    /// "no constraint on that dimension".
    pub fn matches(&self, platform: &anvil_core::Platform) -> bool {
        if let Some(oss) = &self.os {
            if !oss.iter().any(|o| o.eq_ignore_ascii_case(&platform.os.to_string())) {
                return false;
            }
        }
        if let Some(arches) = &self.arch {
            if !arches
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&platform.arch.to_string()))
            {
                return false;
            }
        }
        if let Some(libcs) = &self.libc {
            match &platform.libc {
                Some(libc) => {
                    if !libcs.iter().any(|l| l.eq_ignore_ascii_case(&libc.to_string())) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        if let Some(families) = &self.linux_family {
            match &platform.linux_family {
                Some(family) => {
                    if !families.iter().any(|f| f.eq_ignore_ascii_case(family)) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub when: Option<WhenClause>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verify {
    pub command: String,
    pub expected_output_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub metadata: Metadata,
    pub version: VersionSpec,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub verify: Option<Verify>,
}

/// URL schemes a recipe step is allowed to reference. `http` is permitted
/// alongside `https` only so recipes can point at a local mirror or test
/// double (wiremock, a vendored artifact server); real upstream sources are
/// expected to be `https`.
const ALLOWED_URL_SCHEMES: &[&str] = &["https", "http"];

impl Recipe {
    pub fn parse(toml_source: &str) -> Result<Self> {
        let recipe: Recipe = toml::from_str(toml_source)?;
        recipe.validate_static()?;
        Ok(recipe)
    }

    /// Structural checks that don't need the action registry: URL scheme
    /// allowlist and path-traversal freedom on every step's params.
    fn validate_static(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            for (key, value) in &step.params {
                if let toml::Value::String(s) = value {
                    if key == "url" {
                        match url_scheme(s) {
                            Some(scheme) if ALLOWED_URL_SCHEMES.contains(&scheme) => {}
                            _ => {
                                return Err(RecipeError::DisallowedUrlScheme {
                                    step_index: index,
                                    url: s.clone(),
                                })
                            }
                        }
                    }
                    if (key.ends_with("path") || key.ends_with("dest")) && has_traversal(s) {
                        return Err(RecipeError::PathTraversal {
                            step_index: index,
                            param: key.clone(),
                            value: s.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn is_library(&self) -> bool {
        self.metadata.kind == RecipeKind::Library
    }

    /// Whether the recipe explicitly excludes the given platform via
    /// `supported_platforms`/`unsupported_platforms`.
    pub fn supports_platform(&self, platform: &anvil_core::Platform) -> bool {
        let os = platform.os.to_string();
        let arch = platform.arch.to_string();

        if !self.metadata.unsupported_platforms.is_empty()
            && self
                .metadata
                .unsupported_platforms
                .iter()
                .any(|p| tuple_matches(p, &os, &arch))
        {
            return false;
        }
        if self.metadata.supported_platforms.is_empty() {
            return true;
        }
        self.metadata
            .supported_platforms
            .iter()
            .any(|p| tuple_matches(p, &os, &arch))
    }

    /// sha256 of this recipe's canonical (stable field order) serialization.
    /// `BTreeMap` fields guarantee deterministic key order across runs.
    pub fn canonical_hash(&self) -> String {
        let json = serde_json::to_vec(self).expect("Recipe always serializes to JSON");
        let mut hasher = Sha256::new();
        hasher.update(&json);
        hex::encode(hasher.finalize())
    }
}

fn tuple_matches(tuple: &PlatformTuple, os: &str, arch: &str) -> bool {
    let os_ok = tuple.os.as_deref().map(|o| o.eq_ignore_ascii_case(os)).unwrap_or(true);
    let arch_ok = tuple
        .arch
        .as_deref()
        .map(|a| a.eq_ignore_ascii_case(arch))
        .unwrap_or(true);
    os_ok && arch_ok
}

fn url_scheme(url: &str) -> Option<&str> {
    url.split_once("://").map(|(scheme, _)| scheme)
}

fn has_traversal(path: &str) -> bool {
    std::path::Path::new(path)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> &'static str {
        r#"
[metadata]
name = "tool"
dependencies = []

[version]
source = "github_releases"

[[steps]]
action = "fetch"
params = { url = "https://example.test/tool.tgz" }

[[steps]]
action = "extract"
params = { dest_path = "bin/" }
"#
    }

    #[test]
    fn parses_a_minimal_recipe() {
        let recipe = Recipe::parse(sample()).unwrap();
        assert_eq!(recipe.metadata.name, "tool");
        assert_eq!(recipe.steps.len(), 2);
    }

    #[test]
    fn rejects_non_https_url() {
        let toml = sample().replace("https://", "ftp://");
        let err = Recipe::parse(&toml).unwrap_err();
        assert!(matches!(err, RecipeError::DisallowedUrlScheme { .. }));
    }

    #[test]
    fn rejects_path_traversal_segment() {
        let toml = sample().replace(r#"dest_path = "bin/""#, r#"dest_path = "../../etc""#);
        let err = Recipe::parse(&toml).unwrap_err();
        assert!(matches!(err, RecipeError::PathTraversal { .. }));
    }

    #[test]
    fn canonical_hash_is_stable_across_equal_recipes() {
        let a = Recipe::parse(sample()).unwrap();
        let b = Recipe::parse(sample()).unwrap();
        assert_eq!(a.canonical_hash(), b.canonical_hash());
    }

    #[test]
    fn supports_platform_respects_unsupported_list() {
        let mut recipe = Recipe::parse(sample()).unwrap();
        recipe.metadata.unsupported_platforms.push(PlatformTuple {
            os: Some("windows".into()),
            arch: None,
        });
        let windows = anvil_core::Platform {
            os: anvil_core::Os::Windows,
            arch: anvil_core::Arch::X86_64,
            linux_family: None,
            libc: None,
        };
        assert!(!recipe.supports_platform(&windows));
    }
}
