//! `InstallationPlan` / `ResolvedStep` (spec.md §3): the fully-expanded,
//! serializable output of the decomposer. Grounded in
//! `vx-installer::installer::InstallConfig`'s flat, serializable shape, but
//! generalized from a single-archive install to an ordered step list.

use std::collections::BTreeMap;

use anvil_core::Platform;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The only plan format this executor understands. Bump when the on-disk
/// shape changes in a way that isn't backward compatible.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPlatform {
    pub os: String,
    pub arch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libc: Option<String>,
}

impl From<&Platform> for PlanPlatform {
    fn from(platform: &Platform) -> Self {
        Self {
            os: platform.os.to_string(),
            arch: platform.arch.to_string(),
            linux_family: platform.linux_family.clone(),
            libc: platform.libc.map(|l| l.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedStep {
    pub action: String,
    pub params: BTreeMap<String, toml::Value>,
    pub evaluable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `sha256:<hex>`, present iff `url` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResolvedStep {
    pub fn is_download(&self) -> bool {
        self.url.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSource {
    Registry,
    Local,
    File(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationPlan {
    pub format_version: u32,
    pub tool: String,
    pub version: String,
    pub platform: PlanPlatform,
    /// RFC3339 UTC timestamp, stamped by the caller (decomposer never calls
    /// the clock itself, to keep plan generation reproducible in tests).
    pub generated_at: String,
    pub recipe_hash: String,
    pub recipe_source: RecipeSource,
    pub deterministic: bool,
    pub steps: Vec<ResolvedStep>,
}

impl InstallationPlan {
    /// `(tool, resolved_version, os, arch, recipe_hash)` — spec.md §3's
    /// cache key. Two plans with equal fingerprints are semantically
    /// equivalent and a cached plan may be reused in place of the other.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.tool.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.version.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.platform.os.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.platform.arch.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.recipe_hash.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn matches_fingerprint(&self, tool: &str, version: &str, platform: &Platform, recipe_hash: &str) -> bool {
        self.tool == tool
            && self.version == version
            && self.platform.os == platform.os.to_string()
            && self.platform.arch == platform.arch.to_string()
            && self.recipe_hash == recipe_hash
    }
}
