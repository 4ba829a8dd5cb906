//! On-disk layout for the anvil home directory.
//!
//! Mirrors the stable, user-visible tree from the external interface
//! contract:
//!
//! ```text
//! <home>/
//!   state.json
//!   state.json.lock
//!   tools/<name>-<version>/...
//!   libs/<name>-<version>/...
//!   current/<binary-name> -> ../tools/<name>-<active>/<binpath>
//!   bin/
//!   recipes/
//!   registry/<name>.toml
//!   cache/
//!     downloads/<aa>/<rest-of-hex>
//!     versions/<recipe>/<constraint>.json
//!     plans/<tool>/<version>.json
//!     work/<ephemeral>
//! ```

use std::path::{Path, PathBuf};

use anvil_core::Platform;

/// Environment variable that overrides the default home directory.
pub const HOME_OVERRIDE_ENV: &str = "ANVIL_HOME";

/// Owns the root of the anvil home directory and knows every path within it.
///
/// Analogous to `vx-paths::PathManager`, scaled down to the single-root
/// layout this system uses (no per-platform store roots; platform is a
/// component of the tool/lib directory name instead).
#[derive(Debug, Clone)]
pub struct HomeLayout {
    root: PathBuf,
}

impl HomeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the home directory: `$ANVIL_HOME` if set, otherwise
    /// `~/.anvil`.
    pub fn resolve() -> anyhow::Result<Self> {
        if let Ok(override_path) = std::env::var(HOME_OVERRIDE_ENV) {
            return Ok(Self::new(override_path));
        }
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;
        Ok(Self::new(home.join(".anvil")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create every top-level directory this layout needs. Idempotent.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.tools_dir(),
            self.libs_dir(),
            self.current_dir(),
            self.bin_dir(),
            self.recipes_dir(),
            self.registry_dir(),
            self.downloads_dir(),
            self.versions_cache_dir(),
            self.plans_cache_dir(),
            self.work_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn state_lock_file(&self) -> PathBuf {
        self.root.join("state.json.lock")
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root.join("tools")
    }

    pub fn tool_version_dir(&self, name: &str, version: &str) -> PathBuf {
        self.tools_dir().join(format!("{name}-{version}"))
    }

    pub fn libs_dir(&self) -> PathBuf {
        self.root.join("libs")
    }

    pub fn lib_version_dir(&self, name: &str, version: &str) -> PathBuf {
        self.libs_dir().join(format!("{name}-{version}"))
    }

    pub fn current_dir(&self) -> PathBuf {
        self.root.join("current")
    }

    pub fn current_binary_link(&self, binary_name: &str) -> PathBuf {
        self.current_dir().join(binary_name)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn recipes_dir(&self) -> PathBuf {
        self.root.join("recipes")
    }

    /// User-authored local recipe, highest lookup precedence.
    pub fn local_recipe_file(&self, name: &str) -> PathBuf {
        self.recipes_dir().join(format!("{name}.toml"))
    }

    pub fn registry_dir(&self) -> PathBuf {
        self.root.join("registry")
    }

    /// Cached remote recipe.
    pub fn registry_recipe_file(&self, name: &str) -> PathBuf {
        self.registry_dir().join(format!("{name}.toml"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.cache_dir().join("downloads")
    }

    /// Sharded content-addressed path: `downloads/<first-2-hex>/<rest>`.
    pub fn download_path(&self, sha256_hex: &str) -> PathBuf {
        let (shard, rest) = sha256_hex.split_at(2.min(sha256_hex.len()));
        self.downloads_dir().join(shard).join(rest)
    }

    pub fn versions_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("versions")
    }

    pub fn version_cache_file(&self, recipe_name: &str, constraint_key: &str) -> PathBuf {
        self.versions_cache_dir()
            .join(recipe_name)
            .join(format!("{constraint_key}.json"))
    }

    pub fn plans_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("plans")
    }

    pub fn plan_cache_file(&self, tool: &str, version: &str) -> PathBuf {
        self.plans_cache_dir()
            .join(tool)
            .join(format!("{version}.json"))
    }

    pub fn work_dir(&self) -> PathBuf {
        self.cache_dir().join("work")
    }

    /// A fresh ephemeral staging directory under `cache/work/`, named with
    /// the caller-supplied token (typically a uuid) so concurrent installs
    /// never collide.
    pub fn new_work_dir(&self, token: &str) -> PathBuf {
        self.work_dir().join(token)
    }

    /// Every `<name>-<version>` directory currently present under `tools/`,
    /// for a given tool name, sorted by semver when the version parses as
    /// one (falls back to lexical order otherwise).
    pub fn list_installed_versions(&self, tool_name: &str) -> std::io::Result<Vec<String>> {
        let prefix = format!("{tool_name}-");
        let mut versions = Vec::new();
        let dir = self.tools_dir();
        if !dir.exists() {
            return Ok(versions);
        }
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Some(version) = name.strip_prefix(&prefix) {
                    versions.push(version.to_string());
                }
            }
        }
        versions.sort_by(|a, b| match (semver::Version::parse(a), semver::Version::parse(b)) {
            (Ok(va), Ok(vb)) => va.cmp(&vb),
            _ => a.cmp(b),
        });
        Ok(versions)
    }
}

/// `<os>-<arch>` directory-name component, used when a recipe's steps are
/// platform-specific enough to need it in a path (most don't: the version
/// directory name is platform-agnostic, matching spec.md's tree).
pub fn platform_component(platform: &Platform) -> String {
    platform.dir_name()
}
