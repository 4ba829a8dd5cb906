//! Layered configuration via `figment`.
//!
//! Layers, lowest to highest priority: built-in defaults, the user config
//! file (`$XDG_CONFIG_HOME/anvil/config.toml`), a project-local `.anvil.toml`,
//! then `ANVIL_`-prefixed environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{AnvilError, ErrorCategory, Result};

/// Top-level configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnvilConfig {
    pub defaults: DefaultSettings,
    #[serde(default)]
    pub tools: HashMap<String, ToolSettings>,
    #[serde(default)]
    pub registries: HashMap<String, RegistrySettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultSettings {
    /// Version-resolution cache TTL, in seconds.
    pub version_cache_ttl_secs: u64,
    /// Recipe cache TTL, in seconds.
    pub recipe_cache_ttl_secs: u64,
    /// Default registry used when a recipe names no other.
    pub default_registry: String,
    /// Soft limit (bytes) on the download cache before eviction is suggested.
    pub download_cache_soft_limit_bytes: u64,
    /// Hard limit (bytes); `cleanup --force-limit` enforces this.
    pub download_cache_hard_limit_bytes: u64,
    /// Per-artifact size ceiling (bytes) enforced during plan generation;
    /// exceeding it fails with `ArtifactTooLarge` before any bytes are kept.
    pub max_artifact_size_bytes: u64,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            version_cache_ttl_secs: 3600,
            recipe_cache_ttl_secs: 86_400,
            default_registry: "official".to_string(),
            download_cache_soft_limit_bytes: 5 * 1024 * 1024 * 1024,
            download_cache_hard_limit_bytes: 10 * 1024 * 1024 * 1024,
            max_artifact_size_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Pinned version constraint, overriding whatever the caller passes.
    pub version: Option<String>,
    pub registry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    pub base_url: String,
    pub priority: i32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// A single configuration layer, surfaced for `anvil config status`.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    pub name: &'static str,
    pub path: Option<PathBuf>,
    pub available: bool,
}

/// Builds and holds the merged configuration plus a record of which layers
/// actually contributed, so diagnostics commands can explain precedence.
pub struct ConfigManager {
    config: AnvilConfig,
    layers: Vec<LayerInfo>,
}

impl ConfigManager {
    /// Load configuration from the standard layer stack.
    pub fn load() -> Result<Self> {
        let mut layers = Vec::new();
        let mut figment = Figment::new().merge(Serialized::defaults(AnvilConfig::default()));
        layers.push(LayerInfo {
            name: "builtin",
            path: None,
            available: true,
        });

        let user_config = dirs::config_dir().map(|d| d.join("anvil").join("config.toml"));
        if let Some(path) = &user_config {
            let available = path.exists();
            if available {
                figment = figment.merge(Toml::file(path));
            }
            layers.push(LayerInfo {
                name: "user",
                path: Some(path.clone()),
                available,
            });
        }

        let project_config = PathBuf::from(".anvil.toml");
        let project_available = project_config.exists();
        if project_available {
            figment = figment.merge(Toml::file(&project_config));
        }
        layers.push(LayerInfo {
            name: "project",
            path: Some(project_config),
            available: project_available,
        });

        let env_available = std::env::vars().any(|(k, _)| k.starts_with("ANVIL_"));
        figment = figment.merge(Env::prefixed("ANVIL_").split("__"));
        layers.push(LayerInfo {
            name: "environment",
            path: None,
            available: env_available,
        });

        let config: AnvilConfig = figment.extract().map_err(|e| {
            AnvilError::with_source(
                ErrorCategory::InstallFailed,
                "failed to load configuration",
                anyhow::anyhow!(e.to_string()),
            )
        })?;

        Ok(Self { config, layers })
    }

    /// Built-in defaults only, no filesystem or environment layers. Used in
    /// tests and anywhere config loading must not touch the host's home dir.
    pub fn minimal() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(AnvilConfig::default()));
        let config: AnvilConfig = figment.extract().map_err(|e| {
            AnvilError::with_source(
                ErrorCategory::InstallFailed,
                "failed to build minimal configuration",
                anyhow::anyhow!(e.to_string()),
            )
        })?;
        Ok(Self {
            config,
            layers: vec![LayerInfo {
                name: "builtin",
                path: None,
                available: true,
            }],
        })
    }

    pub fn config(&self) -> &AnvilConfig {
        &self.config
    }

    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    pub fn tool_settings(&self, tool_name: &str) -> Option<&ToolSettings> {
        self.config.tools.get(tool_name)
    }
}
