//! GitHub Releases source ("upstream metadata API" in spec.md §4.2).
//! Grounded in `vx-version-fetcher::fetchers::github::GitHubReleasesFetcher`,
//! trimmed to what this system needs: no jsDelivr fallback (the release
//! feed source below covers the "generic feed" case instead).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{ResolverError, Result};
use crate::source::{VersionList, VersionSource};

pub struct GithubReleasesSource {
    client: reqwest::Client,
}

impl GithubReleasesSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn api_url(api_base: &str, owner: &str, repo: &str) -> String {
        format!("{api_base}/repos/{owner}/{repo}/releases?per_page=100")
    }
}

const DEFAULT_API_BASE: &str = "https://api.github.com";

#[async_trait]
impl VersionSource for GithubReleasesSource {
    async fn fetch_versions(
        &self,
        recipe_name: &str,
        source_config: &BTreeMap<String, toml::Value>,
    ) -> Result<VersionList> {
        let owner = source_config
            .get("owner")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ResolverError::InvalidSourceConfig {
                recipe: recipe_name.to_string(),
                message: "github_releases source requires `owner` in [version].source_config".to_string(),
            })?;
        let repo = source_config
            .get("repo")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ResolverError::InvalidSourceConfig {
                recipe: recipe_name.to_string(),
                message: "github_releases source requires `repo` in [version].source_config".to_string(),
            })?;
        let strip_v_prefix = source_config
            .get("strip_v_prefix")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        let api_base = source_config
            .get("api_base")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_API_BASE);

        let url = Self::api_url(api_base, owner, repo);
        let body: serde_json::Value = self
            .client
            .get(&url)
            .header("User-Agent", "anvil")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let releases = body.as_array().ok_or_else(|| ResolverError::InvalidSourceConfig {
            recipe: recipe_name.to_string(),
            message: "GitHub releases response was not a JSON array".to_string(),
        })?;

        let versions: Vec<String> = releases
            .iter()
            .filter(|release| !release.get("draft").and_then(|d| d.as_bool()).unwrap_or(false))
            .filter_map(|release| {
                let tag = release.get("tag_name")?.as_str()?;
                let version = if strip_v_prefix {
                    tag.trim_start_matches('v')
                } else {
                    tag
                };
                Some(version.to_string())
            })
            .collect();

        if versions.is_empty() {
            return Err(ResolverError::NoVersionsAvailable {
                recipe: recipe_name.to_string(),
                source: "github_releases".to_string(),
            });
        }

        Ok(VersionList {
            versions,
            source_description: format!("github_releases:{owner}/{repo}"),
        })
    }

    fn name(&self) -> &str {
        "github_releases"
    }
}
