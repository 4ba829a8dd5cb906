//! `execute(plan, staging_root)` (spec.md §4.5). Grounded in
//! `vx-installer::installer::Installer::install`'s linear download →
//! extract → configure pipeline, generalized to an arbitrary ordered step
//! list and a cooperative cancellation token instead of a single fixed
//! archive-then-binaries sequence.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anvil_cache::DownloadCache;
use anvil_core::CancellationToken;
use anvil_plan::{InstallationPlan, ResolvedStep, CURRENT_FORMAT_VERSION};
use tokio::process::Command;
use tracing::{info, warn};

use crate::archive::extract;
use crate::error::{ExecError, Result};
use crate::path_guard::guarded_join;

/// What a single successful `execute` run leaves behind: every binary path
/// declared by an `install_binaries` step, relative to the staging root.
#[derive(Debug, Default, Clone)]
pub struct ExecutionReport {
    pub declared_binaries: Vec<String>,
}

pub struct Executor<'a> {
    download_cache: &'a DownloadCache,
    cancel: CancellationToken,
}

impl<'a> Executor<'a> {
    pub fn new(download_cache: &'a DownloadCache, cancel: CancellationToken) -> Self {
        Self { download_cache, cancel }
    }

    /// Carry out every step of `plan` against `staging_root`, in order. On
    /// any fatal error the caller is expected to discard `staging_root`
    /// wholesale — this function never partially cleans up, matching
    /// spec.md §4.5's "no individual step rollback" contract.
    pub async fn execute(&self, plan: &InstallationPlan, staging_root: &Path) -> Result<ExecutionReport> {
        if plan.format_version > CURRENT_FORMAT_VERSION {
            return Err(ExecError::UnsupportedFormatVersion {
                found: plan.format_version,
                max_supported: CURRENT_FORMAT_VERSION,
            });
        }

        std::fs::create_dir_all(staging_root)?;
        let mut report = ExecutionReport::default();
        let mut last_artifact: Option<PathBuf> = None;

        for (index, step) in plan.steps.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ExecError::Cancelled);
            }

            if step.is_download() {
                last_artifact = Some(self.run_download_step(step).await?);
                continue;
            }

            match step.action.as_str() {
                "extract" => {
                    let archive_path = last_artifact.as_deref().ok_or_else(|| ExecError::NoArtifactStaged {
                        step_index: index,
                        action: step.action.clone(),
                    })?;
                    let dest = param_str(step, "dest_path").unwrap_or("");
                    let dest_dir = guarded_join(staging_root, dest, index, &step.action)?;
                    extract(archive_path, &dest_dir, index)?;
                }
                "install_binaries" => {
                    let binaries = param_str_list(step, "binaries");
                    for relative in &binaries {
                        guarded_join(staging_root, relative, index, &step.action)?;
                    }
                    report.declared_binaries.extend(binaries);
                }
                "chmod" => {
                    let path = param_str(step, "path").unwrap_or("");
                    let mode_str = param_str(step, "mode").unwrap_or("755");
                    let target = guarded_join(staging_root, path, index, &step.action)?;
                    self.apply_chmod(&target, mode_str)?;
                }
                "symlink" => {
                    let path = param_str(step, "path").unwrap_or("");
                    let target_path = param_str(step, "target_path").unwrap_or("");
                    let link = guarded_join(staging_root, path, index, &step.action)?;
                    let target = guarded_join(staging_root, target_path, index, &step.action)?;
                    self.create_symlink(&target, &link)?;
                }
                "npm_install" | "pip_install" | "system_package_install" | "shell" => {
                    self.run_opaque_step(step, staging_root, index).await?;
                }
                other => {
                    return Err(ExecError::UnknownAction {
                        action: other.to_string(),
                        step_index: index,
                    })
                }
            }

            if self.cancel.is_cancelled() {
                return Err(ExecError::Cancelled);
            }
        }

        Ok(report)
    }

    async fn run_download_step(&self, step: &ResolvedStep) -> Result<PathBuf> {
        let url = step.url.as_deref().expect("is_download() checked");
        let checksum = step.checksum.as_deref().expect("download steps always carry a checksum");
        let expected_hex = checksum.strip_prefix("sha256:").unwrap_or(checksum);

        let artifact = self.download_cache.ensure(url, expected_hex).await.map_err(|e| match e {
            anvil_cache::CacheError::ChecksumMismatch { url, expected, actual } => {
                ExecError::ChecksumMismatch { url, expected, actual }
            }
            other => ExecError::Cache(other),
        })?;
        info!(url, sha256 = artifact.sha256, "download step satisfied");
        Ok(artifact.path)
    }

    #[cfg(unix)]
    fn apply_chmod(&self, target: &Path, mode_str: &str) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let mode = u32::from_str_radix(mode_str, 8).unwrap_or(0o755);
        std::fs::set_permissions(target, std::fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_chmod(&self, _target: &Path, _mode_str: &str) -> Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn create_symlink(&self, target: &Path, link: &Path) -> Result<()> {
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::os::unix::fs::symlink(target, link)?;
        Ok(())
    }

    #[cfg(windows)]
    fn create_symlink(&self, target: &Path, link: &Path) -> Result<()> {
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::os::windows::fs::symlink_file(target, link)?;
        Ok(())
    }

    async fn run_opaque_step(&self, step: &ResolvedStep, staging_root: &Path, step_index: usize) -> Result<()> {
        let command_line = match step.action.as_str() {
            "npm_install" => format!("npm install -g {}", param_str(step, "package").unwrap_or_default()),
            "pip_install" => format!("pip install {}", param_str(step, "package").unwrap_or_default()),
            "system_package_install" => {
                warn!(step_index, "system_package_install steps are not sandboxed to the staging root");
                format!("echo system_package_install:{}", param_str(step, "package").unwrap_or_default())
            }
            "shell" => param_str(step, "command").unwrap_or_default().to_string(),
            other => {
                return Err(ExecError::UnknownAction {
                    action: other.to_string(),
                    step_index,
                })
            }
        };

        let status = Command::new(shell_program())
            .arg(shell_flag())
            .arg(&command_line)
            .current_dir(staging_root)
            .stdin(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(ExecError::CommandFailed {
                step_index,
                action: step.action.clone(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

#[cfg(windows)]
fn shell_program() -> &'static str {
    "cmd"
}
#[cfg(windows)]
fn shell_flag() -> &'static str {
    "/C"
}
#[cfg(not(windows))]
fn shell_program() -> &'static str {
    "sh"
}
#[cfg(not(windows))]
fn shell_flag() -> &'static str {
    "-c"
}

fn param_str<'a>(step: &'a ResolvedStep, key: &str) -> Option<&'a str> {
    step.params.get(key).and_then(|v| v.as_str())
}

fn param_str_list(step: &ResolvedStep, key: &str) -> Vec<String> {
    step.params
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_cache::CacheLimits;
    use anvil_paths::HomeLayout;
    use anvil_plan::{PlanPlatform, RecipeSource};
    use sha2::{Digest, Sha256};
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sha256_hex(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    fn download_cache() -> (tempfile::TempDir, DownloadCache) {
        let dir = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let cache = DownloadCache::new(
            layout,
            CacheLimits {
                soft_limit_bytes: 1_000_000,
                hard_limit_bytes: 2_000_000,
            },
            reqwest::Client::new(),
        );
        (dir, cache)
    }

    fn base_plan() -> InstallationPlan {
        InstallationPlan {
            format_version: CURRENT_FORMAT_VERSION,
            tool: "tool".to_string(),
            version: "1.0.0".to_string(),
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
        }
    }

    #[tokio::test]
    async fn rejects_future_format_version() {
        let (_dir, cache) = download_cache();
        let executor = Executor::new(&cache, CancellationToken::new());
        let mut plan = base_plan();
        plan.format_version = CURRENT_FORMAT_VERSION + 1;

        let staging = tempfile::tempdir().unwrap();
        let err = executor.execute(&plan, staging.path()).await.unwrap_err();
        assert!(matches!(err, ExecError::UnsupportedFormatVersion { .. }));
    }

    #[tokio::test]
    async fn download_step_populates_last_artifact_for_extract() {
        let server = MockServer::start().await;
        let body = b"tar-bytes".to_vec();
        let expected = sha256_hex(&body);
        Mock::given(method("GET"))
            .and(path("/tool.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;

        let (_dir, cache) = download_cache();
        let executor = Executor::new(&cache, CancellationToken::new());

        let mut plan = base_plan();
        plan.steps.push(ResolvedStep {
            action: "fetch".to_string(),
            params: BTreeMap::new(),
            evaluable: true,
            url: Some(format!("{}/tool.tar.gz", server.uri())),
            checksum: Some(format!("sha256:{expected}")),
            size: Some(9),
            description: None,
        });

        let staging = tempfile::tempdir().unwrap();
        let report = executor.execute(&plan, staging.path()).await.unwrap();
        assert!(report.declared_binaries.is_empty());
    }

    #[tokio::test]
    async fn extract_without_prior_download_fails() {
        let (_dir, cache) = download_cache();
        let executor = Executor::new(&cache, CancellationToken::new());

        let mut plan = base_plan();
        let mut params = BTreeMap::new();
        params.insert("dest_path".to_string(), toml::Value::String("bin/".to_string()));
        plan.steps.push(ResolvedStep {
            action: "extract".to_string(),
            params,
            evaluable: true,
            url: None,
            checksum: None,
            size: None,
            description: None,
        });

        let staging = tempfile::tempdir().unwrap();
        let err = executor.execute(&plan, staging.path()).await.unwrap_err();
        assert!(matches!(err, ExecError::NoArtifactStaged { .. }));
    }

    #[tokio::test]
    async fn checksum_mismatch_on_download_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tool.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"actual".to_vec()))
            .mount(&server)
            .await;

        let (_dir, cache) = download_cache();
        let executor = Executor::new(&cache, CancellationToken::new());

        let mut plan = base_plan();
        plan.steps.push(ResolvedStep {
            action: "fetch".to_string(),
            params: BTreeMap::new(),
            evaluable: true,
            url: Some(format!("{}/tool.tar.gz", server.uri())),
            checksum: Some(format!("sha256:{}", "0".repeat(64))),
            size: Some(6),
            description: None,
        });

        let staging = tempfile::tempdir().unwrap();
        let err = executor.execute(&plan, staging.path()).await.unwrap_err();
        assert!(matches!(err, ExecError::ChecksumMismatch { .. }));
    }

    #[tokio::test]
    async fn already_cancelled_token_stops_before_first_step() {
        let (_dir, cache) = download_cache();
        let token = CancellationToken::new();
        token.cancel();
        let executor = Executor::new(&cache, token);

        let mut plan = base_plan();
        let mut params = BTreeMap::new();
        params.insert("command".to_string(), toml::Value::String("echo hi".to_string()));
        plan.steps.push(ResolvedStep {
            action: "shell".to_string(),
            params,
            evaluable: false,
            url: None,
            checksum: None,
            size: None,
            description: None,
        });

        let staging = tempfile::tempdir().unwrap();
        let err = executor.execute(&plan, staging.path()).await.unwrap_err();
        assert!(matches!(err, ExecError::Cancelled));
    }

    #[tokio::test]
    async fn shell_step_runs_and_succeeds() {
        let (_dir, cache) = download_cache();
        let executor = Executor::new(&cache, CancellationToken::new());

        let mut plan = base_plan();
        let mut params = BTreeMap::new();
        params.insert("command".to_string(), toml::Value::String("exit 0".to_string()));
        plan.steps.push(ResolvedStep {
            action: "shell".to_string(),
            params,
            evaluable: false,
            url: None,
            checksum: None,
            size: None,
            description: None,
        });

        let staging = tempfile::tempdir().unwrap();
        executor.execute(&plan, staging.path()).await.unwrap();
    }

    #[tokio::test]
    async fn failing_shell_step_is_fatal() {
        let (_dir, cache) = download_cache();
        let executor = Executor::new(&cache, CancellationToken::new());

        let mut plan = base_plan();
        let mut params = BTreeMap::new();
        params.insert("command".to_string(), toml::Value::String("exit 7".to_string()));
        plan.steps.push(ResolvedStep {
            action: "shell".to_string(),
            params,
            evaluable: false,
            url: None,
            checksum: None,
            size: None,
            description: None,
        });

        let staging = tempfile::tempdir().unwrap();
        let err = executor.execute(&plan, staging.path()).await.unwrap_err();
        assert!(matches!(err, ExecError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn install_binaries_rejects_path_escape() {
        let (_dir, cache) = download_cache();
        let executor = Executor::new(&cache, CancellationToken::new());

        let mut plan = base_plan();
        let mut params = BTreeMap::new();
        params.insert(
            "binaries".to_string(),
            toml::Value::Array(vec![toml::Value::String("../escape".to_string())]),
        );
        plan.steps.push(ResolvedStep {
            action: "install_binaries".to_string(),
            params,
            evaluable: true,
            url: None,
            checksum: None,
            size: None,
            description: None,
        });

        let staging = tempfile::tempdir().unwrap();
        let err = executor.execute(&plan, staging.path()).await.unwrap_err();
        assert!(matches!(err, ExecError::PathEscape { .. }));
    }
}
