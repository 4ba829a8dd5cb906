//! The six literal end-to-end scenarios against a real `OrchestratorContext`
//! rooted in a temp directory, with `wiremock` standing in for whatever
//! upstream a recipe's `fetch` step names.

use std::collections::BTreeMap;

use anvil_cache::CacheLimits;
use anvil_core::{Arch, Categorized, ErrorCategory, Os, Platform};
use anvil_orchestrator::{Orchestrator, OrchestratorContext, OrchestratorError};
use anvil_paths::HomeLayout;
use anvil_plan::{InstallationPlan, PlanPlatform, RecipeSource, ResolvedStep, CURRENT_FORMAT_VERSION};
use anvil_recipe::Recipe;
use anvil_resolver::ResolverError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn platform() -> Platform {
    Platform {
        os: Os::Linux,
        arch: Arch::X86_64,
        linux_family: None,
        libc: None,
    }
}

fn context(root: &std::path::Path) -> OrchestratorContext {
    let layout = HomeLayout::new(root);
    layout.ensure_dirs().unwrap();
    let limits = CacheLimits {
        soft_limit_bytes: 50_000_000,
        hard_limit_bytes: 100_000_000,
    };
    OrchestratorContext::new(layout, platform(), reqwest::Client::new(), limits)
}

fn write_registry_recipe(ctx: &OrchestratorContext, name: &str, toml: &str) {
    std::fs::write(ctx.layout.registry_recipe_file(name), toml).unwrap();
}

/// A `.tar.gz` with one executable entry at `bin/<binary_name>`.
fn tool_archive(binary_name: &str, contents: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let encoder = flate2::write::GzEncoder::new(&mut buf, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("bin/{binary_name}"), contents)
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }
    buf
}

/// Minimal recipe with a pinned, offline version list plus an opaque
/// `shell` step — enough to exercise dependency induction without ever
/// touching the network.
fn shell_tool_recipe(name: &str, dependencies: &[&str]) -> String {
    format!(
        r#"
[metadata]
name = "{name}"
dependencies = [{deps}]

[version]
source = "registry"
source_config = {{ versions = ["1.0.0"] }}

[[steps]]
action = "shell"
params = {{ command = "true" }}
"#,
        deps = dependencies.iter().map(|d| format!("\"{d}\"")).collect::<Vec<_>>().join(", "),
    )
}

#[tokio::test]
async fn single_binary_install_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let server = MockServer::start().await;
    let archive = tool_archive("tool", b"hello");
    Mock::given(method("GET"))
        .and(path("/tool-1.2.3-linux-amd64.tgz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .mount(&server)
        .await;

    let toml = format!(
        r#"
[metadata]
name = "tool"

[version]
source = "registry"
source_config = {{ versions = ["1.2.3"] }}

[[steps]]
action = "fetch"
params = {{ url = "{}/tool-1.2.3-linux-amd64.tgz" }}

[[steps]]
action = "extract"
params = {{ dest_path = "." }}

[[steps]]
action = "install_binaries"
params = {{ binaries = ["bin/tool"] }}
"#,
        server.uri()
    );
    write_registry_recipe(&ctx, "tool", &toml);

    let orchestrator = Orchestrator::new(ctx);
    let outcome = orchestrator.install("tool", "").await.unwrap();
    assert_eq!(outcome.version, "1.2.3");
    assert!(!outcome.was_already_installed);

    let ctx = orchestrator.context();
    let binary_path = ctx.layout.tool_version_dir("tool", "1.2.3").join("bin/tool");
    assert!(binary_path.exists());
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&binary_path).unwrap().permissions().mode();
        assert!(mode & 0o111 != 0, "extracted binary should be executable");
    }

    let link = ctx.layout.current_binary_link("tool");
    let resolved_link = std::fs::canonicalize(&link).unwrap();
    assert_eq!(resolved_link, std::fs::canonicalize(&binary_path).unwrap());

    let doc = ctx.state.load().unwrap();
    let tool = doc.get_tool("tool").unwrap();
    assert_eq!(tool.active_version, "1.2.3");
    assert!(tool.is_explicit);
    assert!(tool.required_by.is_empty());
}

/// A -> [B, C], B -> D, C -> D. Installs A explicitly and asserts the
/// induced graph spec.md §8 scenario 2 describes.
async fn install_diamond(orchestrator: &Orchestrator) {
    let ctx = orchestrator.context();
    write_registry_recipe(ctx, "a", &shell_tool_recipe("a", &["b", "c"]));
    write_registry_recipe(ctx, "b", &shell_tool_recipe("b", &["d"]));
    write_registry_recipe(ctx, "c", &shell_tool_recipe("c", &["d"]));
    write_registry_recipe(ctx, "d", &shell_tool_recipe("d", &[]));

    orchestrator.install("a", "").await.unwrap();
}

#[tokio::test]
async fn diamond_dependency_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let orchestrator = Orchestrator::new(ctx);

    install_diamond(&orchestrator).await;

    let doc = orchestrator.context().state.load().unwrap();

    let a = doc.get_tool("a").unwrap();
    assert!(a.is_explicit);
    assert!(a.required_by.is_empty());

    let b = doc.get_tool("b").unwrap();
    assert!(!b.is_explicit);
    assert_eq!(b.required_by, std::collections::BTreeSet::from(["a".to_string()]));

    let c = doc.get_tool("c").unwrap();
    assert!(!c.is_explicit);
    assert_eq!(c.required_by, std::collections::BTreeSet::from(["a".to_string()]));

    let d = doc.get_tool("d").unwrap();
    assert!(!d.is_explicit);
    assert_eq!(
        d.required_by,
        std::collections::BTreeSet::from(["b".to_string(), "c".to_string()])
    );
}

#[tokio::test]
async fn orphan_cleanup_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let orchestrator = Orchestrator::new(ctx);

    install_diamond(&orchestrator).await;
    let removed = orchestrator.remove("a").unwrap();

    assert_eq!(
        removed.iter().cloned().collect::<std::collections::BTreeSet<_>>(),
        std::collections::BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()])
    );

    let doc = orchestrator.context().state.load().unwrap();
    assert!(doc.get_tool("a").is_none());
    assert!(doc.get_tool("b").is_none());
    assert!(doc.get_tool("c").is_none());
    assert!(doc.get_tool("d").is_none());
    assert!(doc.orphans().is_empty());

    for name in ["a", "b", "c", "d"] {
        assert!(!orchestrator.context().layout.tools_dir().join(format!("{name}-1.0.0")).exists());
    }
}

#[tokio::test]
async fn checksum_mismatch_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/artifact"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"actual bytes".to_vec()))
        .mount(&server)
        .await;

    let toml = r#"
[metadata]
name = "broken"

[version]
source = "registry"
source_config = { versions = ["1.0.0"] }

[[steps]]
action = "fetch"
params = { url = "http://placeholder.invalid/artifact" }
"#;
    write_registry_recipe(&ctx, "broken", toml);
    let recipe = Recipe::parse(toml).unwrap();

    // A plan with a checksum that will never match what the server
    // actually returns, pre-seeded into the plan cache so `install_fresh`
    // takes the cache-hit path straight to execution.
    let tampered_plan = InstallationPlan {
        format_version: CURRENT_FORMAT_VERSION,
        tool: "broken".to_string(),
        version: "1.0.0".to_string(),
        platform: PlanPlatform::from(&platform()),
        generated_at: "2026-01-01T00:00:00Z".to_string(),
        recipe_hash: recipe.canonical_hash(),
        recipe_source: RecipeSource::Registry,
        deterministic: true,
        steps: vec![ResolvedStep {
            action: "fetch".to_string(),
            params: BTreeMap::new(),
            evaluable: true,
            url: Some(format!("{}/artifact", server.uri())),
            checksum: Some(format!("sha256:{}", "0".repeat(64))),
            size: Some(12),
            description: None,
        }],
    };
    ctx.plan_cache.put(&tampered_plan).unwrap();

    let orchestrator = Orchestrator::new(ctx);
    let err = orchestrator.install("broken", "1.0.0").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::ChecksumMismatch);
    assert!(matches!(err, OrchestratorError::Exec(_)));

    let ctx = orchestrator.context();
    assert!(!ctx.layout.tool_version_dir("broken", "1.0.0").exists());
    let doc = ctx.state.load().unwrap();
    assert!(doc.get_tool("broken").is_none());
}

#[tokio::test]
async fn cached_plan_reuse_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let server = MockServer::start().await;
    let archive = tool_archive("gh", b"gh binary");
    Mock::given(method("GET"))
        .and(path("/gh.tgz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .mount(&server)
        .await;

    let toml = format!(
        r#"
[metadata]
name = "gh"

[version]
source = "registry"
source_config = {{ versions = ["2.0.0"] }}

[[steps]]
action = "fetch"
params = {{ url = "{}/gh.tgz" }}

[[steps]]
action = "extract"
params = {{ dest_path = "." }}

[[steps]]
action = "install_binaries"
params = {{ binaries = ["bin/gh"] }}
"#,
        server.uri()
    );
    write_registry_recipe(&ctx, "gh", &toml);

    let orchestrator = Orchestrator::new(ctx);
    orchestrator.install("gh", "latest").await.unwrap();

    let ctx = orchestrator.context();
    let first_plan = ctx
        .plan_cache
        .get("gh", "2.0.0", false, &Recipe::parse(&toml).unwrap().canonical_hash(), &platform())
        .unwrap();

    // Simulate the version being resolved again (e.g. a crashed run that
    // never reached STATE) without touching the plan or download cache:
    // the second install must not re-run Decompose.
    ctx.state.mutate(|doc| {
        doc.tools.remove("gh");
        Ok(())
    })
    .unwrap();

    orchestrator.install("gh", "latest").await.unwrap();

    let second_plan = ctx
        .plan_cache
        .get("gh", "2.0.0", false, &Recipe::parse(&toml).unwrap().canonical_hash(), &platform())
        .unwrap();
    assert_eq!(first_plan.generated_at, second_plan.generated_at, "Decompose should not re-run on a fingerprint match");

    let doc = ctx.state.load().unwrap();
    assert_eq!(doc.get_tool("gh").unwrap().active_version, "2.0.0");
}

/// `a`'s `npm_install` step implies `node` as a hidden package-manager
/// dependency; installing `b` afterwards with `node` as an explicit
/// `runtime_dependencies` entry must expose `node` without reinstalling it
/// (spec.md §9 / DESIGN.md open question #2).
#[tokio::test]
async fn runtime_dependency_exposes_previously_hidden_tool_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    write_registry_recipe(&ctx, "node", &shell_tool_recipe("node", &[]));

    let a_toml = r#"
[metadata]
name = "a"

[version]
source = "registry"
source_config = { versions = ["1.0.0"] }

[[steps]]
action = "npm_install"
params = { package = "something" }
"#;
    write_registry_recipe(&ctx, "a", a_toml);

    let b_toml = r#"
[metadata]
name = "b"
runtime_dependencies = ["node"]

[version]
source = "registry"
source_config = { versions = ["1.0.0"] }

[[steps]]
action = "shell"
params = { command = "true" }
"#;
    write_registry_recipe(&ctx, "b", b_toml);

    let orchestrator = Orchestrator::new(ctx);
    orchestrator.install("a", "").await.unwrap();

    let doc = orchestrator.context().state.load().unwrap();
    let node = doc.get_tool("node").unwrap();
    assert!(node.is_execution_dependency, "node should start out hidden as a's package-manager dependency");
    assert_eq!(node.required_by, std::collections::BTreeSet::from(["a".to_string()]));

    orchestrator.install("b", "").await.unwrap();

    let doc = orchestrator.context().state.load().unwrap();
    let node = doc.get_tool("node").unwrap();
    assert!(!node.is_execution_dependency, "node must be exposed once it's a runtime dependency, without reinstalling");
    assert_eq!(
        node.required_by,
        std::collections::BTreeSet::from(["a".to_string(), "b".to_string()])
    );
}

#[tokio::test]
async fn pinned_version_not_found_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let toml = r#"
[metadata]
name = "tool"

[version]
source = "registry"
source_config = { versions = ["1.0.0", "1.1.0"] }

[[steps]]
action = "shell"
params = { command = "true" }
"#;
    write_registry_recipe(&ctx, "tool", toml);

    let orchestrator = Orchestrator::new(ctx);
    let err = orchestrator.install("tool", "99.99.99").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::VersionNotFound);
    assert!(matches!(err, OrchestratorError::Resolver(ResolverError::VersionNotFound { .. })));

    let doc = orchestrator.context().state.load().unwrap();
    assert!(doc.get_tool("tool").is_none());
}
