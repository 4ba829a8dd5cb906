//! Structured error reporting: prints an operator-facing message and maps
//! the failure's stable [`anvil_core::ErrorCategory`] onto a process exit
//! code (spec.md §7 / SPEC_FULL.md §7 — the one piece of CLI detail the
//! core exposes a narrow interface for).

use anvil_core::{Categorized, ErrorCategory};
use anvil_orchestrator::OrchestratorError;

/// Print `err` to stderr and return the exit code the process should use.
pub fn report(err: &OrchestratorError) -> i32 {
    let category = err.category();
    eprintln!("error: {err}");
    if let Some(hint) = hint_for(category) {
        eprintln!("  {hint}");
    }
    exit_code_for(category)
}

fn hint_for(category: ErrorCategory) -> Option<&'static str> {
    match category {
        ErrorCategory::RecipeNotFound => Some("check the tool name, or add a recipe under the recipes/ directory"),
        ErrorCategory::VersionNotFound => Some("run with no version argument to resolve the latest known version"),
        ErrorCategory::UnsupportedPlatform => Some("this recipe has no steps for the current OS/architecture"),
        ErrorCategory::Network => Some("check connectivity to the recipe's upstream source and retry"),
        ErrorCategory::ChecksumMismatch => Some("the downloaded artifact did not match its expected hash; retry, or report a stale recipe"),
        ErrorCategory::Busy => Some("another anvil process holds the state lock; retry shortly"),
        ErrorCategory::CacheFull => Some("run 'anvil cache enforce' to evict least-recently-used downloads"),
        _ => None,
    }
}

fn exit_code_for(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::RecipeNotFound => 2,
        ErrorCategory::VersionNotFound => 3,
        ErrorCategory::UnsupportedPlatform => 4,
        ErrorCategory::Network => 5,
        ErrorCategory::ChecksumMismatch => 6,
        ErrorCategory::ArtifactTooLarge => 7,
        ErrorCategory::DependencyFailed => 8,
        ErrorCategory::CircularDependency => 9,
        ErrorCategory::Cancelled => 10,
        ErrorCategory::Busy => 11,
        ErrorCategory::CacheFull => 12,
        ErrorCategory::InstallFailed => 1,
    }
}
