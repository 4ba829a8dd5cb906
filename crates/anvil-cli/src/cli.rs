//! Argument parsing. One `clap` derive tree, no dispatch logic here —
//! `lib.rs` matches on `Commands` and calls straight into `anvil-orchestrator`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "anvil")]
#[command(about = "Cross-platform package manager for developer tools")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-ish) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable full debug logging, including targets.
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a tool or library, plus every dependency it needs.
    Install {
        /// Recipe name, e.g. "node", "ripgrep".
        tool: String,
        /// Version constraint. Empty or "latest" resolves to the newest
        /// known version.
        #[arg(default_value = "")]
        version: String,
    },

    /// Remove an installed tool, cascading to any dependency that becomes
    /// orphaned as a result.
    Remove {
        /// Recipe name to remove.
        tool: String,
    },

    /// List every tool and library currently tracked in state.
    List,

    /// Print the on-disk target `current/<binary>` resolves to.
    Which {
        /// Binary name, as it would be invoked on PATH.
        binary: String,
    },

    /// Cache and orphan maintenance.
    Cleanup {
        #[command(subcommand)]
        command: CleanupCommand,
    },

    /// Download-cache introspection.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
pub enum CleanupCommand {
    /// Remove every orphaned tool/library (no explicit install depends on
    /// it, directly or transitively).
    Orphans,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show download-cache size and entry count.
    Stats,
    /// Evict entries older than `max_age_days`.
    Prune {
        #[arg(long, default_value_t = 30)]
        max_age_days: u64,
    },
    /// Evict least-recently-used entries until usage is back at or below
    /// the configured soft limit.
    Enforce,
}
