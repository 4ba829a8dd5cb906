use anvil_cache::CleanupMode;
use anvil_orchestrator::{Orchestrator, Result};

use crate::cli::CacheCommand;

pub fn handle(orchestrator: &Orchestrator, command: CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Stats => {
            let stats = orchestrator.context().download_cache.stats()?;
            println!("{} artifacts, {} bytes", stats.entry_count, stats.total_bytes);
        }
        CacheCommand::Prune { max_age_days } => {
            let threshold = std::time::Duration::from_secs(max_age_days * 24 * 60 * 60);
            let report = orchestrator.cleanup_downloads(CleanupMode::MaxAge(threshold))?;
            println!("evicted {} artifacts, {} bytes", report.evicted_count, report.evicted_bytes);
        }
        CacheCommand::Enforce => {
            let report = orchestrator.cleanup_downloads(CleanupMode::ForceLimit)?;
            println!("evicted {} artifacts, {} bytes", report.evicted_count, report.evicted_bytes);
        }
    }
    Ok(())
}
