use anvil_orchestrator::{Orchestrator, Result};

use crate::cli::CleanupCommand;

pub fn handle(orchestrator: &Orchestrator, command: CleanupCommand) -> Result<()> {
    match command {
        CleanupCommand::Orphans => {
            let removed = orchestrator.cleanup_orphans()?;
            if removed.is_empty() {
                println!("no orphans");
            } else {
                for name in &removed {
                    println!("removed orphan {name}");
                }
            }
        }
    }
    Ok(())
}
