use anvil_orchestrator::{Orchestrator, Result};

pub fn handle(orchestrator: &Orchestrator, tool: &str) -> Result<()> {
    let removed = orchestrator.remove(tool)?;
    for name in &removed {
        println!("removed {name}");
    }
    Ok(())
}
