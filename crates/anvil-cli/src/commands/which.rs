use anvil_orchestrator::{Orchestrator, Result};

pub fn handle(orchestrator: &Orchestrator, binary: &str) -> Result<()> {
    match orchestrator.which(binary)? {
        Some(path) => println!("{}", path.display()),
        None => println!("{binary} is not installed"),
    }
    Ok(())
}
