use anvil_orchestrator::{Orchestrator, Result};

pub fn handle(orchestrator: &Orchestrator) -> Result<()> {
    let summaries = orchestrator.list()?;
    if summaries.is_empty() {
        println!("nothing installed");
        return Ok(());
    }
    for summary in summaries {
        let kind = if summary.is_library { "library" } else { "tool" };
        let marker = if summary.is_explicit { "*" } else { " " };
        print!("{marker} {:<20} {:<12} {kind}", summary.name, summary.active_version);
        if !summary.required_by.is_empty() {
            print!("  required by: {}", summary.required_by.join(", "));
        }
        println!();
    }
    Ok(())
}
