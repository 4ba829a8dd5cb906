use anvil_orchestrator::{Orchestrator, Result};
use anvil_recipe::shadow::find_shadowed_dependencies;

pub async fn handle(orchestrator: &Orchestrator, tool: &str, version: &str) -> Result<()> {
    if let Ok(recipe) = orchestrator.context().recipe_loader().load(tool) {
        for shadowed in find_shadowed_dependencies(&recipe, &orchestrator.context().actions) {
            eprintln!("warning: {shadowed}");
        }
    }

    let outcome = orchestrator.install(tool, version).await?;
    if outcome.was_already_installed {
        println!("{} {} is already installed", outcome.tool, outcome.version);
    } else {
        println!("installed {} {}", outcome.tool, outcome.version);
    }
    Ok(())
}
