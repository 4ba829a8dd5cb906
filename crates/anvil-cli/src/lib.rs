//! Command-line interface for the anvil tool manager.
//!
//! Contains no plan/resolution logic of its own: every subcommand parses
//! its arguments and calls straight into [`anvil_orchestrator::Orchestrator`].

pub mod cli;
pub mod commands;
pub mod context;
pub mod error_handler;

pub use cli::Cli;

use clap::Parser;

/// Entry point called by the `anvil` binary.
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    anvil_core::init_tracing(cli.verbose, cli.debug);

    let orchestrator = context::build_orchestrator().await?;

    let result = match cli.command {
        cli::Commands::Install { tool, version } => commands::install::handle(&orchestrator, &tool, &version).await,
        cli::Commands::Remove { tool } => commands::remove::handle(&orchestrator, &tool),
        cli::Commands::List => commands::list::handle(&orchestrator),
        cli::Commands::Which { binary } => commands::which::handle(&orchestrator, &binary),
        cli::Commands::Cleanup { command } => commands::cleanup::handle(&orchestrator, command),
        cli::Commands::Cache { command } => commands::cache::handle(&orchestrator, command),
    };

    if let Err(err) = result {
        let code = error_handler::report(&err);
        std::process::exit(code);
    }

    Ok(())
}
