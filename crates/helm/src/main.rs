use clap::Parser;
use eyre::Result;

use helm::cli::{Cli, Commands, ConfigCommands};
use helm::commands::{
    Command, CommandContext, catalog::CatalogCommand, config::ConfigAction,
    config::ConfigCommand, remember::RememberCommand, resolve::ResolveCommand,
    simulate::SimulateCommand,
};
use helm_core::session::SessionState;

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre for better error reports
    color_eyre::install()?;

    let cli = Cli::parse();

    // Initialize tracing (level configured via RUST_LOG env var)
    helm_core::utils::tracing::init_tracing()?;

    let context = CommandContext::from_cli(&cli)?;

    match cli.command {
        Commands::Resolve {
            endpoint,
            agent_id,
            assistant_id,
            model,
            spec,
            json,
        } => {
            let command = ResolveCommand {
                context,
                session: SessionState {
                    endpoint: Some(endpoint),
                    agent_id,
                    assistant_id,
                    model,
                    spec,
                },
                json,
            };
            command.execute().await
        }
        Commands::Simulate { scenario, json } => {
            let command = SimulateCommand {
                context,
                scenario,
                json,
            };
            command.execute().await
        }
        Commands::Remember { kind, id } => {
            let command = RememberCommand {
                context,
                kind: kind.into(),
                id,
            };
            command.execute().await
        }
        Commands::Catalog => CatalogCommand { context }.execute().await,
        Commands::Config { action } => {
            let command = ConfigCommand {
                context,
                action: match action {
                    ConfigCommands::Show => ConfigAction::Show,
                    ConfigCommands::Init => ConfigAction::Init,
                },
            };
            command.execute().await
        }
    }
}
