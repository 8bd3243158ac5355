mod args;
mod commands;
mod provider;

pub use args::{Cli, Commands, CompleteArgs, ConfigSubcommands};
pub use provider::{infer_provider, select_provider};

use crate::config::AppConfig;
use crate::core::error::Result;

/// Runs one subcommand and returns what should go to stdout.
pub async fn run(cli: &Cli, config: &AppConfig) -> Result<String> {
    match &cli.command {
        Commands::Complete(args) => commands::complete(args, config, cli.verbose).await,
        Commands::Providers => commands::providers(config),
        Commands::Normalize { provider, file } => commands::normalize(provider, file, config),
        Commands::Config { command } => commands::config(command, config),
    }
}
