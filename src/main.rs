//! Queue Sweeper CLI entry point.

use clap::Parser;

use queue_sweeper::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => queue_sweeper::cli::commands::run::execute(args, config_path, cli.json).await,
        Commands::Config(args) => queue_sweeper::cli::commands::config::execute(args, config_path, cli.json),
        Commands::Ledger(args) => {
            queue_sweeper::cli::commands::ledger::execute(args, config_path, cli.json).await
        }
    };

    if let Err(err) = result {
        queue_sweeper::cli::handle_error(err, cli.json);
    }
}
