//! Strata CLI entry point.

use clap::Parser;

use strata::cli::{Cli, Commands};
use strata::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _logger = match LoggerImpl::init(&cli.log_config()) {
        Ok(logger) => logger,
        Err(err) => strata::cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Show(args) => strata::cli::commands::show::execute(&cli.dir, args, cli.json).await,
        Commands::Keys(args) => strata::cli::commands::keys::execute(&cli.dir, args, cli.json).await,
    };

    if let Err(err) = result {
        strata::cli::handle_error(err, cli.json);
    }
}
