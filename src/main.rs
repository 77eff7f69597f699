//! Narrow - web traffic observation proxy.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use narrow::cli::{self, Cli, Commands, HooksCommand};
use narrow::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("narrow=info".parse().unwrap()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            cli::run::run(args).await?;
        }
        Commands::Hooks { command } => match command {
            HooksCommand::Install { force } => cli::hooks::install(force)?,
            HooksCommand::Check { path } => cli::hooks::check(path)?,
        },
    }

    Ok(())
}
