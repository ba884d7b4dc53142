use anyhow::Result;
use clap::Parser;
use pydeps_core::PydepsConfig;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod console;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    let mut config = PydepsConfig::from_env();
    config.verbose |= args.verbose;

    init_tracing(config.verbose);

    match run(args.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            console::error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &PydepsConfig) -> Result<()> {
    match command {
        Command::Resolve(args) => commands::resolve::run(args, config).await,
        Command::Deps(args) => commands::deps::run(args, config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
