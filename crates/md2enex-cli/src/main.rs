use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use md2enex_cli::{
    cli::{Cli, Commands},
    commands::{self, Outcome},
    config,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG, when set, takes precedence over the flags
    let env_filter = EnvFilter::builder()
        .with_default_directive(cli.level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(outcome) => ExitCode::from(outcome.code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(commands::FATAL_EXIT_CODE)
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert(args) => commands::convert::execute(config, args),
        Commands::Batch(args) => commands::batch::execute(config, args),
    }
}
