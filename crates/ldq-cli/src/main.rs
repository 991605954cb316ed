//! # ldq
//!
//! Runs and inspects directory query configurations.

#![forbid(unsafe_code)]

use clap::Parser;
use ldq_cli::{
    cli::{Cli, Command},
    commands::{run_config, run_decode, run_encode, run_filter, run_query},
    config::CliConfig,
    output::error,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = match CliConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };
    let format = config.effective_output(cli.output);

    // Execute command
    let result = match cli.command {
        Command::Decode(args) => run_decode(&args, format),
        Command::Encode(args) => run_encode(&args),
        Command::Filter(args) => run_filter(&args, format),
        Command::Run(args) => run_query(&args, &config, cli.server.as_deref(), format).await,
        Command::Config(cmd) => run_config(cmd, &mut config),
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}
