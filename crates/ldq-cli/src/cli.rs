//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;

/// ldq - run and inspect directory query configurations.
#[derive(Debug, Parser)]
#[command(name = "ldq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory server URL (overrides the query configuration).
    #[arg(short, long, global = true, env = "LDQ_SERVER_URL")]
    pub server: Option<String>,

    /// Output format (defaults to the configured one).
    #[arg(short, long, global = true, value_enum, env = "LDQ_OUTPUT")]
    pub output: Option<OutputFormat>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a query configuration and show it.
    Decode(DecodeArgs),

    /// Encode a JSON query specification as configuration text.
    Encode(EncodeArgs),

    /// Show the search a configuration would run.
    Filter(FilterArgs),

    /// Run a query and print the resulting process data.
    Run(RunArgs),

    /// CLI settings management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for `decode`.
#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Query configuration file (property text).
    pub config: PathBuf,
}

/// Arguments for `encode`.
#[derive(Debug, Args)]
pub struct EncodeArgs {
    /// Query specification file (JSON).
    pub spec: PathBuf,

    /// Write the configuration to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Process variables for a query.
#[derive(Debug, Clone, Default, Args)]
pub struct VarArgs {
    /// JSON file with the process data (the `in` record).
    #[arg(long)]
    pub vars: Option<PathBuf>,

    /// Set a text variable, e.g. `--var customer.name=Alice`.
    #[arg(long = "var", value_name = "PATH=VALUE")]
    pub var: Vec<String>,
}

/// Arguments for `filter`.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Query configuration file (property text).
    pub config: PathBuf,

    /// Process variables.
    #[command(flatten)]
    pub vars: VarArgs,
}

/// Arguments for `run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Query configuration file (property text).
    pub config: PathBuf,

    /// Process variables.
    #[command(flatten)]
    pub vars: VarArgs,

    /// Serve entries from this JSON fixture instead of a directory server.
    #[arg(long)]
    pub entries: Option<PathBuf>,
}

/// Config commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current settings.
    Show,

    /// Set a setting.
    Set {
        /// Setting key.
        key: String,
        /// Setting value.
        value: String,
    },

    /// Print the settings file path.
    Path,
}
