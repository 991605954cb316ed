//! # ldq-cli
//!
//! Command-line front end for the directory query element:
//! - decode and encode query configurations,
//! - show the search a configuration would run,
//! - run a query against a server or an entry fixture.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::future_not_send)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
