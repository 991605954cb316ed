//! Settings management commands.

use crate::cli::ConfigCommand;
use crate::config::OutputFormat;
use crate::output::{info, success};
use crate::CliConfig;

/// Runs a config command.
pub fn run_config(cmd: ConfigCommand, config: &mut CliConfig) -> crate::CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config),
        ConfigCommand::Set { key, value } => set_config(config, &key, &value),
        ConfigCommand::Path => {
            println!("{}", CliConfig::config_path()?.display());
            Ok(())
        }
    }
}

/// Shows the current settings.
fn show_config(config: &CliConfig) -> crate::CliResult<()> {
    let config_path = CliConfig::config_path()?;

    info(&format!("Configuration file: {}", config_path.display()));
    println!();
    println!("output_format: {:?}", config.output_format);

    if let Some(url) = &config.server_url {
        println!("server_url: {url}");
    }
    if let Some(dn) = &config.bind_dn {
        println!("bind_dn: {dn}");
    }
    if config.bind_password.is_some() {
        println!("bind_password: ********");
    }

    Ok(())
}

/// Sets a setting and saves the file.
fn set_config(config: &mut CliConfig, key: &str, value: &str) -> crate::CliResult<()> {
    match key {
        "server_url" | "server" => {
            config.server_url = non_empty(value);
        }
        "bind_dn" => {
            config.bind_dn = non_empty(value);
        }
        "bind_password" => {
            return Err(crate::CliError::InvalidArgument(
                "bind_password is not accepted on the command line; edit the settings file instead"
                    .to_string(),
            ));
        }
        "output_format" | "output" => {
            config.output_format = match value.to_lowercase().as_str() {
                "table" => OutputFormat::Table,
                "json" => OutputFormat::Json,
                "yaml" => OutputFormat::Yaml,
                "quiet" => OutputFormat::Quiet,
                _ => {
                    return Err(crate::CliError::InvalidArgument(format!(
                        "Unknown output format: {value}. Supported: table, json, yaml, quiet"
                    )));
                }
            };
        }
        _ => {
            return Err(crate::CliError::InvalidArgument(format!(
                "Unknown configuration key: {key}. Known keys: server_url, bind_dn, output_format"
            )));
        }
    }

    config.save()?;
    success(&format!("Set {key} = {value}"));
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}
