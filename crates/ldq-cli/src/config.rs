//! CLI settings.
//!
//! Stored as TOML in `~/.ldq/ldq.toml`. A missing file means defaults.

use std::path::PathBuf;

use ldq_query::ServerConfig;
use serde::{Deserialize, Serialize};

/// CLI settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default output format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Directory server URL used instead of the configured one.
    pub server_url: Option<String>,

    /// Bind DN used instead of the configured one.
    pub bind_dn: Option<String>,

    /// Bind password used instead of the configured one.
    pub bind_password: Option<String>,
}

impl CliConfig {
    /// Loads settings from file.
    pub fn load() -> crate::CliResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses settings from TOML text.
    pub fn from_toml(content: &str) -> crate::CliResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Saves settings to file.
    pub fn save(&self) -> crate::CliResult<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::CliError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Gets the settings file path.
    pub fn config_path() -> crate::CliResult<PathBuf> {
        let home = dirs_next::home_dir().ok_or_else(|| {
            crate::CliError::Config("could not determine home directory".to_string())
        })?;
        Ok(home.join(".ldq").join("ldq.toml"))
    }

    /// Gets the effective output format (from args or settings).
    pub fn effective_output(&self, arg_output: Option<OutputFormat>) -> OutputFormat {
        arg_output.unwrap_or(self.output_format)
    }

    /// Applies server overrides: the command-line URL first, then settings.
    pub fn apply_overrides(&self, server: &mut ServerConfig, arg_server: Option<&str>) {
        if let Some(url) = arg_server.or(self.server_url.as_deref()) {
            server.url = url.to_string();
        }
        if let Some(dn) = &self.bind_dn {
            server.user_name = dn.clone();
        }
        if let Some(password) = &self.bind_password {
            server.password = password.clone();
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
    /// Quiet (minimal output).
    Quiet,
}
