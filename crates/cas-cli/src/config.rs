//! CLI configuration.

use std::path::{Path, PathBuf};

use cas_protocol::{Properties, ProtocolVersion};
use serde::{Deserialize, Serialize};

/// CLI configuration, stored as TOML.
///
/// ```toml
/// output_format = "table"
/// ecas = false
///
/// [cas]
/// base_url = "https://cas.example.com/cas"
/// protocol_version = "3.0"
/// # ...endpoint definitions...
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Use the ECAS profile.
    #[serde(default)]
    pub ecas: bool,

    /// CAS client properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas: Option<Properties>,
}

impl CliConfig {
    /// Loads configuration from the given file, or the default one.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> crate::CliResult<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            tracing::debug!(path = %config_path.display(), "No configuration file; using defaults");
            Ok(Self::default())
        }
    }

    /// Parses configuration from TOML.
    pub fn from_toml(content: &str) -> crate::CliResult<Self> {
        toml::from_str(content)
            .map_err(|e| crate::CliError::Config(format!("failed to parse config: {e}")))
    }

    /// Serializes configuration to TOML.
    pub fn to_toml(&self) -> crate::CliResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| crate::CliError::Config(format!("failed to serialize config: {e}")))
    }

    /// Saves configuration to the given file, or the default one.
    pub fn save(&self, path: Option<&Path>) -> crate::CliResult<PathBuf> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, self.to_toml()?)?;
        Ok(config_path)
    }

    /// Gets the default configuration file path.
    pub fn config_path() -> crate::CliResult<PathBuf> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| crate::CliError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".cas").join("cas.toml"))
    }

    /// Gets the effective properties: the configured ones, pointed at
    /// `server` when given. With only a server, the CAS 3.0 defaults are used.
    pub fn effective_properties(&self, server: Option<&str>) -> crate::CliResult<Properties> {
        match (&self.cas, server) {
            (Some(properties), Some(server)) => Ok(properties.with_base_url(server)?),
            (Some(properties), None) => Ok(properties.clone()),
            (None, Some(server)) => Ok(Properties::for_server(server, ProtocolVersion::V3)?),
            (None, None) => Err(crate::CliError::Config(
                "no CAS server configured; use --server or `cas config init`".to_string(),
            )),
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// Quiet (only the primary value).
    Quiet,
}

/// Protocol version as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VersionArg {
    /// CAS 1.0.
    #[value(name = "1.0")]
    V1,
    /// CAS 2.0.
    #[value(name = "2.0")]
    V2,
    /// CAS 3.0.
    #[value(name = "3.0")]
    V3,
}

impl From<VersionArg> for ProtocolVersion {
    fn from(value: VersionArg) -> Self {
        match value {
            VersionArg::V1 => Self::V1,
            VersionArg::V2 => Self::V2,
            VersionArg::V3 => Self::V3,
        }
    }
}
