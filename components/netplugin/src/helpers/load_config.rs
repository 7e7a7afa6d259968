// Local crates
use crate::{error::ConfigurationError, options::PluginMode};

// External crates
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use tracing::instrument;

/// Where `--config` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `-`: read the configuration from standard input
    Stdin,
    Path(PathBuf),
}

impl ConfigSource {
    /// Interpret a `--config` value, `-` meaning standard input.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            Self::Stdin
        } else {
            Self::Path(PathBuf::from(value))
        }
    }

    /// Human readable origin used in diagnostics.
    #[must_use]
    pub fn origin(&self) -> String {
        match self {
            Self::Stdin => "<stdin>".to_string(),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

/// Plugin configuration document. Keys mirror the flag names.
///
/// ```toml
/// host-label = "compute-07"
/// plugin-mode = "kubernetes"
/// ctrl-ip = "10.0.0.5"
/// vlan-if = ["eth1,eth2"]
/// cluster-store = "etcd://10.0.0.2:2379"
/// ```
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PluginConfigFile {
    /// `host-label`
    pub host_label: Option<String>,
    /// `plugin-mode`
    pub plugin_mode: Option<PluginMode>,
    /// `ctrl-ip`
    pub ctrl_ip: Option<String>,
    /// `vtep-ip`
    pub vtep_ip: Option<String>,
    /// `vlan-if`, each entry may hold a comma separated list
    #[serde(default)]
    pub vlan_if: Vec<String>,
    /// `cluster-store`
    pub cluster_store: Option<String>,
}

impl PluginConfigFile {
    /// Read and parse the plugin configuration from a file or from `stdin`.
    #[instrument(
        name = "plugin_config_loader",
        target = "helpers::load_config",
        level = "trace",
        skip_all
    )]
    pub fn load<R: Read>(source: &ConfigSource, mut stdin: R) -> Result<Self, ConfigurationError> {
        let origin = source.origin();

        tracing::trace!(configuration_source = %origin, "Loading plugin configuration");

        let text = match source {
            ConfigSource::Stdin => {
                let mut buf = String::new();
                stdin.read_to_string(&mut buf).map(|_| buf)
            }
            ConfigSource::Path(path) => fs::read_to_string(path),
        }
        .map_err(|source| ConfigurationError::ConfigRead {
            origin: origin.clone(),
            source,
        })?;

        let config = Self::parse(&origin, &text)?;

        tracing::trace!(configuration_source = %origin, "Plugin configuration loaded successfully");
        Ok(config)
    }

    /// Parse configuration text. `host-label` is mandatory.
    pub fn parse(origin: &str, text: &str) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigurationError::ConfigParse {
            origin: origin.to_string(),
            source,
        })?;

        match config.host_label.as_deref() {
            Some(label) if !label.is_empty() => Ok(config),
            _ => Err(ConfigurationError::MissingHostLabel(origin.to_string())),
        }
    }
}
