// Local crates
use crate::{
    helpers::load_config::{ConfigSource, PluginConfigFile},
    options::{logging::LoggingConfig, uplinks::UplinkInterfaces},
};

// External crates
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distributed store used when `--cluster-store` is not given.
pub const DEFAULT_STORE_URL: &str = "etcd://127.0.0.1:2379";

/// Orchestrator integration surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginMode {
    /// Docker network/IPAM plugin
    #[default]
    Docker,
    /// Kubernetes CNI
    Kubernetes,
}

impl fmt::Display for PluginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Kubernetes => write!(f, "kubernetes"),
        }
    }
}

/// Every operator-settable knob, fully populated before anything
/// downstream runs and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorOptions {
    /// Label identifying endpoints homed on this host
    pub host_label: String,
    /// `host_label` came from the hostname fallback
    pub host_label_defaulted: bool,
    /// Orchestrator integration mode
    pub plugin_mode: PluginMode,
    /// Where the plugin configuration was read from, if anywhere
    pub config_source: Option<ConfigSource>,
    /// Log level, format and sinks
    pub logging: LoggingConfig,
    /// Control-plane address override
    pub control_ip: Option<String>,
    /// Tunnel-endpoint address override
    pub tunnel_ip: Option<String>,
    /// Uplink interfaces, duplicates dropped
    pub uplink_interfaces: UplinkInterfaces,
    /// Distributed store URL, `scheme://...`
    pub store_url: String,
    /// Print the version banner and exit
    pub show_version: bool,
    /// Extra state reconciliation attempts, 0 fails fast
    pub reconcile_retries: u32,
}

/// Raw per-option values as given on the command line, before defaults.
///
/// `None` means the flag was absent. Empty strings are kept as given and
/// interpreted per option by [`OperatorOptions::merge`].
#[derive(Debug, Clone, Default)]
pub struct CommandLineValues {
    /// `--host-label`
    pub host_label: Option<String>,
    /// `--plugin-mode`
    pub plugin_mode: Option<PluginMode>,
    /// `--ctrl-ip`
    pub control_ip: Option<String>,
    /// `--vtep-ip`
    pub tunnel_ip: Option<String>,
    /// Every `--vlan-if` occurrence, in order
    pub vlan_if: Vec<String>,
    /// `--cluster-store`
    pub store_url: Option<String>,
    /// `--version`
    pub show_version: bool,
    /// `--reconcile-retries`
    pub reconcile_retries: u32,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl OperatorOptions {
    /// Merge command line values over the plugin configuration (if any)
    /// over built-in defaults.
    ///
    /// `vlan-if` entries from the configuration come first, command line
    /// occurrences are appended after them. An explicitly empty
    /// `--cluster-store` is kept so the store locator rejects it.
    pub fn merge(
        cli: CommandLineValues,
        logging: LoggingConfig,
        config_source: Option<ConfigSource>,
        file: Option<PluginConfigFile>,
        hostname: Option<String>,
    ) -> Self {
        let file = file.unwrap_or_default();

        let (host_label, host_label_defaulted) =
            match non_empty(cli.host_label).or(non_empty(file.host_label)) {
                Some(label) => (label, false),
                None => (hostname.unwrap_or_default(), true),
            };

        let uplink_interfaces =
            UplinkInterfaces::from_occurrences(file.vlan_if.iter().chain(cli.vlan_if.iter()));

        Self {
            host_label,
            host_label_defaulted,
            plugin_mode: cli.plugin_mode.or(file.plugin_mode).unwrap_or_default(),
            config_source,
            logging,
            control_ip: non_empty(cli.control_ip).or(non_empty(file.ctrl_ip)),
            tunnel_ip: non_empty(cli.tunnel_ip).or(non_empty(file.vtep_ip)),
            uplink_interfaces,
            store_url: cli
                .store_url
                .or(file.cluster_store)
                .unwrap_or_else(|| DEFAULT_STORE_URL.to_string()),
            show_version: cli.show_version,
            reconcile_retries: cli.reconcile_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(cli: CommandLineValues, file: Option<PluginConfigFile>) -> OperatorOptions {
        OperatorOptions::merge(
            cli,
            LoggingConfig::default(),
            None,
            file,
            Some("node-1".to_string()),
        )
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let opts = merge(CommandLineValues::default(), None);
        assert_eq!(opts.host_label, "node-1");
        assert!(opts.host_label_defaulted);
        assert_eq!(opts.plugin_mode, PluginMode::Docker);
        assert_eq!(opts.store_url, DEFAULT_STORE_URL);
        assert_eq!(opts.control_ip, None);
        assert_eq!(opts.tunnel_ip, None);
        assert!(opts.uplink_interfaces.is_empty());
        assert_eq!(opts.reconcile_retries, 0);
    }

    #[test]
    fn empty_addresses_mean_unset() {
        let cli = CommandLineValues {
            control_ip: Some(String::new()),
            tunnel_ip: Some(String::new()),
            ..Default::default()
        };
        let opts = merge(cli, None);
        assert_eq!(opts.control_ip, None);
        assert_eq!(opts.tunnel_ip, None);
    }

    #[test]
    fn command_line_wins_over_configuration_file() {
        let cli = CommandLineValues {
            control_ip: Some("10.0.0.5".to_string()),
            vlan_if: vec!["eth2".to_string()],
            ..Default::default()
        };
        let file = PluginConfigFile {
            host_label: Some("from-file".to_string()),
            plugin_mode: Some(PluginMode::Kubernetes),
            ctrl_ip: Some("192.168.1.1".to_string()),
            vtep_ip: Some("192.168.2.1".to_string()),
            vlan_if: vec!["eth0,eth1".to_string()],
            cluster_store: Some("consul://10.1.1.1:8500".to_string()),
        };
        let opts = merge(cli, Some(file));

        assert_eq!(opts.host_label, "from-file");
        assert!(!opts.host_label_defaulted);
        assert_eq!(opts.plugin_mode, PluginMode::Kubernetes);
        assert_eq!(opts.control_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(opts.tunnel_ip.as_deref(), Some("192.168.2.1"));
        assert_eq!(opts.uplink_interfaces.as_slice(), ["eth0", "eth1", "eth2"]);
        assert_eq!(opts.store_url, "consul://10.1.1.1:8500");
    }

    #[test]
    fn explicit_empty_store_url_is_preserved() {
        let cli = CommandLineValues {
            store_url: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(merge(cli, None).store_url, "");
    }

    #[test]
    fn missing_hostname_defaults_to_empty_label() {
        let opts = OperatorOptions::merge(
            CommandLineValues::default(),
            LoggingConfig::default(),
            None,
            None,
            None,
        );
        assert_eq!(opts.host_label, "");
        assert!(opts.host_label_defaulted);
    }
}
