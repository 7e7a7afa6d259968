// Local crates
use crate::{
    error::{BootstrapError, ConfigurationError},
    helpers::load_config::{ConfigSource, PluginConfigFile},
    options::{CommandLineValues, LoggingConfig, OperatorOptions, PluginMode},
};

// External crates
use clap::{ArgAction, Parser, error::ErrorKind};
use std::ffi::OsString;
use std::io::Read;

/// netplugin command line flags.
#[derive(Parser, Debug)]
#[command(
    name = "netplugin",
    long_about = "netplugin bootstraps the per-host container networking agent: it resolves the host network identity, selects the state store and drives the agent through its lifecycle.",
    about = "Per-host container networking agent",
    disable_version_flag = true,
    term_width = 100,
    after_help = "\
    EXAMPLES:
        netplugin --ctrl-ip=10.0.0.5 --vlan-if=eth1,eth2 --cluster-store=etcd://10.0.0.2:2379
        netplugin --plugin-mode=kubernetes --config=/etc/contiv/netplugin.toml
        cat netplugin.toml | netplugin --config=-"
)]
pub struct Cli {
    /// Debug log level, also exports CONTIV_TRACE=1
    #[arg(long)]
    debug: bool,

    /// Log to syslog: kernel, udp://host:port or tcp://host:port
    #[arg(long, default_value = "", value_name = "TARGET")]
    syslog: String,

    /// Format logs as JSON
    #[arg(long = "json-log")]
    json_log: bool,

    /// Label identifying endpoints homed on this host (defaults to the hostname)
    #[arg(long = "host-label", value_name = "LABEL")]
    host_label: Option<String>,

    /// Orchestrator integration mode
    #[arg(long = "plugin-mode", value_enum, value_name = "MODE")]
    plugin_mode: Option<PluginMode>,

    /// Plugin configuration file, '-' reads it from stdin
    #[arg(long, default_value = "", value_name = "PATH")]
    config: String,

    /// Tunnel endpoint IP (defaults to the control IP)
    #[arg(long = "vtep-ip", value_name = "IP")]
    vtep_ip: Option<String>,

    /// Control plane IP (defaults to a local address)
    #[arg(long = "ctrl-ip", value_name = "IP")]
    ctrl_ip: Option<String>,

    /// Uplink interface(s), comma separated, may be repeated
    #[arg(long = "vlan-if", action = ArgAction::Append, value_name = "IFACES")]
    vlan_if: Vec<String>,

    /// Print version information and exit
    #[arg(long)]
    version: bool,

    /// Distributed store URL
    #[arg(long = "cluster-store", value_name = "URL")]
    cluster_store: Option<String>,

    /// Extra state reconciliation attempts before giving up, 0 fails fast
    #[arg(long = "reconcile-retries", default_value_t = 0, value_name = "N")]
    reconcile_retries: u32,
}

/// Outcome of command line parsing.
#[derive(Debug)]
pub enum Invocation {
    /// `--help` was requested; print it and exit 0
    Help(clap::Error),
    /// Bootstrap with these options
    Run(Box<OperatorOptions>),
}

/// Parse the command line into [`OperatorOptions`].
///
/// `hostname` backs the host label default. `stdin` is only read when
/// `--config=-` is given. Neither the plugin configuration nor the syslog
/// target is looked at for `--version`.
pub fn parse_options<I, T, R>(
    args: I,
    hostname: Option<String>,
    stdin: R,
) -> Result<Invocation, BootstrapError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    R: Read,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => return Ok(Invocation::Help(e)),
        Err(e) => return Err(ConfigurationError::InvalidArguments(e.to_string()).into()),
    };

    // Nothing but the banner runs for --version, so the syslog target is
    // not validated either.
    let syslog = (!cli.version).then_some(cli.syslog.as_str());
    let logging = LoggingConfig::new(cli.debug, cli.json_log, syslog)?;

    let config_source = (!cli.config.is_empty()).then(|| ConfigSource::parse(&cli.config));
    let file = match &config_source {
        Some(source) if !cli.version => Some(PluginConfigFile::load(source, stdin)?),
        _ => None,
    };

    let values = CommandLineValues {
        host_label: cli.host_label,
        plugin_mode: cli.plugin_mode,
        control_ip: cli.ctrl_ip,
        tunnel_ip: cli.vtep_ip,
        vlan_if: cli.vlan_if,
        store_url: cli.cluster_store,
        show_version: cli.version,
        reconcile_retries: cli.reconcile_retries,
    };

    Ok(Invocation::Run(Box::new(OperatorOptions::merge(
        values,
        logging,
        config_source,
        file,
        hostname,
    ))))
}
