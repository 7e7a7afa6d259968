// Local crates
use crate::{
    agent::AgentFactory,
    config::{RuntimeConfig, assemble},
    error::BootstrapError,
    helpers::privilege::{PrivilegeProbe, ensure_privileged},
    identity::{AddressDiscovery, resolve},
    options::OperatorOptions,
    runtime::lifecycle::{LifecycleDriver, ReconcilePolicy},
    store::locate,
};

// External crates
use tracing::{debug, info, instrument, warn};

/// What `main` does after the preflight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    /// Print the version banner and exit 0
    ShowVersion,
    /// Privilege confirmed, continue with bootstrap
    Proceed,
}

/// Version short-circuit, then the privilege check. Nothing touches the
/// network or the store before this returns `Proceed`.
pub fn preflight<P>(opts: &OperatorOptions, probe: &P) -> Result<Preflight, BootstrapError>
where
    P: PrivilegeProbe + ?Sized,
{
    if opts.show_version {
        return Ok(Preflight::ShowVersion);
    }
    ensure_privileged(probe)?;
    Ok(Preflight::Proceed)
}

/// Resolve the host identity, locate the store and assemble the runtime
/// configuration, in that order.
#[instrument(
    name = "netplugin_bootstrap::assemble_config",
    target = "runtime::runtime",
    level = "debug",
    skip_all
)]
pub fn assemble_config<D>(
    opts: &OperatorOptions,
    discovery: &D,
) -> Result<RuntimeConfig, BootstrapError>
where
    D: AddressDiscovery + ?Sized,
{
    let identity = resolve(opts, || discovery.local_address())?;
    let store = locate(&opts.store_url)?;
    Ok(assemble(opts, identity, store))
}

/// Report where the host label came from. An empty fallback means the
/// hostname could not be read.
pub fn announce_host_label(opts: &OperatorOptions) {
    if !opts.host_label_defaulted {
        return;
    }
    if opts.host_label.is_empty() {
        warn!("host-label not specified and hostname unreadable, using an empty host label");
    } else {
        info!("host-label not specified, using default ({})", opts.host_label);
    }
}

/// Bootstrap after preflight: build the configuration and drive the agent
/// until its event loop stops.
#[instrument(
    name = "netplugin_bootstrap::run",
    target = "runtime::runtime",
    level = "info",
    skip_all
)]
pub async fn run_netplugin<D, F>(
    opts: &OperatorOptions,
    discovery: &D,
    factory: &F,
) -> Result<(), BootstrapError>
where
    D: AddressDiscovery + ?Sized,
    F: AgentFactory,
{
    announce_host_label(opts);
    if let Some(source) = &opts.config_source {
        info!(origin = %source.origin(), "Plugin configuration loaded");
    }

    let config = assemble_config(opts, discovery)?;
    match serde_json::to_string(&config) {
        Ok(json) => debug!(config = %json, "Runtime configuration assembled"),
        Err(e) => debug!(error = %e, "Runtime configuration could not be rendered"),
    }
    info!(
        network_driver = %config.drivers().network,
        state_driver = %config.drivers().state,
        plugin_mode = %config.instance().plugin_mode,
        "Starting netplugin"
    );

    let policy = ReconcilePolicy::with_retries(opts.reconcile_retries);
    let mut driver = LifecycleDriver::new(config, policy);
    driver.run(factory).await?;

    info!("netplugin stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CommandLineValues, LoggingConfig};
    use anyhow::{Result, anyhow};
    use std::cell::Cell;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    struct CountingProbe {
        user: &'static str,
        calls: Cell<u32>,
    }

    impl PrivilegeProbe for CountingProbe {
        fn effective_user(&self) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.user.to_string())
        }
    }

    struct FixedAddress(Option<&'static str>);

    impl AddressDiscovery for FixedAddress {
        fn local_address(&self) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| anyhow!("no usable interface address"))
        }
    }

    fn options(cli: CommandLineValues) -> OperatorOptions {
        OperatorOptions::merge(
            cli,
            LoggingConfig::default(),
            None,
            None,
            Some("node-1".to_string()),
        )
    }

    #[test]
    fn version_skips_privilege_check() {
        let probe = CountingProbe {
            user: "nobody",
            calls: Cell::new(0),
        };
        let opts = options(CommandLineValues {
            show_version: true,
            ..Default::default()
        });

        assert_eq!(preflight(&opts, &probe).unwrap(), Preflight::ShowVersion);
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn non_root_is_rejected() {
        let probe = CountingProbe {
            user: "nobody",
            calls: Cell::new(0),
        };
        let err = preflight(&options(CommandLineValues::default()), &probe).unwrap_err();
        assert_eq!(err.phase(), "privilege_check");
    }

    #[test]
    fn discovered_address_fills_both_ips() {
        let opts = options(CommandLineValues::default());
        let cfg = assemble_config(&opts, &FixedAddress(Some("192.168.1.20"))).unwrap();
        assert_eq!(cfg.instance().control_ip, "192.168.1.20");
        assert_eq!(cfg.instance().tunnel_ip, "192.168.1.20");
        assert_eq!(cfg.drivers().state, "etcd");
    }

    #[test]
    fn identity_failure_precedes_store_validation() {
        let opts = options(CommandLineValues {
            store_url: Some("badurl".to_string()),
            ..Default::default()
        });
        let err = assemble_config(&opts, &FixedAddress(None)).unwrap_err();
        assert!(matches!(err, BootstrapError::IdentityResolution(_)));
    }

    #[test]
    fn malformed_store_url_is_a_configuration_error() {
        let opts = options(CommandLineValues {
            control_ip: Some("10.0.0.5".to_string()),
            store_url: Some("badurl".to_string()),
            ..Default::default()
        });
        let err = assemble_config(&opts, &FixedAddress(None)).unwrap_err();
        assert_eq!(err.phase(), "configuration");
    }

    /// In-memory log sink.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logged_by(opts: &OperatorOptions) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || announce_host_label(opts));
        String::from_utf8(captured.0.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn unreadable_hostname_is_warned_about() {
        let opts = OperatorOptions::merge(
            CommandLineValues::default(),
            LoggingConfig::default(),
            None,
            None,
            None,
        );
        let out = logged_by(&opts);
        assert!(out.contains("WARN"), "{out}");
        assert!(out.contains("hostname unreadable"), "{out}");
    }

    #[test]
    fn hostname_fallback_is_informational() {
        let out = logged_by(&options(CommandLineValues::default()));
        assert!(out.contains("INFO"), "{out}");
        assert!(out.contains("using default (node-1)"), "{out}");
        assert!(!out.contains("WARN"), "{out}");
    }

    #[test]
    fn explicit_label_is_not_announced() {
        let opts = options(CommandLineValues {
            host_label: Some("rack-4".to_string()),
            ..Default::default()
        });
        assert!(logged_by(&opts).is_empty());
    }
}
