// Local crates
use crate::{
    identity::ResolvedIdentity,
    options::{OperatorOptions, PluginMode, UplinkInterfaces},
    store::StoreSelector,
};

// External crates
use serde::Serialize;

/// The only network driver this daemon programs.
pub const NETWORK_DRIVER: &str = "ovs";

/// Driver names the agent instantiates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverSelectors {
    /// Dataplane driver, always [`NETWORK_DRIVER`]
    pub network: String,
    /// State driver, the store URL scheme
    pub state: String,
}

/// Per-host instance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    /// Label identifying endpoints homed on this host
    pub host_label: String,
    /// Control-plane address
    pub control_ip: String,
    /// Tunnel-endpoint (VTEP) address
    pub tunnel_ip: String,
    /// Uplink interfaces in configuration order
    pub uplink_interfaces: UplinkInterfaces,
    /// Distributed store URL
    pub store_url: String,
    /// Orchestrator integration mode
    pub plugin_mode: PluginMode,
}

/// Validated, immutable configuration the agent is built from.
///
/// Fields are private; there is no way to change a value once assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeConfig {
    drivers: DriverSelectors,
    instance: InstanceInfo,
}

impl RuntimeConfig {
    /// Driver selection.
    #[must_use]
    pub fn drivers(&self) -> &DriverSelectors {
        &self.drivers
    }

    /// Per-host settings.
    #[must_use]
    pub fn instance(&self) -> &InstanceInfo {
        &self.instance
    }
}

/// Merge validated inputs into the runtime configuration. Pure, cannot fail.
#[must_use]
pub fn assemble(
    opts: &OperatorOptions,
    identity: ResolvedIdentity,
    store: StoreSelector,
) -> RuntimeConfig {
    RuntimeConfig {
        drivers: DriverSelectors {
            network: NETWORK_DRIVER.to_string(),
            state: store.scheme,
        },
        instance: InstanceInfo {
            host_label: opts.host_label.clone(),
            control_ip: identity.control_ip,
            tunnel_ip: identity.tunnel_ip,
            uplink_interfaces: opts.uplink_interfaces.clone(),
            store_url: store.raw_url,
            plugin_mode: opts.plugin_mode,
        },
    }
}
