//! Agent used when no dataplane agent is linked in.
//!
//! It validates the driver selection, has no prior state to restore, and
//! idles in its event loop until SIGINT or SIGTERM arrives, which ends the
//! loop cleanly. Dataplane agents replace it through [`AgentFactory`].

// Local crates
use crate::{
    agent::models::{Agent, AgentFactory},
    config::{InstanceInfo, NETWORK_DRIVER, RuntimeConfig},
    helpers::shutdown::Shutdown,
};

// External crates
use anyhow::{Result, bail};
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tracing::{info, instrument};

/// State drivers the daemon knows how to talk to.
pub const SUPPORTED_STATE_DRIVERS: [&str; 2] = ["etcd", "consul"];

/// Builds [`StandaloneAgent`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandaloneAgentFactory;

impl AgentFactory for StandaloneAgentFactory {
    type Agent = StandaloneAgent;

    fn new_agent(&self, config: &RuntimeConfig) -> Result<StandaloneAgent> {
        let drivers = config.drivers();
        if drivers.network != NETWORK_DRIVER {
            bail!("unsupported network driver '{}'", drivers.network);
        }
        if !SUPPORTED_STATE_DRIVERS.contains(&drivers.state.as_str()) {
            bail!(
                "unsupported state driver '{}', expected one of {:?}",
                drivers.state,
                SUPPORTED_STATE_DRIVERS
            );
        }

        Ok(StandaloneAgent {
            instance: config.instance().clone(),
            shutdown: Shutdown::new(),
            signal_listener: None,
        })
    }
}

/// Idle agent that only waits for a termination signal.
#[derive(Debug)]
pub struct StandaloneAgent {
    instance: InstanceInfo,
    shutdown: Shutdown,
    signal_listener: Option<JoinHandle<()>>,
}

impl StandaloneAgent {
    /// Handle that ends the event loop when triggered.
    #[must_use]
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }
}

impl Agent for StandaloneAgent {
    #[instrument(
        name = "standalone_agent::process_current_state",
        target = "agent::standalone",
        level = "debug",
        skip_all
    )]
    async fn process_current_state(&mut self) -> Result<()> {
        info!(
            host_label = %self.instance.host_label,
            control_ip = %self.instance.control_ip,
            tunnel_ip = %self.instance.tunnel_ip,
            uplinks = %self.instance.uplink_interfaces,
            "No dataplane state to restore"
        );
        Ok(())
    }

    #[instrument(
        name = "standalone_agent::post_init",
        target = "agent::standalone",
        level = "debug",
        skip_all
    )]
    async fn post_init(&mut self) -> Result<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let shutdown = self.shutdown.clone();

        self.signal_listener = Some(tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
                _ = sigint.recv() => info!("SIGINT received, shutting down"),
            }
            shutdown.trigger();
        }));

        info!(plugin_mode = %self.instance.plugin_mode, "Signal handlers installed");
        Ok(())
    }

    #[instrument(
        name = "standalone_agent::handle_events",
        target = "agent::standalone",
        level = "debug",
        skip_all
    )]
    async fn handle_events(&mut self) -> Result<()> {
        self.shutdown.wait_for_shutdown().await;
        if let Some(listener) = self.signal_listener.take() {
            listener.abort();
        }
        info!("Event loop stopped");
        Ok(())
    }
}
