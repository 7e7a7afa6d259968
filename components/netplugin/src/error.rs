//! Bootstrap error types.
//!
//! Every failure the controller can hit before or while the agent runs is
//! one of these. They are propagated with `?` up to `main`, which logs a
//! single diagnostic line and exits.

use thiserror::Error;

/// Operator input that cannot be turned into a runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Unknown flag or malformed flag value
    #[error("failed to parse command: {0}")]
    InvalidArguments(String),

    /// Store URL without a `scheme://` prefix
    #[error("invalid cluster-store url {0}")]
    InvalidStoreUrl(String),

    /// Syslog target that is neither `kernel` nor `udp|tcp://host:port`
    #[error("could not parse syslog spec {target}: {reason}")]
    InvalidSyslogTarget {
        /// Value given to `--syslog`
        target: String,
        /// Why it was rejected
        reason: String,
    },

    /// Syslog target parsed fine but nothing answered
    #[error("could not connect to syslog at {target}: {source}")]
    SyslogUnavailable {
        /// Value given to `--syslog`
        target: String,
        /// Socket error
        source: std::io::Error,
    },

    /// Plugin configuration could not be read
    #[error("failed to read plugin configuration from {origin}: {source}")]
    ConfigRead {
        /// File path or `<stdin>`
        origin: String,
        /// Read error
        source: std::io::Error,
    },

    /// Plugin configuration is not valid TOML for the expected schema
    #[error("failed to parse plugin configuration from {origin}: {source}")]
    ConfigParse {
        /// File path or `<stdin>`
        origin: String,
        /// Decoder error
        source: toml::de::Error,
    },

    /// Plugin configuration without the mandatory `host-label` key
    #[error("host-label must be specified in the plugin configuration passed via {0}")]
    MissingHostLabel(String),
}

/// Fatal bootstrap failure, one variant per phase.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Flags, store URL, syslog or plugin configuration rejected
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Not running with root privilege
    #[error("this process can only be run as root: {0}")]
    Privilege(String),

    /// Control IP not supplied and local address discovery failed
    #[error("error getting local address: {0:#}")]
    IdentityResolution(anyhow::Error),

    /// Agent could not be built from the runtime configuration
    #[error("failed to create agent: {0:#}")]
    Construction(anyhow::Error),

    /// Agent could not synchronize with existing state
    #[error("failed to process current state: {0:#}")]
    Reconciliation(anyhow::Error),

    /// Post-initialization hooks failed
    #[error("post initialization failed: {0:#}")]
    PostInit(anyhow::Error),

    /// Event loop ended with an error
    #[error("netplugin exiting due to error: {0:#}")]
    EventLoop(anyhow::Error),

    /// Async runtime could not be started
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl BootstrapError {
    /// Phase name carried on the fatal diagnostic line.
    #[must_use]
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Privilege(_) => "privilege_check",
            Self::IdentityResolution(_) => "identity_resolution",
            Self::Construction(_) => "agent_construction",
            Self::Reconciliation(_) => "state_reconciliation",
            Self::PostInit(_) => "post_init",
            Self::EventLoop(_) => "event_loop",
            Self::Runtime(_) => "runtime",
        }
    }

    /// Process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_names_follow_lifecycle() {
        let err = BootstrapError::Reconciliation(anyhow::anyhow!("store unreachable"));
        assert_eq!(err.phase(), "state_reconciliation");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "failed to process current state: store unreachable"
        );
    }

    #[test]
    fn configuration_errors_are_transparent() {
        let err: BootstrapError =
            ConfigurationError::InvalidStoreUrl("badurl".to_string()).into();
        assert_eq!(err.phase(), "configuration");
        assert_eq!(err.to_string(), "invalid cluster-store url badurl");
    }
}
