// Local crates
use crate::error::ConfigurationError;

// External crates
use std::fmt;

/// Where log records are additionally shipped besides stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyslogTarget {
    /// Local syslog daemon socket
    Kernel,
    /// Remote syslog over UDP, `host:port`
    Udp(String),
    /// Remote syslog over TCP, `host:port`
    Tcp(String),
}

impl SyslogTarget {
    /// Parse a `--syslog` value: `kernel` or `proto://host:port` with
    /// `proto` one of `udp`, `tcp`.
    pub fn parse(spec: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidSyslogTarget {
            target: spec.to_string(),
            reason: reason.to_string(),
        };

        if spec == "kernel" {
            return Ok(Self::Kernel);
        }

        let (scheme, rest) = spec
            .split_once("://")
            .ok_or_else(|| invalid("expected 'kernel' or proto://host:port"))?;

        let host = rest.split('/').next().unwrap_or_default();
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        match scheme {
            "udp" => Ok(Self::Udp(host.to_string())),
            "tcp" => Ok(Self::Tcp(host.to_string())),
            other => Err(invalid(&format!("unsupported transport '{other}'"))),
        }
    }
}

impl fmt::Display for SyslogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kernel => write!(f, "kernel"),
            Self::Udp(addr) => write!(f, "udp://{addr}"),
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

/// Log sink settings, produced once from the command line and applied by
/// [`crate::instrumentation::tracing::init_tracing`] at the start of `main`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Debug verbosity and the trace flag for collaborators
    pub debug: bool,
    /// JSON records instead of text
    pub json: bool,
    /// Optional syslog sink
    pub syslog: Option<SyslogTarget>,
}

impl LoggingConfig {
    /// Build from raw flag values. An empty syslog value means no syslog.
    pub fn new(debug: bool, json: bool, syslog: Option<&str>) -> Result<Self, ConfigurationError> {
        let syslog = match syslog {
            Some(spec) if !spec.is_empty() => Some(SyslogTarget::parse(spec)?),
            _ => None,
        };
        Ok(Self {
            debug,
            json,
            syslog,
        })
    }

    /// Default filter directive when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_directive(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}
