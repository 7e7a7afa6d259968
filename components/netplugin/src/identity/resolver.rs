// Local crates
use crate::{error::BootstrapError, options::OperatorOptions};

// External crates
use anyhow::{Result, anyhow};
use serde::Serialize;
use tracing::instrument;

/// Control-plane and tunnel-endpoint addresses of this host.
///
/// Neither is validated as routable here; the network driver owns that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    /// Never empty once resolved
    pub control_ip: String,
    /// Equal to `control_ip` unless overridden
    pub tunnel_ip: String,
}

/// Resolve the host identity from the operator options.
///
/// `discover` is only called when no control IP was supplied, and its
/// failure is fatal. The tunnel endpoint defaults to the control IP.
#[instrument(
    name = "identity_resolver::resolve",
    target = "identity::resolver",
    level = "debug",
    skip_all
)]
pub fn resolve<F>(opts: &OperatorOptions, discover: F) -> Result<ResolvedIdentity, BootstrapError>
where
    F: FnOnce() -> Result<String>,
{
    let control_ip = match opts.control_ip.as_deref() {
        Some(ip) if !ip.is_empty() => ip.to_string(),
        _ => {
            let discovered = discover().map_err(BootstrapError::IdentityResolution)?;
            if discovered.is_empty() {
                return Err(BootstrapError::IdentityResolution(anyhow!(
                    "local address discovery returned an empty address"
                )));
            }
            tracing::info!(control_ip = %discovered, "ctrl-ip not specified, using local address");
            discovered
        }
    };

    let tunnel_ip = match opts.tunnel_ip.as_deref() {
        Some(ip) if !ip.is_empty() => ip.to_string(),
        _ => control_ip.clone(),
    };

    tracing::debug!(%control_ip, %tunnel_ip, "Resolved host network identity");
    Ok(ResolvedIdentity {
        control_ip,
        tunnel_ip,
    })
}
