//! Host network discovery used when the operator leaves the control IP or
//! host label unset.
//!
//! Address selection follows the usual single-NIC assumption:
//! - resolve this host's name; if one of its IPv4 addresses is configured on
//!   a local interface, that address is the host's identity;
//! - otherwise take the first usable IPv4 address found on the interfaces,
//!   visiting interfaces in name order so the choice is stable across runs.
//!
//! Loopback, link-local and unspecified addresses are never selected.

// External crates
use anyhow::{Result, bail};
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use sysinfo::{Networks, System};
use tracing::instrument;

/// Source of the host's local address.
pub trait AddressDiscovery {
    /// A routable local address, as a string.
    fn local_address(&self) -> Result<String>;
}

/// [`AddressDiscovery`] backed by the host's interfaces and resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostAddressDiscovery;

impl AddressDiscovery for HostAddressDiscovery {
    #[instrument(
        name = "identity_discovery::local_address",
        target = "identity::discovery",
        level = "debug",
        skip_all
    )]
    fn local_address(&self) -> Result<String> {
        let interface_addrs = interface_addresses();
        let hostname_addrs = hostname().map(|h| resolve_host(&h)).unwrap_or_default();

        tracing::debug!(
            interface_addrs = ?interface_addrs,
            hostname_addrs = ?hostname_addrs,
            "Selecting local address"
        );

        match select_local_address(&hostname_addrs, &interface_addrs) {
            Some(addr) => Ok(addr.to_string()),
            None => bail!("no usable IPv4 address found on any local interface"),
        }
    }
}

/// This host's name, if the OS reports one.
#[must_use]
pub fn hostname() -> Option<String> {
    System::host_name().filter(|h| !h.is_empty())
}

fn usable(addr: &Ipv4Addr) -> bool {
    !addr.is_loopback() && !addr.is_link_local() && !addr.is_unspecified()
}

/// Pick the host's address: a hostname address that is configured locally
/// wins, otherwise the first usable interface address.
#[must_use]
pub fn select_local_address(
    hostname_addrs: &[IpAddr],
    interface_addrs: &[IpAddr],
) -> Option<Ipv4Addr> {
    let local_v4 = || {
        interface_addrs.iter().filter_map(|addr| match addr {
            IpAddr::V4(v4) if usable(v4) => Some(*v4),
            _ => None,
        })
    };

    hostname_addrs
        .iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) if usable(v4) => Some(*v4),
            _ => None,
        })
        .find(|candidate| local_v4().any(|local| local == *candidate))
        .or_else(|| local_v4().next())
}

fn interface_addresses() -> Vec<IpAddr> {
    let networks = Networks::new_with_refreshed_list();

    let mut names: Vec<&String> = networks.list().keys().collect();
    names.sort();

    names
        .into_iter()
        .filter_map(|name| networks.list().get(name))
        .flat_map(|data| data.ip_networks().iter().map(|net| net.addr))
        .collect()
}

fn resolve_host(host: &str) -> Vec<IpAddr> {
    match (host, 0).to_socket_addrs() {
        Ok(addrs) => addrs.map(|sa| sa.ip()).collect(),
        Err(e) => {
            tracing::debug!(hostname = host, error = %e, "Hostname did not resolve");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn hostname_address_that_is_local_wins() {
        let hostname_addrs = [ip("10.0.0.9")];
        let interfaces = [ip("127.0.0.1"), ip("192.168.1.4"), ip("10.0.0.9")];
        assert_eq!(
            select_local_address(&hostname_addrs, &interfaces),
            Some("10.0.0.9".parse().unwrap())
        );
    }

    #[test]
    fn non_local_hostname_address_falls_back_to_interfaces() {
        let hostname_addrs = [ip("127.0.1.1"), ip("172.16.0.1")];
        let interfaces = [ip("127.0.0.1"), ip("fe80::1"), ip("169.254.3.3"), ip("192.168.1.4")];
        assert_eq!(
            select_local_address(&hostname_addrs, &interfaces),
            Some("192.168.1.4".parse().unwrap())
        );
    }

    #[test]
    fn loopback_only_host_has_no_address() {
        let interfaces = [ip("127.0.0.1"), ip("::1")];
        assert_eq!(select_local_address(&[ip("127.0.0.1")], &interfaces), None);
        assert_eq!(select_local_address(&[], &[]), None);
    }
}
