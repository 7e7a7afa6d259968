//! Host network identity: control-plane and tunnel-endpoint addresses.

pub mod discovery;
pub mod resolver;

pub use discovery::{AddressDiscovery, HostAddressDiscovery};
pub use resolver::{ResolvedIdentity, resolve};
