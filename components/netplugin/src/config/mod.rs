//! Runtime configuration assembly.

pub mod runtime_config;

pub use runtime_config::{DriverSelectors, InstanceInfo, NETWORK_DRIVER, RuntimeConfig, assemble};
