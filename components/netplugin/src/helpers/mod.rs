//! Process-level helpers: plugin configuration loading, privilege check,
//! shutdown signalling and version information.

pub mod load_config;
pub mod privilege;
pub mod shutdown;
pub mod version;
