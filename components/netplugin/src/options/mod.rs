//! Option model: typed operator settings assembled from the command line,
//! the optional plugin configuration and built-in defaults.

pub mod logging;
pub mod options;
pub mod uplinks;

pub use logging::{LoggingConfig, SyslogTarget};
pub use options::{CommandLineValues, DEFAULT_STORE_URL, OperatorOptions, PluginMode};
pub use uplinks::UplinkInterfaces;
