/// Package version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Commit the binary was built from, stamped by build.rs
pub const GIT_COMMIT: &str = env!("NETPLUGIN_GIT_COMMIT");
/// Build timestamp (RFC 3339), stamped by build.rs
pub const BUILD_TIME: &str = env!("NETPLUGIN_BUILD_TIME");

/// Version banner printed by `--version`.
#[must_use]
pub fn version_string() -> String {
    format!("Version: {VERSION}\nGitCommit: {GIT_COMMIT}\nBuildTime: {BUILD_TIME}\n")
}
