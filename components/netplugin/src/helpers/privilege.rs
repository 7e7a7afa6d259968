// Local crates
use crate::error::BootstrapError;

// External crates
use anyhow::{Context, Result, anyhow};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind, Users};
use tracing::instrument;

/// Name of the only account allowed to run the daemon.
pub const REQUIRED_USER: &str = "root";

/// Reports which account the process is running as.
pub trait PrivilegeProbe {
    /// Name of the effective user of this process.
    fn effective_user(&self) -> Result<String>;
}

/// [`PrivilegeProbe`] backed by the host process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPrivilegeProbe;

impl PrivilegeProbe for HostPrivilegeProbe {
    #[instrument(
        name = "privilege_probe::effective_user",
        target = "helpers::privilege",
        level = "trace",
        skip_all
    )]
    fn effective_user(&self) -> Result<String> {
        let pid = sysinfo::get_current_pid().map_err(|e| anyhow!(e))?;

        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            false,
            ProcessRefreshKind::nothing().with_user(UpdateKind::Always),
        );

        let process = system
            .process(pid)
            .with_context(|| format!("process {pid} not found in process table"))?;
        let uid = process
            .effective_user_id()
            .or_else(|| process.user_id())
            .context("effective user id unavailable")?;

        let users = Users::new_with_refreshed_list();
        let user = users
            .get_user_by_id(uid)
            .with_context(|| format!("no account for uid {uid:?}"))?;

        tracing::trace!(user = user.name(), "Resolved effective user");
        Ok(user.name().to_string())
    }
}

/// Fail unless the probe reports the required account.
pub fn ensure_privileged<P: PrivilegeProbe + ?Sized>(probe: &P) -> Result<(), BootstrapError> {
    match probe.effective_user() {
        Ok(user) if user == REQUIRED_USER => Ok(()),
        Ok(user) => Err(BootstrapError::Privilege(format!("running as '{user}'"))),
        Err(e) => Err(BootstrapError::Privilege(format!("{e:#}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedUser(Option<&'static str>);

    impl PrivilegeProbe for FixedUser {
        fn effective_user(&self) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| anyhow!("user lookup failed"))
        }
    }

    #[test]
    fn root_is_accepted() {
        assert!(ensure_privileged(&FixedUser(Some("root"))).is_ok());
    }

    #[test]
    fn other_users_are_rejected() {
        let err = ensure_privileged(&FixedUser(Some("nobody"))).unwrap_err();
        assert!(matches!(err, BootstrapError::Privilege(ref msg) if msg.contains("nobody")));
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn lookup_failure_is_treated_as_unprivileged() {
        let err = ensure_privileged(&FixedUser(None)).unwrap_err();
        assert!(matches!(err, BootstrapError::Privilege(_)));
    }
}
