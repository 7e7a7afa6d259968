// External crates
use std::sync::Arc;
use tokio::sync::watch;
use tracing::instrument;

/// Process-wide shutdown notifier, built on top of a watch channel
///
/// - Every task that needs to stop holds a clone.
/// - Calling `.trigger()` latches the flag and wakes every waiter.
/// - A waiter that arrives after `.trigger()` returns immediately.
#[derive(Debug, Clone)]
pub struct Shutdown {
    fired: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    /// Creates a new, untriggered shutdown notifier.
    #[instrument(
        name = "netplugin_shutdown_channel",
        target = "helpers::shutdown",
        level = "trace"
    )]
    #[must_use]
    pub fn new() -> Self {
        tracing::trace!("Creating new shutdown channel");
        let (fired, _) = watch::channel(false);
        Self {
            fired: Arc::new(fired),
        }
    }

    /// Trigger shutdown, waking all waiters
    #[instrument(
        name = "netplugin_shutdown_trigger",
        target = "helpers::shutdown",
        level = "trace"
    )]
    pub fn trigger(&self) {
        tracing::trace!("Shutdown triggered, notifying waiters");
        self.fired.send_replace(true);
    }

    /// Whether `.trigger()` has been called.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.fired.borrow()
    }

    /// Wait until `.trigger()` has been called, returning immediately if it
    /// already was.
    #[instrument(
        name = "netplugin_shutdown_waiter",
        target = "helpers::shutdown",
        level = "trace"
    )]
    pub async fn wait_for_shutdown(&self) {
        tracing::trace!("Waiting for shutdown signal");
        let mut fired = self.fired.subscribe();
        let _ = fired.wait_for(|triggered| *triggered).await;
        tracing::trace!("Shutdown signal received");
    }
}
