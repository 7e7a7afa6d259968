//! Agent lifecycle sequencing.
//!
//! ```text
//! Start -> Constructed -> StateReconciled -> PostInitialized -> EventLoopRunning -> Stopped
//! ```
//!
//! Linear, no re-entry. Each phase failure maps to its own
//! [`BootstrapError`] variant and no later phase runs.

// Local crates
use crate::{
    agent::{Agent, AgentFactory},
    config::RuntimeConfig,
    error::BootstrapError,
};

// External crates
use rand::Rng;
use std::{fmt, time::Duration};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// How the lifecycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// The event loop returned `Ok`
    Clean,
    /// A phase failed
    Error,
}

/// Phases an agent moves through, strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Nothing built yet
    Start,
    /// Agent constructed from the runtime configuration
    Constructed,
    /// Pre-existing state restored
    StateReconciled,
    /// Post-initialization hooks ran
    PostInitialized,
    /// Event loop entered
    EventLoopRunning,
    /// Terminal
    Stopped(StopKind),
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Constructed => "constructed",
            Self::StateReconciled => "state_reconciled",
            Self::PostInitialized => "post_initialized",
            Self::EventLoopRunning => "event_loop_running",
            Self::Stopped(StopKind::Clean) => "stopped_clean",
            Self::Stopped(StopKind::Error) => "stopped_error",
        };
        f.write_str(name)
    }
}

/// Retry policy for state reconciliation.
///
/// Policy:
/// - `max_retries == 0` fails on the first error.
/// - Start with `initial_delay`, multiply by `backoff_factor` after each
///   failed attempt, capping at `max_delay`.
/// - Each sleep is scaled by a random factor in `1 ± jitter`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePolicy {
    /// Attempts allowed after the first failure
    pub max_retries: u32,
    /// Sleep before the first retry
    pub initial_delay: Duration,
    /// Growth factor between retries
    pub backoff_factor: f64,
    /// Upper bound on a single sleep
    pub max_delay: Duration,
    /// Relative random spread applied to each sleep
    pub jitter: f64,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self::fail_fast()
    }
}

impl ReconcilePolicy {
    /// No retries, the first error is returned.
    #[must_use]
    pub fn fail_fast() -> Self {
        Self::with_retries(0)
    }

    /// Backoff policy used for `--reconcile-retries`.
    #[must_use]
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.2,
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return delay;
        }
        let factor: f64 = rand::rng().random_range(1.0 - self.jitter..1.0 + self.jitter);
        delay.mul_f64(factor)
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        delay.mul_f64(self.backoff_factor).min(self.max_delay)
    }
}

/// Builds the agent from a [`RuntimeConfig`] and drives it through its
/// phases.
#[derive(Debug)]
pub struct LifecycleDriver {
    config: RuntimeConfig,
    policy: ReconcilePolicy,
    phase: LifecyclePhase,
}

impl LifecycleDriver {
    /// Driver for `config`, not started.
    #[must_use]
    pub fn new(config: RuntimeConfig, policy: ReconcilePolicy) -> Self {
        Self {
            config,
            policy,
            phase: LifecyclePhase::Start,
        }
    }

    /// Phase reached so far.
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Configuration the agent is built from.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn transition(&mut self, next: LifecyclePhase) {
        info!(from = %self.phase, to = %next, "Lifecycle transition");
        self.phase = next;
    }

    /// Run the full lifecycle. Returns `Ok` only when the event loop stops
    /// cleanly.
    #[instrument(
        name = "netplugin_lifecycle::run",
        target = "runtime::lifecycle",
        level = "debug",
        skip_all
    )]
    pub async fn run<F: AgentFactory>(&mut self, factory: &F) -> Result<(), BootstrapError> {
        let result = self.drive(factory).await;
        let stop = match result {
            Ok(()) => StopKind::Clean,
            Err(_) => StopKind::Error,
        };
        self.transition(LifecyclePhase::Stopped(stop));
        result
    }

    async fn drive<F: AgentFactory>(&mut self, factory: &F) -> Result<(), BootstrapError> {
        let mut agent = factory
            .new_agent(&self.config)
            .map_err(BootstrapError::Construction)?;
        self.transition(LifecyclePhase::Constructed);

        self.reconcile(&mut agent).await?;
        self.transition(LifecyclePhase::StateReconciled);

        agent.post_init().await.map_err(BootstrapError::PostInit)?;
        self.transition(LifecyclePhase::PostInitialized);

        self.transition(LifecyclePhase::EventLoopRunning);
        agent.handle_events().await.map_err(BootstrapError::EventLoop)
    }

    #[instrument(
        name = "netplugin_lifecycle::reconcile",
        target = "runtime::lifecycle",
        level = "debug",
        skip_all
    )]
    async fn reconcile<A: Agent>(&self, agent: &mut A) -> Result<(), BootstrapError> {
        // u64 so that u32::MAX retries cannot overflow the counter
        let max_retries = u64::from(self.policy.max_retries);
        let mut attempts: u64 = 0;
        let mut delay = self.policy.initial_delay;

        loop {
            attempts += 1;
            debug!(attempt = attempts, "Processing current state");

            match agent.process_current_state().await {
                Ok(()) => return Ok(()),
                Err(e) if attempts > max_retries => {
                    return Err(BootstrapError::Reconciliation(e));
                }
                Err(e) => {
                    let sleep_duration = self.policy.jittered(delay);
                    warn!(
                        error = %format!("{e:#}"),
                        attempt = attempts,
                        retries_left = max_retries + 1 - attempts,
                        sleep_duration = ?sleep_duration,
                        "State reconciliation failed, retrying"
                    );
                    sleep(sleep_duration).await;
                    delay = self.policy.next_delay(delay);
                }
            }
        }
    }
}
