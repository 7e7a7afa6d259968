// Local crates
use crate::config::RuntimeConfig;

// External crates
use anyhow::Result;
use std::future::Future;

/// Long-running component that owns dataplane provisioning.
///
/// The lifecycle driver calls the three phases exactly once each, in
/// order, and never concurrently:
///
/// ```text
/// process_current_state -> post_init -> handle_events
/// ```
pub trait Agent: Send {
    /// Synchronize the in-memory model with whatever state already exists
    /// (prior endpoints, store contents). Blocks until done.
    fn process_current_state(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Post-initialization hooks: orchestrator registration, listeners.
    fn post_init(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Event-processing loop. Does not return under normal operation;
    /// `Ok` is a clean stop, `Err` an irrecoverable failure.
    fn handle_events(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Builds the agent from the assembled configuration.
pub trait AgentFactory {
    /// Agent produced by this factory.
    type Agent: Agent;

    /// Construct an agent. The configuration is borrowed; agents copy what
    /// they keep.
    fn new_agent(&self, config: &RuntimeConfig) -> Result<Self::Agent>;
}
