//! Agent contract and the built-in standalone agent.

pub mod models;
pub mod standalone;

pub use models::{Agent, AgentFactory};
pub use standalone::{StandaloneAgent, StandaloneAgentFactory};
