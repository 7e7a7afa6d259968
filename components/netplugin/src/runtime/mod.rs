//! Bootstrap sequencing and the agent lifecycle.

pub mod lifecycle;
pub mod runtime;

pub use lifecycle::{LifecycleDriver, LifecyclePhase, ReconcilePolicy, StopKind};
pub use runtime::{Preflight, announce_host_label, assemble_config, preflight, run_netplugin};
