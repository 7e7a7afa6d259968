//! Bootstrap and lifecycle controller for the netplugin host daemon.
//!
//! Startup runs strictly in order:
//!
//! ```text
//! options -> privilege check -> identity -> store locator -> runtime config -> agent lifecycle
//! ```
//!
//! Every step returns a [`error::BootstrapError`] on failure, which `main`
//! reports once before exiting non-zero.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod helpers;
pub mod identity;
pub mod instrumentation;
pub mod options;
pub mod runtime;
pub mod store;
