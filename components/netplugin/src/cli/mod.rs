//! Command line surface.

pub mod cli;

pub use cli::{Cli, Invocation, parse_options};
