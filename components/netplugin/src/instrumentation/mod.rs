//! Logging setup: tracing subscriber, syslog sink, panic hook.

pub mod syslog;
pub mod tracing;

pub use self::syslog::SyslogWriter;
pub use self::tracing::{
    TRACE_ENV, export_trace_flag, init_fallback, init_panic_handler, init_tracing,
};
