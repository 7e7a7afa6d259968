// Local crates
use crate::{
    error::ConfigurationError, instrumentation::syslog::SyslogWriter, options::LoggingConfig,
};

// External crates
use std::panic;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*, registry::Registry};

/// Environment variable collaborators read to enable their own tracing.
pub const TRACE_ENV: &str = "CONTIV_TRACE";

/// Install the global subscriber described by `cfg`.
///
/// `RUST_LOG` overrides the level chosen by `--debug`. Records go to stderr
/// through a non-blocking writer, and to syslog when a target was given.
/// Keep the returned guard alive for the life of the process or buffered
/// records are lost.
pub fn init_tracing(cfg: &LoggingConfig) -> Result<WorkerGuard, ConfigurationError> {
    let syslog_writer = cfg.syslog.as_ref().map(SyslogWriter::connect).transpose()?;

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.default_directive()));

    let fmt_layer = (!cfg.json).then(|| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking_writer.clone())
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    });

    let json_layer = cfg.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(non_blocking_writer.clone())
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    });

    let syslog_layer = syslog_writer.map(|writer| {
        fmt::layer()
            .with_ansi(false)
            .without_time()
            .with_level(false)
            .with_target(false)
            .with_writer(writer)
    });

    let error_layer = ErrorLayer::default();

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt_layer)
        .with(json_layer)
        .with(syslog_layer)
        .with(error_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        tracing::warn!(error = %e, "Global tracing subscriber already installed, keeping it");
    }

    Ok(guard)
}

/// Plain stderr subscriber for failures that happen before
/// [`init_tracing`] ran. Does nothing if a subscriber is already set.
pub fn init_fallback() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

/// Route panics into the log sink.
pub fn init_panic_handler() {
    panic::set_hook(Box::new(|panic_info| {
        let msg = match panic_info.payload().downcast_ref::<&str>() {
            Some(s) => (*s).to_string(),
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.clone(),
                None => "Unknown panic".to_string(),
            },
        };

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        error!(
            message = %msg,
            location = %location,
            "netplugin panicked"
        );
    }));
}

/// Export [`TRACE_ENV`]`=1` when debug logging was requested.
///
/// # Safety
///
/// Mutates the process environment. Must be called while the process is
/// still single threaded, before the async runtime is built.
#[allow(unsafe_code)]
pub unsafe fn export_trace_flag(cfg: &LoggingConfig) {
    if cfg.debug {
        // SAFETY: guaranteed by the caller, no other thread reads the
        // environment concurrently.
        unsafe { std::env::set_var(TRACE_ENV, "1") };
    }
}
