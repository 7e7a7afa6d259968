//! netplugin daemon entry point.

use netplugin::{
    agent::StandaloneAgentFactory,
    cli::{Invocation, parse_options},
    error::BootstrapError,
    helpers::{privilege::HostPrivilegeProbe, version::version_string},
    identity::{HostAddressDiscovery, discovery::hostname},
    instrumentation::{export_trace_flag, init_fallback, init_panic_handler, init_tracing},
    options::OperatorOptions,
    runtime::{Preflight, preflight, run_netplugin},
};

use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let opts = match parse_options(std::env::args_os(), hostname(), std::io::stdin()) {
        Ok(Invocation::Run(opts)) => opts,
        Ok(Invocation::Help(help)) => {
            let _ = help.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => return fatal(&e, false),
    };

    match preflight(&opts, &HostPrivilegeProbe) {
        Ok(Preflight::ShowVersion) => {
            print!("{}", version_string());
            return ExitCode::SUCCESS;
        }
        Ok(Preflight::Proceed) => {}
        Err(e) => return fatal(&e, false),
    }

    bootstrap(&opts)
}

#[allow(unsafe_code)]
fn bootstrap(opts: &OperatorOptions) -> ExitCode {
    // SAFETY: no runtime or logging worker exists yet, the process is
    // single threaded.
    unsafe { export_trace_flag(&opts.logging) };

    let _guard = match init_tracing(&opts.logging) {
        Ok(guard) => guard,
        Err(e) => return fatal(&BootstrapError::from(e), false),
    };
    init_panic_handler();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => return fatal(&BootstrapError::Runtime(e), true),
    };

    let result = runtime.block_on(run_netplugin(
        opts,
        &HostAddressDiscovery,
        &StandaloneAgentFactory,
    ));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fatal(&e, true),
    }
}

/// Single exit path for every failure.
fn fatal(err: &BootstrapError, logging_ready: bool) -> ExitCode {
    if !logging_ready {
        init_fallback();
    }
    error!(phase = err.phase(), error = %err, "netplugin bootstrap failed");
    ExitCode::from(err.exit_code())
}
