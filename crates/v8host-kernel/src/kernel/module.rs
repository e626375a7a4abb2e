//! Process-wide module entry point.
//!
//! Wires the process statics (threshold, sink registry, tracing bridge) to
//! the sequencer with the V8 backend. A process loads the module at most
//! once: any second call is refused, including after a failed first call,
//! because the native singletons cannot be re-initialized.

use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use tracing::error;
use v8host_core::{BootstrapConfig, BootstrapError, BootstrapResult, SeverityLevel};

use crate::adapters::engine::V8Engine;
use crate::diagnostics::{process_log_state, process_sinks, DiagnosticLayer, LogRecord, SinkRegistry};
use crate::kernel::bootstrap::{Bootstrapper, LoadedModule};

static MODULE_ENTERED: AtomicBool = AtomicBool::new(false);
static TRACING_BRIDGE: OnceLock<bool> = OnceLock::new();

/// Install the diagnostic layer over the process sink registry
///
/// Idempotent. Returns `false` when the embedder already set a global
/// subscriber; records then only reach sinks through that subscriber.
pub fn install_tracing_bridge() -> bool {
    *TRACING_BRIDGE.get_or_init(|| DiagnosticLayer::new(process_sinks()).try_init_global())
}

/// `true` once the entry point has been called in this process
pub fn module_entered() -> bool {
    MODULE_ENTERED.load(Ordering::Acquire)
}

fn enter_once() -> BootstrapResult<()> {
    if MODULE_ENTERED.swap(true, Ordering::AcqRel) {
        return Err(BootstrapError::AlreadyInitialized);
    }
    Ok(())
}

/// Load the module, configured from the environment
///
/// Without `V8HOST_DATA_DIR`, external data is expected next to the source
/// file of the caller.
#[track_caller]
pub fn init_module() -> BootstrapResult<LoadedModule<V8Engine>> {
    let caller = Location::caller();
    enter_once()?;
    install_tracing_bridge();
    let config = BootstrapConfig::from_env().map_err(|e| {
        error!("bootstrap failed reading configuration: {e}");
        BootstrapError::from(e)
    })?;
    bootstrap(&config, caller)
}

/// Load the module with loader-supplied configuration
#[track_caller]
pub fn init_module_with(config: &BootstrapConfig) -> BootstrapResult<LoadedModule<V8Engine>> {
    let caller = Location::caller();
    enter_once()?;
    bootstrap(config, caller)
}

fn bootstrap(config: &BootstrapConfig, caller: &Location<'_>) -> BootstrapResult<LoadedModule<V8Engine>> {
    let bridged = install_tracing_bridge();
    let state = process_log_state();
    let sinks = process_sinks();
    let result = Bootstrapper::new(&state, &sinks).run(config, V8Engine::new(), caller);
    if !bridged {
        report_unbridged(&sinks);
    }
    result
}

/// Tell the attached sinks that `tracing` events bypass them
///
/// Written straight through the registry, since the events cannot reach it.
/// Returns how many sinks emitted the notice.
fn report_unbridged(sinks: &SinkRegistry) -> usize {
    sinks.dispatch(&LogRecord::new(
        SeverityLevel::Warning,
        "diagnostics bridge not installed: another global tracing subscriber receives module events",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::diagnostics::{DiagnosticSink, DiagnosticState, SharedBuffer};

    #[test]
    fn unbridged_notice_goes_straight_to_sinks() {
        let sinks = SinkRegistry::new();
        let buffer = SharedBuffer::new();
        let state = Arc::new(DiagnosticState::new(SeverityLevel::Debug));
        sinks.attach(DiagnosticSink::builder(state).writer(buffer.clone()).build());

        // No subscriber is in scope, so only a direct dispatch can reach the sink.
        assert_eq!(report_unbridged(&sinks), 1);
        assert!(buffer.contents().contains("<WARNING> diagnostics bridge not installed"));
    }

    #[test]
    fn unbridged_notice_respects_threshold() {
        let sinks = SinkRegistry::new();
        let buffer = SharedBuffer::new();
        sinks.attach(DiagnosticSink::builder(Arc::new(DiagnosticState::default())).writer(buffer.clone()).build());

        assert_eq!(report_unbridged(&sinks), 0);
        assert!(buffer.contents().is_empty());
    }
}
