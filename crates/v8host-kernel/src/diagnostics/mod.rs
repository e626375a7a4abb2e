//! Diagnostic logging subsystem
//!
//! - **state**: process-wide severity threshold
//! - **record**: log records and the line format
//! - **sink**: filtering/formatting sinks and the append-only registry
//! - **layer**: `tracing` bridge feeding the registry

pub mod layer;
pub mod record;
pub mod sink;
pub mod state;

use std::sync::Arc;

use v8host_core::BootstrapResult;

pub use layer::{execution_unit_span, DiagnosticLayer, FATAL_FIELD};
pub use record::{format_record, LogRecord, TIMESTAMP_FORMAT};
pub use sink::{process_sinks, DiagnosticSink, SharedBuffer, SinkRegistry, SinkTarget, PROCESS_SINKS};
pub use state::{process_log_state, DiagnosticState, PROCESS_LOG_STATE};

/// Set the threshold from configured text, then build and attach one sink.
///
/// The threshold is applied before the sink exists; on a configuration
/// error nothing is attached.
pub fn configure_diagnostics(
    state: &Arc<DiagnosticState>,
    sinks: &SinkRegistry,
    level_text: Option<&str>,
    target: SinkTarget,
) -> BootstrapResult<Arc<DiagnosticSink>> {
    state.configure(level_text)?;
    let sink = DiagnosticSink::builder(Arc::clone(state)).target(target).build();
    Ok(sinks.attach(sink))
}
