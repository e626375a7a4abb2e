//! Process-wide diagnostic threshold.
//!
//! Written once during module initialization, before any sink is attached,
//! then only read. Every emission compares against the live value, so a
//! threshold change retroactively affects all attached sinks.
//!
//! The atomic cell makes individual reads and writes well-defined, but it does
//! not order a write against records already in flight. A future multi-writer
//! scenario needs real synchronization (or a snapshot captured per sink).

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, LazyLock};

use v8host_core::{parse_severity, BootstrapResult, SeverityLevel};

/// Shared severity threshold
#[derive(Debug)]
pub struct DiagnosticState {
    threshold: AtomicU8,
}

/// The threshold read by every emission in the process
pub static PROCESS_LOG_STATE: LazyLock<Arc<DiagnosticState>> =
    LazyLock::new(|| Arc::new(DiagnosticState::default()));

/// Shared handle to the process-wide threshold
pub fn process_log_state() -> Arc<DiagnosticState> {
    Arc::clone(&*PROCESS_LOG_STATE)
}

impl DiagnosticState {
    pub const fn new(threshold: SeverityLevel) -> Self {
        Self {
            threshold: AtomicU8::new(threshold as u8),
        }
    }

    pub fn threshold(&self) -> SeverityLevel {
        SeverityLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    pub fn set_threshold(&self, level: SeverityLevel) {
        self.threshold.store(level as u8, Ordering::Relaxed);
    }

    /// Apply configured severity text; `None` keeps the current value
    ///
    /// # Errors
    /// `InvalidConfiguration` when the text is not one of the six literals.
    /// The threshold is left untouched in that case.
    pub fn configure(&self, text: Option<&str>) -> BootstrapResult<SeverityLevel> {
        if let Some(text) = text {
            self.set_threshold(parse_severity(text)?);
        }
        Ok(self.threshold())
    }

    /// Filter check used by sinks
    pub fn allows(&self, severity: SeverityLevel) -> bool {
        severity >= self.threshold()
    }
}

impl Default for DiagnosticState {
    fn default() -> Self {
        Self::new(SeverityLevel::DEFAULT_THRESHOLD)
    }
}
