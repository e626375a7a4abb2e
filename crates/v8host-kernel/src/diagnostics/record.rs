//! Diagnostic records and their line format.

use chrono::{DateTime, Local};
use std::fmt::Write as _;

use v8host_core::{ExecutionIdentity, SeverityLevel};

/// Timestamp layout of every diagnostic line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One diagnostic call, consumed immediately by the sinks
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub severity: SeverityLevel,
    pub message: String,
    pub identity: Option<ExecutionIdentity>,
}

impl LogRecord {
    /// Record stamped with the current local time
    pub fn new(severity: SeverityLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: message.into(),
            identity: None,
        }
    }

    pub fn with_identity(mut self, identity: ExecutionIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Render a record as one line (without the trailing newline)
///
/// `YYYY-MM-DD HH:MM:SS [engine:context] <SEVERITY> message`, where the
/// bracketed identity only appears when `threshold` is DEBUG or more verbose
/// and the record carries an identity.
pub fn format_record(record: &LogRecord, threshold: SeverityLevel) -> String {
    let mut line = String::with_capacity(32 + record.message.len());
    // Writing into a String cannot fail.
    let _ = write!(line, "{}", record.timestamp.format(TIMESTAMP_FORMAT));
    if let Some(identity) = record.identity.filter(|_| threshold.is_debug_or_more_verbose()) {
        let _ = write!(line, " [{}:{}]", identity.engine_id, identity.context_id);
    }
    let _ = write!(line, " <{}> {}", record.severity, record.message);
    line
}
