//! Diagnostic sinks and the append-only sink registry.
//!
//! A sink couples an output stream with the level filter and the line
//! formatter. Writes are synchronized per sink and flushed after every record
//! so nothing is lost if the process dies right after emitting.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, LazyLock};

use super::record::{format_record, LogRecord};
use super::state::DiagnosticState;

/// Output stream of a sink
pub enum SinkTarget {
    /// Process standard error; borrowed, never closed by the sink
    Stderr,
    /// Any caller-supplied writer
    Writer(Box<dyn Write + Send>),
}

impl SinkTarget {
    fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            SinkTarget::Stderr => Box::new(io::stderr()),
            SinkTarget::Writer(writer) => writer,
        }
    }
}

impl fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Stderr => write!(f, "SinkTarget::Stderr"),
            SinkTarget::Writer(_) => write!(f, "SinkTarget::Writer(..)"),
        }
    }
}

/// Synchronized, filtering, formatting output sink
pub struct DiagnosticSink {
    writer: Mutex<Box<dyn Write + Send>>,
    state: Arc<DiagnosticState>,
    auto_flush: bool,
}

impl DiagnosticSink {
    pub fn builder(state: Arc<DiagnosticState>) -> SinkBuilder {
        SinkBuilder {
            state,
            target: SinkTarget::Stderr,
            auto_flush: true,
        }
    }

    /// Filter, format and write one record
    ///
    /// Returns `Ok(false)` when the record is below the current threshold.
    pub fn consume(&self, record: &LogRecord) -> io::Result<bool> {
        if !self.state.allows(record.severity) {
            return Ok(false);
        }

        let line = format_record(record, self.state.threshold());
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        if self.auto_flush {
            writer.flush()?;
        }
        Ok(true)
    }

    pub fn state(&self) -> &Arc<DiagnosticState> {
        &self.state
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("threshold", &self.state.threshold())
            .field("auto_flush", &self.auto_flush)
            .finish()
    }
}

/// Builder for [`DiagnosticSink`]; defaults to auto-flushed stderr
#[derive(Debug)]
pub struct SinkBuilder {
    state: Arc<DiagnosticState>,
    target: SinkTarget,
    auto_flush: bool,
}

impl SinkBuilder {
    pub fn target(mut self, target: SinkTarget) -> Self {
        self.target = target;
        self
    }

    pub fn writer(self, writer: impl Write + Send + 'static) -> Self {
        self.target(SinkTarget::Writer(Box::new(writer)))
    }

    pub fn auto_flush(mut self, enabled: bool) -> Self {
        self.auto_flush = enabled;
        self
    }

    pub fn build(self) -> DiagnosticSink {
        DiagnosticSink {
            writer: Mutex::new(self.target.into_writer()),
            state: self.state,
            auto_flush: self.auto_flush,
        }
    }
}

// ============================================================================
// SINK REGISTRY
// ============================================================================

/// Append-only set of attached sinks
///
/// Sinks are attached during bootstrap and stay for the process lifetime;
/// there is intentionally no detach.
#[derive(Debug, Default)]
pub struct SinkRegistry {
    sinks: RwLock<Vec<Arc<DiagnosticSink>>>,
}

/// Sinks receiving every record emitted in the process
pub static PROCESS_SINKS: LazyLock<Arc<SinkRegistry>> = LazyLock::new(|| Arc::new(SinkRegistry::new()));

/// Shared handle to the process-wide sink registry
pub fn process_sinks() -> Arc<SinkRegistry> {
    Arc::clone(&*PROCESS_SINKS)
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink for the rest of the process lifetime
    pub fn attach(&self, sink: DiagnosticSink) -> Arc<DiagnosticSink> {
        let sink = Arc::new(sink);
        self.sinks.write().push(Arc::clone(&sink));
        sink
    }

    /// Offer a record to every sink; returns how many emitted it
    ///
    /// A failing stream does not prevent delivery to the other sinks.
    pub fn dispatch(&self, record: &LogRecord) -> usize {
        self.sinks
            .read()
            .iter()
            .filter(|sink| matches!(sink.consume(record), Ok(true)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }
}

// ============================================================================
// IN-MEMORY TARGET
// ============================================================================

/// Cloneable in-memory sink target
///
/// For embedders that collect diagnostics instead of printing them: pass a
/// clone as [`SinkTarget::Writer`] and read the lines back.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
