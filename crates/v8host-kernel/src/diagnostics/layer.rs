//! Tracing bridge.
//!
//! Emission sites use the `tracing` macros. `DiagnosticLayer` turns every
//! event into a [`LogRecord`] and hands it to a [`SinkRegistry`], so the sinks
//! own filtering and formatting.
//!
//! Execution identity travels on spans: a span carrying `engine_id` and
//! `context_id` fields (see [`execution_unit_span`]) tags every event emitted
//! inside it. The innermost tagged span wins.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::prelude::*;

use v8host_core::{ExecutionIdentity, SeverityLevel};

use super::record::LogRecord;
use super::sink::SinkRegistry;

/// Field marking an ERROR event as FATAL (`tracing::error!(fatal = true, ...)`)
pub const FATAL_FIELD: &str = "fatal";

/// Map a tracing level onto the severity model
///
/// tracing has no FATAL level; `fatal` selects it for ERROR events.
pub fn severity_of(level: &Level, fatal: bool) -> SeverityLevel {
    match *level {
        Level::TRACE => SeverityLevel::Trace,
        Level::DEBUG => SeverityLevel::Debug,
        Level::INFO => SeverityLevel::Info,
        Level::WARN => SeverityLevel::Warning,
        _ if fatal => SeverityLevel::Fatal,
        _ => SeverityLevel::Error,
    }
}

/// Span tagging everything inside it with `identity`
///
/// Created at ERROR so no static level cap on `tracing` compiles it out.
pub fn execution_unit_span(identity: ExecutionIdentity) -> tracing::Span {
    tracing::span!(
        Level::ERROR,
        "execution_unit",
        engine_id = identity.engine_id,
        context_id = identity.context_id
    )
}

/// `tracing_subscriber` layer forwarding events into a sink registry
#[derive(Debug, Clone)]
pub struct DiagnosticLayer {
    sinks: Arc<SinkRegistry>,
}

impl DiagnosticLayer {
    pub fn new(sinks: Arc<SinkRegistry>) -> Self {
        Self { sinks }
    }

    /// Install the layer as the global default subscriber
    ///
    /// Returns `false` when another global subscriber is already set.
    pub fn try_init_global(self) -> bool {
        tracing_subscriber::registry().with(self).try_init().is_ok()
    }
}

impl<S> Layer<S> for DiagnosticLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = IdentityVisitor::default();
        attrs.record(&mut visitor);
        if let (Some(identity), Some(span)) = (visitor.identity(), ctx.span(id)) {
            span.extensions_mut().insert(identity);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let identity = ctx.event_scope(event).and_then(|scope| {
            scope
                .into_iter()
                .find_map(|span| {
                    let extensions = span.extensions();
                    extensions.get::<ExecutionIdentity>().copied()
                })
        });

        let severity = severity_of(event.metadata().level(), visitor.fatal);
        let mut record = LogRecord::new(severity, visitor.finish());
        record.identity = identity;
        self.sinks.dispatch(&record);
    }
}

/// Collects `engine_id` / `context_id` span fields
#[derive(Default)]
struct IdentityVisitor {
    engine_id: Option<u64>,
    context_id: Option<u64>,
}

impl IdentityVisitor {
    fn identity(&self) -> Option<ExecutionIdentity> {
        Some(ExecutionIdentity::new(self.engine_id?, self.context_id?))
    }
}

impl Visit for IdentityVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "engine_id" => self.engine_id = Some(value),
            "context_id" => self.context_id = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let Ok(value) = u64::try_from(value) {
            self.record_u64(field, value);
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
}

/// Renders an event as `message key=value ...`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
    fatal: bool,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == FATAL_FIELD {
            self.fatal = value;
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
