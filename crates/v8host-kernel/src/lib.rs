//! # v8host Kernel
//!
//! Bootstraps an embedded V8 engine for a host module loader and owns the
//! process's diagnostic logging.
//!
//! ## Layers
//!
//! - `diagnostics`: threshold, sinks, line format, `tracing` bridge
//! - `domain`: bootstrap stages and capability ordering (pure)
//! - `adapters`: external data locator, engine backends, built-in capabilities
//! - `kernel`: the sequencer and the process entry point
//! - `ffi`: C entry point

pub mod adapters;
pub mod diagnostics;
pub mod domain;
pub mod ffi;
pub mod kernel;

pub use adapters::{ExternalDataDir, ExternalDataLocator, RecordingEngine, V8Engine};
pub use diagnostics::{configure_diagnostics, DiagnosticLayer, DiagnosticSink, DiagnosticState, SinkRegistry, SinkTarget};
pub use domain::{BootstrapStage, CapabilitySet, Stage};
pub use kernel::{init_module, init_module_with, Bootstrapper, LoadedModule, MODULE_NAME};
