//! # v8host Core
//!
//! Shared contracts between the bootstrap kernel and its embedders.
//! No native dependencies live here.
//!
//! ## Module Organization
//!
//! - `severity`: Ordered diagnostic levels and their text form
//! - `error`: Bootstrap error taxonomy and FFI error codes
//! - `context`: Execution identity attached to diagnostics
//! - `config`: Loader/environment configuration
//! - `namespace`: Host module namespace filled by capability modules
//! - `traits`: Native engine and capability contracts

pub mod config;
pub mod context;
pub mod error;
pub mod namespace;
pub mod severity;
pub mod traits;

// Re-export commonly used types
pub use config::{BootstrapConfig, DataSource};
pub use context::ExecutionIdentity;
pub use error::{BootstrapError, BootstrapResult, ConfigError, ErrorCode};
pub use namespace::{ExportedSymbol, ModuleNamespace, SymbolKind};
pub use severity::{format_severity, parse_severity, SeverityLevel};
pub use traits::{Capability, NativeEngine};

/// Library version
pub const V8HOST_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
