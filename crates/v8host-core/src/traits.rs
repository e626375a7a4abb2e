//! # Behavior Contracts
//!
//! Seams between the bootstrap sequencer and its collaborators: the native
//! engine it drives and the capability modules it activates.

use std::path::Path;

use crate::context::ExecutionIdentity;
use crate::error::BootstrapResult;
use crate::namespace::ModuleNamespace;

/// Native engine lifecycle contract
///
/// Calls arrive in a fixed order from the sequencer: both data loads, then
/// `initialize_platform`, `initialize_engine`, `enter_root_isolate`.
/// Implementations must refuse a second platform or engine initialization
/// rather than silently re-initializing a process-wide singleton.
pub trait NativeEngine {
    /// Short backend name used in diagnostics
    fn name(&self) -> &'static str;

    /// Load locale (ICU) data from the resolved data directory
    fn load_locale_data(&mut self, dir: &Path) -> BootstrapResult<()>;

    /// Load the startup snapshot blob from the resolved data directory
    fn load_startup_snapshot(&mut self, dir: &Path) -> BootstrapResult<()>;

    /// Initialize the process-wide platform abstraction
    fn initialize_platform(&mut self) -> BootstrapResult<()>;

    /// Initialize the engine runtime; requires an initialized platform
    fn initialize_engine(&mut self) -> BootstrapResult<()>;

    /// Create the root execution unit and make it the thread's active one
    fn enter_root_isolate(&mut self) -> BootstrapResult<ExecutionIdentity>;
}

/// Capability module contract
///
/// A capability registers its public type/object surface into the host
/// module namespace. What those types do is outside the bootstrap.
pub trait Capability {
    /// Unique capability name
    fn name(&self) -> &'static str;

    /// Capabilities that must be exposed before this one
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    /// Register this capability's surface
    fn expose(&self, namespace: &mut ModuleNamespace) -> BootstrapResult<()>;
}
