//! Kernel: the bootstrap sequencer and the process entry point

pub mod bootstrap;
pub mod module;

pub use bootstrap::{Bootstrapper, LoadedModule, MODULE_NAME};
pub use module::{init_module, init_module_with, install_tracing_bridge, module_entered};
