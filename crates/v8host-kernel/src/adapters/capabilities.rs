//! Built-in capability modules
//!
//! Each module exports its public surface into the host namespace. Their
//! behavior lives behind those symbols and is outside the bootstrap; here
//! they only declare names, kinds and prerequisites.

use tracing::trace;
use v8host_core::{BootstrapResult, Capability, ModuleNamespace, SymbolKind};

use crate::domain::CapabilitySet;

/// Statically described capability module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinCapability {
    pub name: &'static str,
    pub requires: &'static [&'static str],
    pub symbols: &'static [(&'static str, SymbolKind)],
}

impl Capability for BuiltinCapability {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requires(&self) -> &'static [&'static str] {
        self.requires
    }

    fn expose(&self, namespace: &mut ModuleNamespace) -> BootstrapResult<()> {
        for (symbol, kind) in self.symbols {
            trace!("export {}.{} ({kind})", self.name, symbol);
            namespace.export(self.name, symbol, *kind)?;
        }
        namespace.mark_exposed(self.name)
    }
}

// ============================================================================
// MODULES
// ============================================================================

/// Script exception translation
pub const EXCEPTIONS: BuiltinCapability = BuiltinCapability {
    name: "exceptions",
    requires: &[],
    symbols: &[("JSError", SymbolKind::Type), ("JSException", SymbolKind::Type)],
};

/// Generic host-object wrapping
pub const WRAPPER: BuiltinCapability = BuiltinCapability {
    name: "wrapper",
    requires: &["exceptions"],
    symbols: &[
        ("JSObject", SymbolKind::Type),
        ("JSNull", SymbolKind::Object),
        ("JSUndefined", SymbolKind::Object),
        ("JSArray", SymbolKind::Type),
        ("JSFunction", SymbolKind::Type),
    ],
};

/// Execution contexts and isolates
pub const CONTEXT: BuiltinCapability = BuiltinCapability {
    name: "context",
    requires: &["wrapper"],
    symbols: &[("JSContext", SymbolKind::Type), ("JSIsolate", SymbolKind::Type)],
};

/// Syntax-tree inspection
#[cfg(feature = "ast")]
pub const AST: BuiltinCapability = BuiltinCapability {
    name: "ast",
    requires: &["context"],
    symbols: &[("AST", SymbolKind::Object), ("JSAstNode", SymbolKind::Type)],
};

/// Engine control, scripts and stack traces
pub const ENGINE: BuiltinCapability = BuiltinCapability {
    name: "engine",
    requires: &["context"],
    symbols: &[
        ("JSEngine", SymbolKind::Type),
        ("JSScript", SymbolKind::Type),
        ("JSStackTrace", SymbolKind::Type),
        ("JSStackFrame", SymbolKind::Type),
    ],
};

/// Script debugging
pub const DEBUG: BuiltinCapability = BuiltinCapability {
    name: "debug",
    requires: &["engine"],
    symbols: &[("JSDebugger", SymbolKind::Type), ("JSDebugEvent", SymbolKind::Type)],
};

/// Concurrency locking
pub const LOCKER: BuiltinCapability = BuiltinCapability {
    name: "locker",
    requires: &["context"],
    symbols: &[("JSLocker", SymbolKind::Type), ("JSUnlocker", SymbolKind::Type)],
};

/// All built-in modules, in declaration order
pub fn builtin_modules() -> Vec<BuiltinCapability> {
    let mut modules = vec![EXCEPTIONS, WRAPPER, CONTEXT];
    #[cfg(feature = "ast")]
    modules.push(AST);
    modules.extend([ENGINE, DEBUG, LOCKER]);
    modules
}

/// Capability set exposed by a default bootstrap
pub fn builtin_capabilities() -> CapabilitySet {
    let mut set = CapabilitySet::new();
    for module in builtin_modules() {
        set.declare(module);
    }
    set
}
