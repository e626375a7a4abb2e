//! # Host Module Namespace
//!
//! The public surface of the loaded module. Capability modules export their
//! types and objects here during the last bootstrap stage. The namespace is
//! append-only: symbols are never removed and a symbol can have one owner.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::{BootstrapError, BootstrapResult};

/// What kind of value a symbol names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Constructible type (class)
    Type,
    /// Singleton object
    Object,
    /// Free function
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Type => write!(f, "type"),
            SymbolKind::Object => write!(f, "object"),
            SymbolKind::Function => write!(f, "function"),
        }
    }
}

/// One exported name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Capability that exported it
    pub capability: String,
}

/// Ordered, append-only module namespace
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModuleNamespace {
    module: String,
    symbols: Vec<ExportedSymbol>,
    capabilities: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ModuleNamespace {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Default::default()
        }
    }

    /// Module name as seen by the host
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Export a symbol on behalf of `capability`
    ///
    /// # Errors
    /// `DuplicateSymbol` when the name is already exported.
    pub fn export(&mut self, capability: &str, name: &str, kind: SymbolKind) -> BootstrapResult<()> {
        if let Some(&existing) = self.index.get(name) {
            return Err(BootstrapError::DuplicateSymbol {
                symbol: name.to_string(),
                owner: self.symbols[existing].capability.clone(),
                capability: capability.to_string(),
            });
        }
        self.index.insert(name.to_string(), self.symbols.len());
        self.symbols.push(ExportedSymbol {
            name: name.to_string(),
            kind,
            capability: capability.to_string(),
        });
        Ok(())
    }

    /// Record that a capability finished exposing its surface
    ///
    /// # Errors
    /// `CapabilityRegistration` when the capability was already exposed.
    pub fn mark_exposed(&mut self, capability: &str) -> BootstrapResult<()> {
        if self.is_exposed(capability) {
            return Err(BootstrapError::CapabilityRegistration {
                capability: capability.to_string(),
                reason: "exposed twice".to_string(),
            });
        }
        self.capabilities.push(capability.to_string());
        Ok(())
    }

    pub fn is_exposed(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Capabilities in the order they were exposed
    pub fn exposed_capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn get(&self, name: &str) -> Option<&ExportedSymbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All symbols in export order
    pub fn symbols(&self) -> &[ExportedSymbol] {
        &self.symbols
    }

    /// Symbols exported by one capability
    pub fn symbols_of<'a>(&'a self, capability: &'a str) -> impl Iterator<Item = &'a ExportedSymbol> + 'a {
        self.symbols.iter().filter(move |s| s.capability == capability)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
