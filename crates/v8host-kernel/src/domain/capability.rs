//! Domain Model: Capability Set
//!
//! Declared capability modules and their exposure order. Each module names
//! its prerequisites; the set orders them topologically, breaking ties by
//! declaration order, so a set declared in dependency order is exposed
//! exactly in that order.

use std::collections::HashMap;
use std::fmt;

use v8host_core::{BootstrapError, BootstrapResult, Capability};

/// Ordered collection of capability modules
#[derive(Default)]
pub struct CapabilitySet {
    modules: Vec<Box<dyn Capability + Send + Sync>>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a module; declaration order breaks ordering ties
    pub fn declare(&mut self, module: impl Capability + Send + Sync + 'static) -> &mut Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn with(mut self, module: impl Capability + Send + Sync + 'static) -> Self {
        self.declare(module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Names in declaration order
    pub fn declared(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Modules in exposure order
    ///
    /// # Errors
    /// `CapabilityOrdering` on duplicate names, unknown prerequisites or
    /// prerequisite cycles.
    pub fn ordered(&self) -> BootstrapResult<Vec<&(dyn Capability + Send + Sync)>> {
        let mut index: HashMap<&'static str, usize> = HashMap::with_capacity(self.modules.len());
        for (i, module) in self.modules.iter().enumerate() {
            if index.insert(module.name(), i).is_some() {
                return Err(BootstrapError::CapabilityOrdering(format!(
                    "capability {} declared twice",
                    module.name()
                )));
            }
        }

        // pending[i]: prerequisites of module i not yet placed
        let mut pending = vec![0usize; self.modules.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.modules.len()];
        for (i, module) in self.modules.iter().enumerate() {
            for required in module.requires() {
                let Some(&j) = index.get(required) else {
                    return Err(BootstrapError::CapabilityOrdering(format!(
                        "{} requires unknown capability {}",
                        module.name(),
                        required
                    )));
                };
                pending[i] += 1;
                dependents[j].push(i);
            }
        }

        let mut placed = vec![false; self.modules.len()];
        let mut order = Vec::with_capacity(self.modules.len());
        while order.len() < self.modules.len() {
            // Earliest declared module whose prerequisites are all placed.
            let Some(next) = (0..self.modules.len()).find(|&i| !placed[i] && pending[i] == 0) else {
                let stuck: Vec<_> = (0..self.modules.len())
                    .filter(|&i| !placed[i])
                    .map(|i| self.modules[i].name())
                    .collect();
                return Err(BootstrapError::CapabilityOrdering(format!(
                    "prerequisite cycle among {}",
                    stuck.join(", ")
                )));
            };
            placed[next] = true;
            for &dependent in &dependents[next] {
                pending[dependent] -= 1;
            }
            order.push(self.modules[next].as_ref());
        }
        Ok(order)
    }

    /// Exposure order as names
    pub fn ordered_names(&self) -> BootstrapResult<Vec<&'static str>> {
        Ok(self.ordered()?.into_iter().map(|m| m.name()).collect())
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.declared()).finish()
    }
}
