//! # Execution Identity
//!
//! Identifies which execution unit (engine instance) and which sub-context a
//! diagnostic record was emitted from. Needed to tell isolates apart in a
//! multi-isolate embedding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine instance / sub-context pair attached to diagnostic records
///
/// `context_id == 0` means no context has been entered on the engine yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionIdentity {
    /// Engine instance (isolate) identifier, unique per process
    pub engine_id: u64,
    /// Sub-context identifier within the engine instance
    pub context_id: u64,
}

impl ExecutionIdentity {
    /// Sentinel for "no context entered"
    pub const NO_CONTEXT: u64 = 0;

    pub const fn new(engine_id: u64, context_id: u64) -> Self {
        Self {
            engine_id,
            context_id,
        }
    }

    /// Identity of a freshly created engine with no entered context
    pub const fn root(engine_id: u64) -> Self {
        Self::new(engine_id, Self::NO_CONTEXT)
    }

    /// Same engine, different sub-context
    pub const fn with_context(self, context_id: u64) -> Self {
        Self::new(self.engine_id, context_id)
    }

    pub fn has_context(&self) -> bool {
        self.context_id != Self::NO_CONTEXT
    }
}

impl fmt::Display for ExecutionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.engine_id, self.context_id)
    }
}
