//! Domain Model: Bootstrap Stage
//!
//! Linear state machine driven by the sequencer. Each stage is a hard
//! precondition for the next; there is no rollback and no retry.

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Stage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Progress of one bootstrap run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootstrapStage {
    #[default]
    Uninitialized,
    DiagnosticsReady,
    DataLocated,
    PlatformReady,
    EngineReady,
    RootContextEntered,
    ModulesExposed,
    /// Terminal; `at` is the stage that was being entered
    Failed { at: Stage },
}

/// Non-terminal stages, in order
///
/// Split out of [`BootstrapStage`] so `Failed` cannot nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Uninitialized,
    DiagnosticsReady,
    DataLocated,
    PlatformReady,
    EngineReady,
    RootContextEntered,
    ModulesExposed,
}

impl Stage {
    pub const ORDER: [Stage; 7] = [
        Stage::Uninitialized,
        Stage::DiagnosticsReady,
        Stage::DataLocated,
        Stage::PlatformReady,
        Stage::EngineReady,
        Stage::RootContextEntered,
        Stage::ModulesExposed,
    ];

    /// Following stage, `None` once modules are exposed
    pub fn next(self) -> Option<Stage> {
        let index = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(index + 1).copied()
    }

    /// 1-based step number of the transition into this stage
    pub fn step(self) -> usize {
        self as usize
    }
}

impl From<Stage> for BootstrapStage {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Uninitialized => BootstrapStage::Uninitialized,
            Stage::DiagnosticsReady => BootstrapStage::DiagnosticsReady,
            Stage::DataLocated => BootstrapStage::DataLocated,
            Stage::PlatformReady => BootstrapStage::PlatformReady,
            Stage::EngineReady => BootstrapStage::EngineReady,
            Stage::RootContextEntered => BootstrapStage::RootContextEntered,
            Stage::ModulesExposed => BootstrapStage::ModulesExposed,
        }
    }
}

impl BootstrapStage {
    /// The non-terminal stage, `None` when failed
    pub fn stage(self) -> Option<Stage> {
        Some(match self {
            BootstrapStage::Uninitialized => Stage::Uninitialized,
            BootstrapStage::DiagnosticsReady => Stage::DiagnosticsReady,
            BootstrapStage::DataLocated => Stage::DataLocated,
            BootstrapStage::PlatformReady => Stage::PlatformReady,
            BootstrapStage::EngineReady => Stage::EngineReady,
            BootstrapStage::RootContextEntered => Stage::RootContextEntered,
            BootstrapStage::ModulesExposed => Stage::ModulesExposed,
            BootstrapStage::Failed { .. } => return None,
        })
    }

    /// Stage the sequencer may enter next
    pub fn next(self) -> Option<Stage> {
        self.stage()?.next()
    }

    /// Move to `target`
    ///
    /// # Errors
    /// Returns the current stage unchanged when `target` is not the direct
    /// successor (skips, repeats and transitions out of `Failed`).
    pub fn advance(self, target: Stage) -> Result<BootstrapStage, BootstrapStage> {
        if self.next() == Some(target) {
            Ok(target.into())
        } else {
            Err(self)
        }
    }

    /// Terminal marker for a failure while entering the next stage
    ///
    /// A stage that is already failed keeps its original marker.
    pub fn fail(self) -> BootstrapStage {
        match self.next() {
            Some(at) => BootstrapStage::Failed { at },
            None => self,
        }
    }

    pub fn is_complete(self) -> bool {
        self == BootstrapStage::ModulesExposed
    }

    pub fn is_failed(self) -> bool {
        matches!(self, BootstrapStage::Failed { .. })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapStage::Failed { at } => write!(f, "Failed(at {at})"),
            other => match other.stage() {
                Some(stage) => write!(f, "{stage}"),
                None => Ok(()),
            },
        }
    }
}
