pub mod capability;
pub mod stage;

// 외부에서 `domain::BootstrapStage` 식으로 바로 접근하도록 Re-export
pub use capability::CapabilitySet;
pub use stage::{BootstrapStage, Stage};
