pub mod capabilities;
pub mod engine;
pub mod locator;

// 외부에서 사용하기 편하도록 경로 재노출
pub use capabilities::{builtin_capabilities, BuiltinCapability};
pub use engine::{RecordingEngine, V8Engine};
pub use locator::{load_external_data, ExternalDataDir, ExternalDataLocator};
