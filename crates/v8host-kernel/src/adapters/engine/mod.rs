//! Native engine backends
//!
//! - [`V8Engine`]: production backend over `deno_core::v8`
//! - [`RecordingEngine`]: records the call sequence without native code

pub mod recording;
pub mod v8;

pub use self::recording::{CallLog, EngineCall, EngineStep, RecordingEngine};
pub use self::v8::V8Engine;
