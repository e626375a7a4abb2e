//! Recording backend.
//!
//! Runs no native code. Every call is appended to a shared log so tests can
//! assert what the sequencer asked for and in which order; a single step can
//! be made to fail. Singleton rules are enforced per instance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use v8host_core::{BootstrapError, BootstrapResult, ExecutionIdentity, NativeEngine};

/// Lifecycle step of a native engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineStep {
    LocaleData,
    StartupSnapshot,
    Platform,
    Engine,
    RootIsolate,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    LoadLocaleData(PathBuf),
    LoadStartupSnapshot(PathBuf),
    InitializePlatform,
    InitializeEngine,
    EnterRootIsolate,
}

impl EngineCall {
    pub fn step(&self) -> EngineStep {
        match self {
            EngineCall::LoadLocaleData(_) => EngineStep::LocaleData,
            EngineCall::LoadStartupSnapshot(_) => EngineStep::StartupSnapshot,
            EngineCall::InitializePlatform => EngineStep::Platform,
            EngineCall::InitializeEngine => EngineStep::Engine,
            EngineCall::EnterRootIsolate => EngineStep::RootIsolate,
        }
    }

    /// Platform/engine/isolate initialization, as opposed to data loading
    pub fn is_native_init(&self) -> bool {
        !matches!(self, EngineCall::LoadLocaleData(_) | EngineCall::LoadStartupSnapshot(_))
    }
}

/// Shared view of the recorded calls
pub type CallLog = Arc<Mutex<Vec<EngineCall>>>;

/// Engine backend that records instead of initializing anything
#[derive(Debug, Default)]
pub struct RecordingEngine {
    engine_id: u64,
    calls: CallLog,
    fail_on: Option<EngineStep>,
    platform: bool,
    engine: bool,
    entered: bool,
}

impl RecordingEngine {
    pub fn new(engine_id: u64) -> Self {
        Self {
            engine_id,
            ..Default::default()
        }
    }

    /// Make `step` fail with the error a native backend would raise there
    pub fn failing_on(mut self, step: EngineStep) -> Self {
        self.fail_on = Some(step);
        self
    }

    /// Handle on the call log that outlives the engine
    pub fn call_log(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: EngineCall) -> BootstrapResult<()> {
        trace!("recording engine call {call:?}");
        let step = call.step();
        let path = match &call {
            EngineCall::LoadLocaleData(dir) | EngineCall::LoadStartupSnapshot(dir) => Some(dir.clone()),
            _ => None,
        };
        self.calls.lock().push(call);

        if self.fail_on != Some(step) {
            return Ok(());
        }
        let reason = format!("injected failure at {step:?}");
        Err(match step {
            EngineStep::LocaleData | EngineStep::StartupSnapshot => {
                BootstrapError::resource(path.unwrap_or_default(), reason)
            }
            EngineStep::Platform => BootstrapError::PlatformInit(reason),
            EngineStep::Engine => BootstrapError::EngineInit(reason),
            EngineStep::RootIsolate => BootstrapError::RootContext(reason),
        })
    }
}

impl NativeEngine for RecordingEngine {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn load_locale_data(&mut self, dir: &Path) -> BootstrapResult<()> {
        self.record(EngineCall::LoadLocaleData(dir.to_path_buf()))
    }

    fn load_startup_snapshot(&mut self, dir: &Path) -> BootstrapResult<()> {
        self.record(EngineCall::LoadStartupSnapshot(dir.to_path_buf()))
    }

    fn initialize_platform(&mut self) -> BootstrapResult<()> {
        if self.platform {
            return Err(BootstrapError::PlatformInit("platform already initialized".into()));
        }
        self.record(EngineCall::InitializePlatform)?;
        self.platform = true;
        Ok(())
    }

    fn initialize_engine(&mut self) -> BootstrapResult<()> {
        if !self.platform {
            return Err(BootstrapError::EngineInit("platform not initialized".into()));
        }
        if self.engine {
            return Err(BootstrapError::EngineInit("engine already initialized".into()));
        }
        self.record(EngineCall::InitializeEngine)?;
        self.engine = true;
        Ok(())
    }

    fn enter_root_isolate(&mut self) -> BootstrapResult<ExecutionIdentity> {
        if !self.engine {
            return Err(BootstrapError::RootContext("engine not initialized".into()));
        }
        if self.entered {
            return Err(BootstrapError::RootContext("root isolate already entered".into()));
        }
        self.record(EngineCall::EnterRootIsolate)?;
        self.entered = true;
        Ok(ExecutionIdentity::root(self.engine_id))
    }
}
