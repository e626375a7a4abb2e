//! Engine Bootstrap Sequencer
//!
//! Drives one module load through the six stages of [`BootstrapStage`]:
//! diagnostics, external data, platform, engine, root isolate, capability
//! exposure. Every stage is a hard precondition for the next. A failure marks
//! the run `Failed { at }`, is logged, and propagates; nothing is rolled back.
//!
//! The sequencer owns no global state. The diagnostic threshold and the sink
//! registry are injected, so a test can run a full bootstrap against local
//! instances and a [`RecordingEngine`](crate::adapters::RecordingEngine).

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use tracing::{debug, error, info};
use v8host_core::{
    BootstrapConfig, BootstrapError, BootstrapResult, ExecutionIdentity, ModuleNamespace, NativeEngine,
};

use crate::adapters::capabilities::builtin_capabilities;
use crate::adapters::locator::{load_external_data, ExternalDataDir, ExternalDataLocator};
use crate::diagnostics::{configure_diagnostics, execution_unit_span, DiagnosticState, SinkRegistry, SinkTarget};
use crate::domain::{BootstrapStage, CapabilitySet, Stage};

/// Name of the host module the capabilities are exposed into
pub const MODULE_NAME: &str = "_v8host";

/// Result of a completed bootstrap
///
/// Dropping it drops the engine, and with it the root isolate.
pub struct LoadedModule<E> {
    pub namespace: ModuleNamespace,
    pub identity: ExecutionIdentity,
    pub data_dir: ExternalDataDir,
    pub engine: E,
}

impl<E> fmt::Debug for LoadedModule<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("namespace", &self.namespace.module())
            .field("identity", &self.identity)
            .field("data_dir", &self.data_dir)
            .field("symbols", &self.namespace.len())
            .finish()
    }
}

/// [Command] One-shot module bootstrap
pub struct Bootstrapper<'a> {
    state: &'a Arc<DiagnosticState>,
    sinks: &'a SinkRegistry,
    sink_target: Option<SinkTarget>,
    locator: Option<ExternalDataLocator>,
    capabilities: CapabilitySet,
    stage: BootstrapStage,
}

impl<'a> Bootstrapper<'a> {
    /// Sequencer writing to stderr with the built-in capabilities
    pub fn new(state: &'a Arc<DiagnosticState>, sinks: &'a SinkRegistry) -> Self {
        Self {
            state,
            sinks,
            sink_target: None,
            locator: None,
            capabilities: builtin_capabilities(),
            stage: BootstrapStage::Uninitialized,
        }
    }

    pub fn sink_target(mut self, target: SinkTarget) -> Self {
        self.sink_target = Some(target);
        self
    }

    /// Resolve relative paths against `locator` instead of the current directory
    pub fn locator(mut self, locator: ExternalDataLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn stage(&self) -> BootstrapStage {
        self.stage
    }

    /// Run every stage
    ///
    /// `caller` is the data-directory fallback for
    /// [`DataSource::CallerLocation`](v8host_core::DataSource::CallerLocation).
    ///
    /// # Errors
    /// The first stage failure; `AlreadyInitialized` if this sequencer already ran.
    pub fn run<E>(
        &mut self,
        config: &BootstrapConfig,
        mut engine: E,
        caller: &Location<'_>,
    ) -> BootstrapResult<LoadedModule<E>>
    where
        E: NativeEngine,
    {
        if self.stage != BootstrapStage::Uninitialized {
            return Err(BootstrapError::AlreadyInitialized);
        }

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 1. [Diagnostics] Threshold, then sink
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let target = self.sink_target.take().unwrap_or(SinkTarget::Stderr);
        let result = configure_diagnostics(self.state, self.sinks, config.log_level.as_deref(), target);
        self.complete(Stage::DiagnosticsReady, result)?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 2. [Data] Resolve and load locale data + snapshot
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let result = self.locate(config, caller).and_then(|dir| {
            load_external_data(&mut engine, &dir)?;
            Ok(dir)
        });
        let data_dir = self.complete(Stage::DataLocated, result)?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 3. [Platform]
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        debug!("initializing platform ...");
        let result = engine.initialize_platform();
        self.complete(Stage::PlatformReady, result)?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 4. [Engine]
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        debug!("initializing V8 ...");
        let result = engine.initialize_engine();
        self.complete(Stage::EngineReady, result)?;

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 5. [Root Isolate] Everything after this carries its identity
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        let result = engine.enter_root_isolate();
        let identity = self.complete(Stage::RootContextEntered, result)?;
        let span = execution_unit_span(identity);
        let _entered = span.enter();

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 6. [Capabilities] Expose in prerequisite order
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        debug!("exposing modules ...");
        let result = self.expose();
        let namespace = self.complete(Stage::ModulesExposed, result)?;

        info!(
            "{} ready on {} engine: {} capabilities, {} symbols",
            namespace.module(),
            engine.name(),
            namespace.exposed_capabilities().len(),
            namespace.len()
        );

        Ok(LoadedModule {
            namespace,
            identity,
            data_dir,
            engine,
        })
    }

    fn locate(&self, config: &BootstrapConfig, caller: &Location<'_>) -> BootstrapResult<ExternalDataDir> {
        let locator = match &self.locator {
            Some(locator) => locator.clone(),
            None => ExternalDataLocator::from_current_dir()?,
        };
        locator.resolve(&config.data_source, caller)
    }

    fn expose(&self) -> BootstrapResult<ModuleNamespace> {
        let mut namespace = ModuleNamespace::new(MODULE_NAME);
        for capability in self.capabilities.ordered()? {
            capability
                .expose(&mut namespace)
                .map_err(|e| match e {
                    BootstrapError::DuplicateSymbol { .. } | BootstrapError::CapabilityRegistration { .. } => e,
                    other => BootstrapError::CapabilityRegistration {
                        capability: capability.name().to_string(),
                        reason: other.to_string(),
                    },
                })?;
        }
        Ok(namespace)
    }

    /// Advance to `target` on success; mark the run failed and log otherwise
    fn complete<T>(&mut self, target: Stage, result: BootstrapResult<T>) -> BootstrapResult<T> {
        match result {
            Ok(value) => {
                self.stage = self.stage.advance(target).map_err(|stage| {
                    BootstrapError::Internal(format!("cannot enter {target} from {stage}"))
                })?;
                Ok(value)
            }
            Err(err) => {
                self.stage = self.stage.fail();
                if err.is_native() {
                    error!(fatal = true, "bootstrap failed at stage {} ({target}): {err}", target.step());
                } else {
                    error!("bootstrap failed at stage {} ({target}): {err}", target.step());
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::engine::{EngineCall, EngineStep, RecordingEngine};
    use crate::diagnostics::{DiagnosticLayer, SharedBuffer};
    use std::fs;
    use tempfile::TempDir;
    use tracing_subscriber::prelude::*;
    use v8host_core::SeverityLevel;

    struct Fixture {
        state: Arc<DiagnosticState>,
        sinks: Arc<SinkRegistry>,
        buffer: SharedBuffer,
        data: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let data = TempDir::new().unwrap();
            fs::create_dir(data.path().join("data")).unwrap();
            Self {
                state: Arc::new(DiagnosticState::default()),
                sinks: Arc::new(SinkRegistry::new()),
                buffer: SharedBuffer::new(),
                data,
            }
        }

        fn bootstrapper(&self) -> Bootstrapper<'_> {
            Bootstrapper::new(&self.state, &self.sinks)
                .sink_target(SinkTarget::Writer(Box::new(self.buffer.clone())))
                .locator(ExternalDataLocator::with_cwd(self.data.path()))
        }

        /// Route tracing events from `f` into the fixture's sinks
        fn traced<R>(&self, f: impl FnOnce() -> R) -> R {
            let subscriber = tracing_subscriber::registry().with(DiagnosticLayer::new(Arc::clone(&self.sinks)));
            tracing::subscriber::with_default(subscriber, f)
        }

        fn config(&self) -> BootstrapConfig {
            BootstrapConfig::new().with_data_dir("data")
        }
    }

    #[test]
    fn full_run_reaches_modules_exposed() {
        let fx = Fixture::new();
        let mut bootstrapper = fx.bootstrapper();

        let module = bootstrapper
            .run(&fx.config(), RecordingEngine::new(7), Location::caller())
            .unwrap();

        assert!(bootstrapper.stage().is_complete());
        assert_eq!(module.identity, ExecutionIdentity::root(7));
        assert_eq!(module.namespace.module(), MODULE_NAME);
        assert_eq!(module.engine.calls().len(), 5);
        assert_eq!(fx.sinks.len(), 1);
    }

    #[test]
    fn invalid_level_stops_before_native_calls() {
        let fx = Fixture::new();
        let engine = RecordingEngine::new(1);
        let calls = engine.call_log();
        let mut bootstrapper = fx.bootstrapper();

        let err = bootstrapper
            .run(&fx.config().with_log_level("VERBOSE"), engine, Location::caller())
            .unwrap_err();

        assert!(matches!(err, BootstrapError::InvalidConfiguration(_)));
        assert_eq!(bootstrapper.stage(), BootstrapStage::Failed { at: Stage::DiagnosticsReady });
        assert!(fx.sinks.is_empty());
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn missing_data_dir_stops_before_platform() {
        let fx = Fixture::new();
        let engine = RecordingEngine::new(1);
        let calls = engine.call_log();
        let mut bootstrapper = fx.bootstrapper();

        let config = BootstrapConfig::new().with_invoking_script("gone/script.py");
        let err = fx
            .traced(|| bootstrapper.run(&config, engine, Location::caller()))
            .unwrap_err();

        assert!(matches!(err, BootstrapError::ResourceLocation { .. }));
        assert_eq!(bootstrapper.stage(), BootstrapStage::Failed { at: Stage::DataLocated });
        assert!(calls.lock().is_empty());
        assert!(fx.buffer.contents().contains("<ERROR> bootstrap failed at stage 2"));
    }

    #[test]
    fn native_failure_is_fatal() {
        let fx = Fixture::new();
        let engine = RecordingEngine::new(1).failing_on(EngineStep::Platform);
        let calls = engine.call_log();
        let mut bootstrapper = fx.bootstrapper();

        let err = fx
            .traced(|| bootstrapper.run(&fx.config(), engine, Location::caller()))
            .unwrap_err();

        assert!(matches!(err, BootstrapError::PlatformInit(_)));
        assert_eq!(bootstrapper.stage(), BootstrapStage::Failed { at: Stage::PlatformReady });
        assert!(!calls.lock().contains(&EngineCall::InitializeEngine));
        assert!(fx.buffer.contents().contains("<FATAL> bootstrap failed at stage 3"));
    }

    #[test]
    fn second_run_is_refused() {
        let fx = Fixture::new();
        let mut bootstrapper = fx.bootstrapper();
        bootstrapper
            .run(&fx.config(), RecordingEngine::new(1), Location::caller())
            .unwrap();

        let again = bootstrapper.run(&fx.config(), RecordingEngine::new(2), Location::caller());
        assert!(matches!(again, Err(BootstrapError::AlreadyInitialized)));
    }

    #[test]
    fn threshold_is_applied() {
        let fx = Fixture::new();
        fx.bootstrapper()
            .run(&fx.config().with_log_level("WARNING"), RecordingEngine::new(1), Location::caller())
            .unwrap();
        assert_eq!(fx.state.threshold(), SeverityLevel::Warning);
    }
}
