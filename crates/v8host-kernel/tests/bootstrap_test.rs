use std::env;
use std::fs;
use std::panic::Location;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use tracing_subscriber::prelude::*;

use v8host_core::config::{DATA_DIR_VAR, LOG_LEVEL_VAR};
use v8host_core::{BootstrapConfig, BootstrapError, BootstrapResult, Capability, ModuleNamespace, SeverityLevel};
use v8host_kernel::adapters::engine::{EngineCall, RecordingEngine};
use v8host_kernel::diagnostics::{DiagnosticLayer, DiagnosticState, SharedBuffer, SinkRegistry, SinkTarget};
use v8host_kernel::domain::{BootstrapStage, CapabilitySet, Stage};
use v8host_kernel::{Bootstrapper, ExternalDataLocator};

/// Serializes tests that touch the process environment
static ENV_LOCK: Mutex<()> = Mutex::new(());

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Harness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Harness {
    state: Arc<DiagnosticState>,
    sinks: Arc<SinkRegistry>,
    output: SharedBuffer,
    workdir: TempDir,
}

struct Outcome {
    result: BootstrapResult<v8host_kernel::LoadedModule<RecordingEngine>>,
    stage: BootstrapStage,
    calls: Vec<EngineCall>,
}

impl Harness {
    fn new() -> Self {
        let workdir = TempDir::new().unwrap();
        fs::create_dir_all(workdir.path().join("app/v8")).unwrap();
        fs::write(workdir.path().join("app/main.py"), "import v8host\n").unwrap();
        Self {
            state: Arc::new(DiagnosticState::default()),
            sinks: Arc::new(SinkRegistry::new()),
            output: SharedBuffer::new(),
            workdir,
        }
    }

    fn run(&self, config: &BootstrapConfig) -> Outcome {
        self.run_with(config, None)
    }

    fn run_with(&self, config: &BootstrapConfig, capabilities: Option<CapabilitySet>) -> Outcome {
        let engine = RecordingEngine::new(7);
        let calls = engine.call_log();
        let mut bootstrapper = Bootstrapper::new(&self.state, &self.sinks)
            .sink_target(SinkTarget::Writer(Box::new(self.output.clone())))
            .locator(ExternalDataLocator::with_cwd(self.workdir.path()));
        if let Some(capabilities) = capabilities {
            bootstrapper = bootstrapper.capabilities(capabilities);
        }

        let subscriber = tracing_subscriber::registry().with(DiagnosticLayer::new(Arc::clone(&self.sinks)));
        let result = tracing::subscriber::with_default(subscriber, || {
            bootstrapper.run(config, engine, Location::caller())
        });

        let calls = calls.lock().clone();
        Outcome {
            result,
            stage: bootstrapper.stage(),
            calls,
        }
    }

    fn lines(&self) -> Vec<String> {
        self.output.lines()
    }
}

fn script_config() -> BootstrapConfig {
    BootstrapConfig::new().with_invoking_script("app/main.py")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Stage sequence
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn test_env_unset_exposes_every_module_once_in_order() {
    let harness = Harness::new();
    let config = BootstrapConfig::from_lookup(|_| None).unwrap().with_invoking_script("app/main.py");

    let outcome = harness.run(&config);
    let module = outcome.result.unwrap();

    assert_eq!(outcome.stage, BootstrapStage::ModulesExposed);
    assert_eq!(harness.state.threshold(), SeverityLevel::Error);

    let mut expected = vec!["exceptions", "wrapper", "context"];
    if cfg!(feature = "ast") {
        expected.push("ast");
    }
    expected.extend(["engine", "debug", "locker"]);
    assert_eq!(module.namespace.exposed_capabilities(), expected.as_slice());

    // Default threshold: nothing below ERROR reached the sink.
    assert!(harness.lines().is_empty(), "{:?}", harness.lines());
}

#[test]
fn test_native_calls_follow_data_loading() {
    let harness = Harness::new();
    let outcome = harness.run(&script_config());
    let module = outcome.result.unwrap();

    let data_dir = fs::canonicalize(harness.workdir.path().join("app")).unwrap();
    assert_eq!(module.data_dir.path(), data_dir);
    assert_eq!(
        outcome.calls,
        vec![
            EngineCall::LoadLocaleData(data_dir.clone()),
            EngineCall::LoadStartupSnapshot(data_dir),
            EngineCall::InitializePlatform,
            EngineCall::InitializeEngine,
            EngineCall::EnterRootIsolate,
        ]
    );
}

#[test]
fn test_explicit_dir_wins_over_script() {
    let harness = Harness::new();
    let config = BootstrapConfig::new().with_data_dir("app/v8").with_invoking_script("app/main.py");

    let module = harness.run(&config).result.unwrap();
    assert!(module.data_dir.path().ends_with("app/v8"));
}

#[test]
fn test_nonexistent_script_fails_before_native_init() {
    let harness = Harness::new();
    let config = BootstrapConfig::new().with_invoking_script("app/missing.py");

    let outcome = harness.run(&config);

    assert!(matches!(outcome.result, Err(BootstrapError::ResourceLocation { .. })));
    assert_eq!(outcome.stage, BootstrapStage::Failed { at: Stage::DataLocated });
    assert!(outcome.calls.is_empty());
    assert!(harness.lines().iter().any(|l| l.contains("<ERROR> bootstrap failed at stage 2")));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Diagnostics
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn test_debug_level_emits_stage_messages_without_trace() {
    let harness = Harness::new();
    let outcome = harness.run(&script_config().with_log_level("DEBUG"));
    outcome.result.unwrap();

    let lines = harness.lines();
    let data_dir = fs::canonicalize(harness.workdir.path().join("app")).unwrap();
    let expected = [
        format!("<DEBUG> load ICU data from {} ...", data_dir.display()),
        format!("<DEBUG> load external snapshot from {} ...", data_dir.display()),
        "<DEBUG> initializing platform ...".to_string(),
        "<DEBUG> initializing V8 ...".to_string(),
        "[7:0] <DEBUG> exposing modules ...".to_string(),
    ];
    for (line, suffix) in lines.iter().zip(expected.iter()) {
        assert!(line.ends_with(suffix.as_str()), "{line:?} does not end with {suffix:?}");
    }
    assert_eq!(lines.len(), expected.len() + 1, "{lines:?}");
    assert!(lines[expected.len()].contains("[7:0] <INFO> _v8host ready on recording engine"));
    assert!(lines.iter().all(|l| !l.contains("<TRACE>")));
}

#[test]
fn test_trace_level_shows_engine_calls() {
    let harness = Harness::new();
    harness.run(&script_config().with_log_level("TRACE")).result.unwrap();

    let lines = harness.lines();
    assert!(lines.iter().any(|l| l.contains("<TRACE> recording engine call InitializePlatform")));
    assert!(lines.iter().any(|l| l.contains("[7:0] <TRACE> export locker.JSLocker")));
}

#[test]
fn test_info_level_hides_identity() {
    let harness = Harness::new();
    harness.run(&script_config().with_log_level("INFO")).result.unwrap();

    let lines = harness.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains(" <INFO> _v8host ready on recording engine"));
    assert!(!lines[0].contains("[7:0]"));
}

#[test]
fn test_verbose_aborts_at_first_stage() {
    let harness = Harness::new();
    let outcome = harness.run(&script_config().with_log_level("VERBOSE"));

    match outcome.result {
        Err(BootstrapError::InvalidConfiguration(err)) => assert!(err.to_string().contains("VERBOSE")),
        other => panic!("expected configuration error, got {other:?}"),
    }
    assert_eq!(outcome.stage, BootstrapStage::Failed { at: Stage::DiagnosticsReady });
    assert!(harness.sinks.is_empty());
    assert!(outcome.calls.is_empty());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Capability ordering
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Probe {
    name: &'static str,
    requires: &'static [&'static str],
    symbol: &'static str,
}

impl Capability for Probe {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requires(&self) -> &'static [&'static str] {
        self.requires
    }

    fn expose(&self, namespace: &mut ModuleNamespace) -> BootstrapResult<()> {
        namespace.export(self.name, self.symbol, v8host_core::SymbolKind::Type)?;
        namespace.mark_exposed(self.name)
    }
}

#[test]
fn test_module_declared_before_prerequisite_is_exposed_after_it() {
    let harness = Harness::new();
    let set = CapabilitySet::new()
        .with(Probe { name: "debug", requires: &["engine"], symbol: "Debugger" })
        .with(Probe { name: "engine", requires: &[], symbol: "Engine" });

    let module = harness.run_with(&script_config(), Some(set)).result.unwrap();
    assert_eq!(module.namespace.exposed_capabilities(), ["engine", "debug"]);
}

#[test]
fn test_cycle_fails_registration_stage() {
    let harness = Harness::new();
    let set = CapabilitySet::new()
        .with(Probe { name: "a", requires: &["b"], symbol: "A" })
        .with(Probe { name: "b", requires: &["a"], symbol: "B" });

    let outcome = harness.run_with(&script_config(), Some(set));

    assert!(matches!(outcome.result, Err(BootstrapError::CapabilityOrdering(_))));
    assert_eq!(outcome.stage, BootstrapStage::Failed { at: Stage::ModulesExposed });
    assert_eq!(outcome.calls.last(), Some(&EngineCall::EnterRootIsolate));
}

#[test]
fn test_duplicate_symbol_is_rejected() {
    let harness = Harness::new();
    let set = CapabilitySet::new()
        .with(Probe { name: "a", requires: &[], symbol: "JSObject" })
        .with(Probe { name: "b", requires: &[], symbol: "JSObject" });

    let outcome = harness.run_with(&script_config(), Some(set));
    match outcome.result {
        Err(BootstrapError::DuplicateSymbol { symbol, owner, capability }) => {
            assert_eq!((symbol.as_str(), owner.as_str(), capability.as_str()), ("JSObject", "a", "b"));
        }
        other => panic!("expected duplicate symbol, got {other:?}"),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Process environment
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn test_environment_configuration() {
    let _guard = ENV_LOCK.lock();
    let harness = Harness::new();
    let data_dir = harness.workdir.path().join("app/v8");

    env::set_var(LOG_LEVEL_VAR, "DEBUG");
    env::set_var(DATA_DIR_VAR, &data_dir);
    let config = BootstrapConfig::from_env();
    env::remove_var(LOG_LEVEL_VAR);
    env::remove_var(DATA_DIR_VAR);

    let module = harness.run(&config.unwrap()).result.unwrap();
    assert_eq!(harness.state.threshold(), SeverityLevel::Debug);
    assert_eq!(module.data_dir.path(), fs::canonicalize(data_dir).unwrap());
}

#[test]
fn test_environment_unset_keeps_default_threshold() {
    let _guard = ENV_LOCK.lock();
    env::remove_var(LOG_LEVEL_VAR);
    env::remove_var(DATA_DIR_VAR);

    let config = BootstrapConfig::from_env().unwrap();
    assert_eq!(config.log_level, None);

    let harness = Harness::new();
    harness.run(&config.with_invoking_script("app/main.py")).result.unwrap();
    assert_eq!(harness.state.threshold(), SeverityLevel::Error);
}
