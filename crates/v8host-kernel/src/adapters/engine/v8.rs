//! V8 backend.
//!
//! Drives the engine through `deno_core`'s re-exported `v8` bindings. The
//! platform and the engine are process-wide singletons; each is guarded by an
//! atomic flag so a second initialization fails instead of re-initializing.
//!
//! External data is read once and leaked: V8 keeps pointers into both blobs
//! for the rest of the process.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use deno_core::v8;
use tracing::trace;
use v8host_core::config::{LOCALE_DATA_FILE, SNAPSHOT_FILE};
use v8host_core::{BootstrapError, BootstrapResult, ExecutionIdentity, NativeEngine};

static PLATFORM_INITIALIZED: AtomicBool = AtomicBool::new(false);
static ENGINE_INITIALIZED: AtomicBool = AtomicBool::new(false);
static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Production engine backend
pub struct V8Engine {
    engine_id: u64,
    snapshot: Option<&'static [u8]>,
    isolate: Option<v8::OwnedIsolate>,
}

impl V8Engine {
    pub fn new() -> Self {
        Self {
            engine_id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
            snapshot: None,
            isolate: None,
        }
    }

    pub fn engine_id(&self) -> u64 {
        self.engine_id
    }

    /// Root isolate, once entered
    pub fn isolate(&mut self) -> Option<&mut v8::OwnedIsolate> {
        self.isolate.as_mut()
    }

    pub fn platform_initialized() -> bool {
        PLATFORM_INITIALIZED.load(Ordering::Acquire)
    }

    pub fn engine_initialized() -> bool {
        ENGINE_INITIALIZED.load(Ordering::Acquire)
    }
}

impl Default for V8Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for V8Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V8Engine")
            .field("engine_id", &self.engine_id)
            .field("snapshot_bytes", &self.snapshot.map(<[u8]>::len))
            .field("isolate_entered", &self.isolate.is_some())
            .finish()
    }
}

/// Read a data file and pin it for the process lifetime
fn read_static(dir: &Path, file: &str) -> BootstrapResult<&'static [u8]> {
    let path = dir.join(file);
    let bytes = fs::read(&path).map_err(|e| BootstrapError::resource(&path, e))?;
    if bytes.is_empty() {
        return Err(BootstrapError::resource(path, "file is empty"));
    }
    trace!("read {} bytes from {}", bytes.len(), path.display());
    Ok(Box::leak(bytes.into_boxed_slice()))
}

impl NativeEngine for V8Engine {
    fn name(&self) -> &'static str {
        "v8"
    }

    fn load_locale_data(&mut self, dir: &Path) -> BootstrapResult<()> {
        let data = read_static(dir, LOCALE_DATA_FILE)?;
        v8::icu::set_common_data_73(data).map_err(|code| {
            BootstrapError::resource(dir.join(LOCALE_DATA_FILE), format!("ICU rejected data (status {code})"))
        })
    }

    fn load_startup_snapshot(&mut self, dir: &Path) -> BootstrapResult<()> {
        self.snapshot = Some(read_static(dir, SNAPSHOT_FILE)?);
        Ok(())
    }

    fn initialize_platform(&mut self) -> BootstrapResult<()> {
        if PLATFORM_INITIALIZED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BootstrapError::PlatformInit("platform already initialized".into()));
        }

        let platform = v8::new_default_platform(0, false).make_shared();
        v8::V8::initialize_platform(platform);
        Ok(())
    }

    fn initialize_engine(&mut self) -> BootstrapResult<()> {
        if !Self::platform_initialized() {
            return Err(BootstrapError::EngineInit("platform not initialized".into()));
        }
        if ENGINE_INITIALIZED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BootstrapError::EngineInit("V8 already initialized".into()));
        }

        v8::V8::initialize();
        Ok(())
    }

    fn enter_root_isolate(&mut self) -> BootstrapResult<ExecutionIdentity> {
        if !Self::engine_initialized() {
            return Err(BootstrapError::RootContext("V8 not initialized".into()));
        }
        if self.isolate.is_some() {
            return Err(BootstrapError::RootContext("root isolate already entered".into()));
        }

        let mut params = v8::CreateParams::default();
        if let Some(snapshot) = self.snapshot {
            params = params.snapshot_blob(snapshot);
        }

        // OwnedIsolate enters itself on creation and exits on drop.
        self.isolate = Some(v8::Isolate::new(params));
        Ok(ExecutionIdentity::root(self.engine_id))
    }
}
