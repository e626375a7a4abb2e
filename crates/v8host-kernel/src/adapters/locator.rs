//! External Data Locator
//!
//! Finds the directory holding the engine's locale data and startup snapshot,
//! then feeds both into the native engine. Relative paths are canonicalized
//! against the process working directory.
//!
//! An explicit directory from the loader is the primary source. Deriving the
//! directory from the invoking script (or from the Rust caller's source
//! location) keeps the data next to whatever script imports the module.

use std::env;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};

use tracing::debug;
use v8host_core::config::{LOCALE_DATA_FILE, SNAPSHOT_FILE};
use v8host_core::{BootstrapError, BootstrapResult, DataSource, NativeEngine};

/// Resolved, canonical external data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDataDir {
    dir: PathBuf,
}

impl ExternalDataDir {
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Expected location of the locale data file
    pub fn locale_data(&self) -> PathBuf {
        self.dir.join(LOCALE_DATA_FILE)
    }

    /// Expected location of the startup snapshot
    pub fn snapshot(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }
}

/// Resolves a [`DataSource`] against a working directory
#[derive(Debug, Clone)]
pub struct ExternalDataLocator {
    cwd: PathBuf,
}

impl ExternalDataLocator {
    /// Locator anchored at the current working directory
    pub fn from_current_dir() -> BootstrapResult<Self> {
        let cwd = env::current_dir().map_err(|e| BootstrapError::resource(".", e))?;
        Ok(Self { cwd })
    }

    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolve the data directory
    ///
    /// `caller` is only consulted for `DataSource::CallerLocation`.
    ///
    /// # Errors
    /// `ResourceLocation` when the path is empty or does not exist, or when a
    /// script path is not a file.
    pub fn resolve(&self, source: &DataSource, caller: &Location<'_>) -> BootstrapResult<ExternalDataDir> {
        match source {
            DataSource::Explicit(dir) => self.resolve_dir(dir),
            DataSource::InvokingScript(script) => self.resolve_script(script),
            DataSource::CallerLocation => self.resolve_script(Path::new(caller.file())),
        }
    }

    /// Canonical directory given directly
    pub fn resolve_dir(&self, dir: &Path) -> BootstrapResult<ExternalDataDir> {
        let dir = self.canonicalize(dir)?;
        if !dir.is_dir() {
            return Err(BootstrapError::resource(dir, "not a directory"));
        }
        Ok(ExternalDataDir { dir })
    }

    /// Parent directory of a canonicalized script path
    pub fn resolve_script(&self, script: &Path) -> BootstrapResult<ExternalDataDir> {
        let script = self.canonicalize(script)?;
        if !script.is_file() {
            return Err(BootstrapError::resource(script, "not a script file"));
        }
        match script.parent() {
            Some(parent) => Ok(ExternalDataDir {
                dir: parent.to_path_buf(),
            }),
            None => Err(BootstrapError::resource(script, "script path has no parent directory")),
        }
    }

    fn canonicalize(&self, path: &Path) -> BootstrapResult<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(BootstrapError::resource(path, "source path unavailable"));
        }
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };
        fs::canonicalize(&absolute).map_err(|e| BootstrapError::resource(absolute, e))
    }
}

/// Feed locale data and the startup snapshot into the engine
///
/// Both loads must happen before platform initialization.
pub fn load_external_data<E>(engine: &mut E, data: &ExternalDataDir) -> BootstrapResult<()>
where
    E: NativeEngine + ?Sized,
{
    debug!("load ICU data from {} ...", data.path().display());
    engine.load_locale_data(data.path())?;

    debug!("load external snapshot from {} ...", data.path().display());
    engine.load_startup_snapshot(data.path())?;

    Ok(())
}
