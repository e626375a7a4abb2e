//! # Bootstrap Configuration
//!
//! Everything the sequencer needs from the loader, read once at module load.
//! The severity text is kept raw here; it is parsed by the first bootstrap
//! stage so a bad value aborts the load at that stage.

use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variable holding the diagnostic threshold
pub const LOG_LEVEL_VAR: &str = "V8HOST_LOG";

/// Environment variable holding an explicit external data directory
pub const DATA_DIR_VAR: &str = "V8HOST_DATA_DIR";

/// Locale data file expected in the external data directory
pub const LOCALE_DATA_FILE: &str = "icudtl.dat";

/// Startup snapshot file expected in the external data directory
pub const SNAPSHOT_FILE: &str = "snapshot_blob.bin";

/// Where the external data directory comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// Directory supplied by the loader or configuration
    Explicit(PathBuf),
    /// Source file of the invoking script; its parent directory holds the data
    InvokingScript(PathBuf),
    /// Source location of the Rust call into the module entry point
    #[default]
    CallerLocation,
}

/// Loader-supplied bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Raw severity text (`None` keeps the compiled-in default)
    pub log_level: Option<String>,
    /// External data directory source
    pub data_source: DataSource,
}

impl BootstrapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the process environment
    ///
    /// # Errors
    /// A variable that is set but not unicode, or an empty data directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var_os(name))
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let log_level = lookup(LOG_LEVEL_VAR)
            .map(|value| {
                value.into_string().map_err(|_| ConfigError::NotUnicode {
                    var: LOG_LEVEL_VAR.to_string(),
                })
            })
            .transpose()?;

        let data_source = match lookup(DATA_DIR_VAR) {
            Some(dir) if dir.is_empty() => {
                return Err(ConfigError::EmptyValue {
                    var: DATA_DIR_VAR.to_string(),
                })
            }
            Some(dir) => DataSource::Explicit(PathBuf::from(dir)),
            None => DataSource::CallerLocation,
        };

        Ok(Self {
            log_level,
            data_source,
        })
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_source = DataSource::Explicit(dir.into());
        self
    }

    /// Use the invoking script's location unless an explicit directory is set
    pub fn with_invoking_script(mut self, script: impl Into<PathBuf>) -> Self {
        if !matches!(self.data_source, DataSource::Explicit(_)) {
            self.data_source = DataSource::InvokingScript(script.into());
        }
        self
    }
}
