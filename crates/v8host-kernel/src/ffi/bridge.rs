use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::slice;

use v8host_core::{BootstrapConfig, BootstrapError, BootstrapResult, ConfigError, DataSource, ErrorCode};

use crate::kernel::module::init_module_with;

/// Decode the loader-supplied script path; empty means "not supplied"
fn script_path(ptr: *const u8, len: usize) -> BootstrapResult<Option<PathBuf>> {
    if ptr.is_null() || len == 0 {
        return Ok(None);
    }
    // SAFETY: the caller guarantees `ptr` points to `len` readable bytes.
    let bytes = unsafe { slice::from_raw_parts(ptr, len) };
    let path = std::str::from_utf8(bytes).map_err(|_| ConfigError::NotUnicode {
        var: "script_path".to_string(),
    })?;
    Ok(Some(PathBuf::from(path)))
}

/// Point the data source at the invoking script
///
/// Without a script the host must name the data directory explicitly; the
/// module never falls back to its own source location.
fn loader_config(script: Option<PathBuf>, config: BootstrapConfig) -> BootstrapResult<BootstrapConfig> {
    match script {
        Some(script) => Ok(config.with_invoking_script(script)),
        None if matches!(config.data_source, DataSource::Explicit(_)) => Ok(config),
        None => Err(BootstrapError::resource("", "invoking script unavailable")),
    }
}

fn load(script_ptr: *const u8, script_len: usize) -> BootstrapResult<()> {
    let script = script_path(script_ptr, script_len)?;
    let config = loader_config(script, BootstrapConfig::from_env()?)?;

    let module = init_module_with(&config)?;
    // The root isolate stays entered until the process exits.
    std::mem::forget(module);
    Ok(())
}

/// [FFI Adapter] Load the module for a host loader
///
/// `script_ptr`/`script_len` carry the UTF-8 path of the script importing the
/// module (null or empty when unknown). Returns an [`ErrorCode`], `0` on success.
#[no_mangle]
pub extern "C" fn v8host_init_module(script_ptr: *const u8, script_len: usize) -> u32 {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| load(script_ptr, script_len)));
    let code = match outcome {
        Ok(Ok(())) => ErrorCode::Success,
        Ok(Err(err)) => err.code(),
        Err(_) => BootstrapError::Internal("panic during module load".into()).code(),
    };
    code as u32
}
