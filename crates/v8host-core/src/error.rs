//! # Unified Error Types & Codes
//!
//! Every bootstrap failure is fatal and propagates to the module loader.
//! `BootstrapError` is the Rust-side error; `ErrorCode` is its FFI-compatible
//! (u32) projection returned across the C entry point.

use std::fmt;
use std::path::PathBuf;

/// Configuration errors raised while reading loader/environment input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Severity text matched none of the six literals
    #[error("invalid severity level: {0:?} (expected one of TRACE, DEBUG, INFO, WARNING, ERROR, FATAL)")]
    InvalidSeverity(String),

    /// Environment variable is set but not valid unicode
    #[error("environment variable {var} is not valid unicode")]
    NotUnicode { var: String },

    /// Environment variable is set but empty where a value is required
    #[error("environment variable {var} is empty")]
    EmptyValue { var: String },
}

/// Bootstrap failure taxonomy
///
/// Nothing here is recovered locally; the sequencer records the failed stage
/// and hands the error to the loader.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Unparseable configuration; raised before any sink is attached
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// External data directory or file could not be resolved
    #[error("cannot locate external data at {}: {reason}", path.display())]
    ResourceLocation { path: PathBuf, reason: String },

    /// Native platform initialization failed
    #[error("platform initialization failed: {0}")]
    PlatformInit(String),

    /// Native engine initialization failed
    #[error("engine initialization failed: {0}")]
    EngineInit(String),

    /// Root execution unit could not be created or entered
    #[error("root execution unit failed: {0}")]
    RootContext(String),

    /// A capability module failed to expose its surface
    #[error("capability {capability} failed to expose: {reason}")]
    CapabilityRegistration { capability: String, reason: String },

    /// Capability prerequisites are cyclic or reference unknown modules
    #[error("capability ordering failed: {0}")]
    CapabilityOrdering(String),

    /// Two capabilities exported the same symbol into the module namespace
    #[error("symbol {symbol} exported by {capability} is already owned by {owner}")]
    DuplicateSymbol {
        symbol: String,
        owner: String,
        capability: String,
    },

    /// The process entry point was invoked more than once
    #[error("module already initialized in this process")]
    AlreadyInitialized,

    /// Unexpected internal failure (panic at the FFI boundary, broken invariant)
    #[error("internal error: {0}")]
    Internal(String),
}

impl BootstrapError {
    /// Build a `ResourceLocation` error from any displayable reason
    pub fn resource(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        BootstrapError::ResourceLocation {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// FFI code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            BootstrapError::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            BootstrapError::ResourceLocation { .. } => ErrorCode::ResourceLocation,
            BootstrapError::PlatformInit(_) => ErrorCode::PlatformInit,
            BootstrapError::EngineInit(_) => ErrorCode::EngineInit,
            BootstrapError::RootContext(_) => ErrorCode::RootContext,
            BootstrapError::CapabilityRegistration { .. } => ErrorCode::CapabilityRegistration,
            BootstrapError::CapabilityOrdering(_) => ErrorCode::CapabilityOrdering,
            BootstrapError::DuplicateSymbol { .. } => ErrorCode::DuplicateSymbol,
            BootstrapError::AlreadyInitialized => ErrorCode::AlreadyInitialized,
            BootstrapError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// `true` for failures inside the native engine itself
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            BootstrapError::PlatformInit(_)
                | BootstrapError::EngineInit(_)
                | BootstrapError::RootContext(_)
        )
    }
}

/// Bootstrap error codes for the FFI boundary
///
/// `#[repr(u32)]` keeps the values stable for C callers.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Module loaded (0x0000)
    Success = 0,

    // === Configuration (1000) ===
    InvalidConfiguration = 1000,

    // === Resource location (2000) ===
    ResourceLocation = 2000,

    // === Native initialization (3000) ===
    PlatformInit = 3000,
    EngineInit = 3001,
    RootContext = 3002,

    // === Capability registration (4000) ===
    CapabilityRegistration = 4000,
    CapabilityOrdering = 4001,
    DuplicateSymbol = 4002,

    // === Lifecycle (5000) ===
    AlreadyInitialized = 5000,

    // === Internal (9000) ===
    Internal = 9000,
}

impl ErrorCode {
    /// Convert a raw code back to its variant (unknown codes map to `Internal`)
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => ErrorCode::Success,
            1000 => ErrorCode::InvalidConfiguration,
            2000 => ErrorCode::ResourceLocation,
            3000 => ErrorCode::PlatformInit,
            3001 => ErrorCode::EngineInit,
            3002 => ErrorCode::RootContext,
            4000 => ErrorCode::CapabilityRegistration,
            4001 => ErrorCode::CapabilityOrdering,
            4002 => ErrorCode::DuplicateSymbol,
            5000 => ErrorCode::AlreadyInitialized,
            _ => ErrorCode::Internal,
        }
    }

    /// Human-readable message
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::InvalidConfiguration => "Invalid configuration",
            ErrorCode::ResourceLocation => "External data not found",
            ErrorCode::PlatformInit => "Platform initialization failed",
            ErrorCode::EngineInit => "Engine initialization failed",
            ErrorCode::RootContext => "Root execution unit failed",
            ErrorCode::CapabilityRegistration => "Capability registration failed",
            ErrorCode::CapabilityOrdering => "Capability ordering failed",
            ErrorCode::DuplicateSymbol => "Duplicate module symbol",
            ErrorCode::AlreadyInitialized => "Module already initialized",
            ErrorCode::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorCode::{:?} ({}): {}", self, *self as u32, self.message())
    }
}

/// Bootstrap Result type for convenience
pub type BootstrapResult<T> = Result<T, BootstrapError>;
