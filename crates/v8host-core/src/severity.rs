//! # Severity Model
//!
//! Ordered diagnostic levels shared by every emission site of the embedding.
//! Text conversion is exact and case-sensitive over the six literals; there is
//! no prefix matching and no whitespace trimming.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Diagnostic severity, totally ordered from most to least verbose.
///
/// `#[repr(u8)]` lets the process-wide threshold live in an atomic cell.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warning = 3,
    Error = 4,
    Fatal = 5,
}

impl SeverityLevel {
    /// Every level, in ascending order
    pub const ALL: [SeverityLevel; 6] = [
        SeverityLevel::Trace,
        SeverityLevel::Debug,
        SeverityLevel::Info,
        SeverityLevel::Warning,
        SeverityLevel::Error,
        SeverityLevel::Fatal,
    ];

    /// Compiled-in threshold used when no level is configured
    pub const DEFAULT_THRESHOLD: SeverityLevel = SeverityLevel::Error;

    /// Recover a level from its `repr(u8)` discriminant.
    ///
    /// Out-of-range values saturate to `Fatal`.
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => SeverityLevel::Trace,
            1 => SeverityLevel::Debug,
            2 => SeverityLevel::Info,
            3 => SeverityLevel::Warning,
            4 => SeverityLevel::Error,
            _ => SeverityLevel::Fatal,
        }
    }

    /// `true` when this threshold lets DEBUG records through
    pub fn is_debug_or_more_verbose(self) -> bool {
        self <= SeverityLevel::Debug
    }
}

/// Parse one of the six severity literals.
///
/// # Errors
/// `ConfigError::InvalidSeverity` carrying the rejected text.
pub fn parse_severity(text: &str) -> Result<SeverityLevel, ConfigError> {
    match text {
        "TRACE" => Ok(SeverityLevel::Trace),
        "DEBUG" => Ok(SeverityLevel::Debug),
        "INFO" => Ok(SeverityLevel::Info),
        "WARNING" => Ok(SeverityLevel::Warning),
        "ERROR" => Ok(SeverityLevel::Error),
        "FATAL" => Ok(SeverityLevel::Fatal),
        other => Err(ConfigError::InvalidSeverity(other.to_string())),
    }
}

/// Literal text for a level; exact inverse of [`parse_severity`].
pub const fn format_severity(level: SeverityLevel) -> &'static str {
    match level {
        SeverityLevel::Trace => "TRACE",
        SeverityLevel::Debug => "DEBUG",
        SeverityLevel::Info => "INFO",
        SeverityLevel::Warning => "WARNING",
        SeverityLevel::Error => "ERROR",
        SeverityLevel::Fatal => "FATAL",
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(format_severity(*self))
    }
}

impl FromStr for SeverityLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_severity(s)
    }
}

impl Default for SeverityLevel {
    fn default() -> Self {
        Self::DEFAULT_THRESHOLD
    }
}

impl Serialize for SeverityLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(format_severity(*self))
    }
}

impl<'de> Deserialize<'de> for SeverityLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_severity(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_round_trip() {
        for literal in ["TRACE", "DEBUG", "INFO", "WARNING", "ERROR", "FATAL"] {
            let level = parse_severity(literal).unwrap();
            assert_eq!(format_severity(level), literal);
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        for text in ["debug", "Debug", "warning", "fatal", "eRROR"] {
            assert!(parse_severity(text).is_err(), "{text} must be rejected");
        }
    }

    #[test]
    fn parse_rejects_prefixes_and_padding() {
        for text in ["", "WARN", "DEB", " DEBUG", "DEBUG ", "VERBOSE"] {
            assert!(parse_severity(text).is_err(), "{text:?} must be rejected");
        }
    }

    #[test]
    fn rejected_text_is_reported() {
        let err = parse_severity("VERBOSE").unwrap_err();
        assert_eq!(err, ConfigError::InvalidSeverity("VERBOSE".to_string()));
        assert!(err.to_string().contains("VERBOSE"));
    }

    #[test]
    fn levels_are_totally_ordered() {
        for pair in SeverityLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn discriminant_round_trip() {
        for level in SeverityLevel::ALL {
            assert_eq!(SeverityLevel::from_u8(level as u8), level);
        }
        assert_eq!(SeverityLevel::from_u8(200), SeverityLevel::Fatal);
    }

    #[test]
    fn default_threshold_is_error() {
        assert_eq!(SeverityLevel::default(), SeverityLevel::Error);
        assert!(!SeverityLevel::Error.is_debug_or_more_verbose());
        assert!(SeverityLevel::Debug.is_debug_or_more_verbose());
        assert!(SeverityLevel::Trace.is_debug_or_more_verbose());
    }

    #[test]
    fn serde_uses_literals() {
        let json = serde_json::to_string(&SeverityLevel::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
        let level: SeverityLevel = serde_json::from_str("\"TRACE\"").unwrap();
        assert_eq!(level, SeverityLevel::Trace);
        assert!(serde_json::from_str::<SeverityLevel>("\"trace\"").is_err());
    }
}
