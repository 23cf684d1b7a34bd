//! Domain error types
//!
//! This module defines the error hierarchy for the anonymiser. Errors never
//! carry raw identifying values: when a value has to be referenced, callers
//! log its keyed hash instead.

use thiserror::Error;

/// Main anonymiser error type
///
/// Configuration errors are fatal and propagate to the caller. Pattern
/// compilation and template errors are recoverable at single-value or
/// single-match granularity and are normally logged and absorbed by the
/// scrubbers.
#[derive(Debug, Error)]
pub enum AnonymiserError {
    /// Invalid construction: unreadable word-list file, unknown scrub method,
    /// contradictory policy flags
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A generated pattern fragment failed to compile
    #[error("Pattern compilation error: {0}")]
    PatternCompilation(String),

    /// A date-blurring template could not be rendered
    #[error("Date template error: {0}")]
    TemplateFormat(String),

    /// A scrub value cannot be turned into patterns (e.g. unparseable date)
    #[error("Invalid scrub value: {0}")]
    InvalidValue(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AnonymiserError {
    /// Whether the error only affects a single value or match
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PatternCompilation(_) | Self::TemplateFormat(_) | Self::InvalidValue(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for AnonymiserError {
    fn from(err: std::io::Error) -> Self {
        AnonymiserError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for AnonymiserError {
    fn from(err: serde_json::Error) -> Self {
        AnonymiserError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for AnonymiserError {
    fn from(err: toml::de::Error) -> Self {
        AnonymiserError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<fancy_regex::Error> for AnonymiserError {
    fn from(err: fancy_regex::Error) -> Self {
        AnonymiserError::PatternCompilation(err.to_string())
    }
}
