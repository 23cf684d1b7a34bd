//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted file logs
//! - Configurable log levels
//! - Local file logging with rotation
//!
//! Scrub values never appear in log output. Anything that has to point at a
//! value logs its keyed hash.
//!
//! # Example
//!
//! ```no_run
//! use anonymiser::logging::init_logging;
//! use anonymiser::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a scrub value that produced no pattern
///
/// # Example
///
/// ```no_run
/// use anonymiser::log_value_dropped;
/// use anonymiser::domain::AnonymiserError;
///
/// let error = AnonymiserError::InvalidValue("not a date".to_string());
/// log_value_dropped!("3f1c9a", "DATE", error);
/// ```
#[macro_export]
macro_rules! log_value_dropped {
    ($value_hash:expr, $kind:expr, $error:expr) => {
        tracing::warn!(
            value_hash = %$value_hash,
            kind = %$kind,
            error = %$error,
            "Scrub value dropped"
        );
    };
}

/// Log the replacement counts of one scrubbed document
///
/// # Example
///
/// ```no_run
/// use anonymiser::log_scrub_complete;
/// use anonymiser::scrub::ScrubCounts;
///
/// let counts = ScrubCounts::default();
/// log_scrub_complete!(counts);
/// ```
#[macro_export]
macro_rules! log_scrub_complete {
    ($counts:expr) => {
        tracing::debug!(
            patient = $counts.patient,
            third_party = $counts.third_party,
            denylist = $counts.denylist,
            numbers = $counts.numbers,
            postcodes = $counts.postcodes,
            dates = $counts.dates,
            total = $counts.total(),
            "Scrub completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use anonymiser::log_error_with_context;
/// use anonymiser::domain::AnonymiserError;
///
/// let error = AnonymiserError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
