//! Result type alias for the anonymiser
//!
//! This module provides a convenient Result type alias that uses
//! AnonymiserError as the error type.

use super::errors::AnonymiserError;

/// Result type alias for anonymiser operations
///
/// # Examples
///
/// ```
/// use anonymiser::domain::result::Result;
/// use anonymiser::domain::errors::AnonymiserError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(AnonymiserError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, AnonymiserError>;
