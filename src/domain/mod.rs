//! Domain error and result types for the anonymiser.
//!
//! All fallible operations return [`Result<T, AnonymiserError>`]:
//!
//! ```rust
//! use anonymiser::domain::{AnonymiserError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(AnonymiserError::Configuration("missing hashing key".to_string()))
//! }
//! ```

pub mod errors;
pub mod result;

pub use errors::AnonymiserError;
pub use result::Result;
