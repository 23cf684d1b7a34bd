//! Configuration management for the anonymiser.
//!
//! TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `ANONYMISER_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use anonymiser::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("anonymiser.toml")?;
//! println!("Workers: {}", config.application.workers);
//! println!("Max string errors: {}", config.scrubber.string_max_regex_errors);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and worker count
//! - [`HashingConfig`] - Secret key for config hashes and log references
//! - `scrubber` - Default [`ScrubSettings`](crate::scrub::ScrubSettings); requests override them
//! - [`AuditConfig`] - Per-document audit trail
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! workers = 4
//!
//! [hashing]
//! key = "${ANONYMISER_HASH_KEY}"
//!
//! [scrubber]
//! string_max_regex_errors = 1
//! scrub_all_numbers_of_n_digits = [10]
//! scrub_all_uk_postcodes = true
//!
//! [audit]
//! enabled = true
//! log_path = "/var/log/anonymiser/audit.log"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{AnonymiserConfig, ApplicationConfig, AuditConfig, HashingConfig, LoggingConfig};
pub use secret::{secret_string, SecretString, SecretValue};
