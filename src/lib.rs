// Anonymiser - Identifier scrubbing for clinical free text
// Copyright (c) 2025 Anonymiser Contributors
// Licensed under the MIT License

//! # Anonymiser - identifier scrubbing for clinical free text
//!
//! Removes patient- and third-party-identifying information from free text,
//! given the subject's known identifying values (names, addresses, dates,
//! codes, numbers) plus global allow/deny lists and generic detectors for
//! dates, UK postcodes and N-digit numbers.
//!
//! ## Architecture
//!
//! - [`scrub`] - Pattern builders, word lists and the two scrubbers
//! - [`domain`] - Error and result types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`cli`] - Command-line interface
//!
//! ## Quick Start
//!
//! ```rust
//! use anonymiser::config::secret_string;
//! use anonymiser::scrub::{
//!     Hasher, NonspecificConfig, NonspecificScrubber, PersonalizedScrubber, ScrubMethod,
//!     Sha256Hasher,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> anonymiser::domain::Result<()> {
//! let hasher: Arc<dyn Hasher> = Arc::new(Sha256Hasher::new(secret_string("key".into())));
//! let nonspecific = NonspecificScrubber::new(
//!     Arc::clone(&hasher),
//!     NonspecificConfig {
//!         scrub_all_uk_postcodes: true,
//!         ..Default::default()
//!     },
//!     None,
//! )?;
//!
//! let mut scrubber = PersonalizedScrubber::builder(hasher)
//!     .nonspecific(nonspecific)
//!     .build()?;
//! scrubber.add_value("Alice Smith", ScrubMethod::Words, true);
//!
//! assert_eq!(
//!     scrubber.scrub("Smith, Alice of CB2 3EB"),
//!     "[__PPP__], [__PPP__] of [~~~]"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Scrub values are never logged. When a value has to be referenced (for
//! example a value whose pattern failed to compile) the log carries its
//! keyed hash instead.

pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
pub mod scrub;
