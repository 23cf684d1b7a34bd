//! Identifier scrubbing engine
//!
//! Removes patient- and third-party-identifying information from free text,
//! given the known identifying values of a subject plus global allow/deny
//! lists and generic detectors (N-digit numbers, UK postcodes, dates).
//!
//! The pipeline for one document, in order:
//!
//! 1. patient values -> patient replacement
//! 2. third-party values -> third-party replacement
//! 3. denylist words, N-digit numbers, UK postcodes, dates -> non-specific
//!    replacement (dates optionally blurred through a template)
//!
//! Values on the allowlist never contribute a pattern.

pub mod alternatives;
pub mod audit;
pub mod builder;
pub mod compiled;
pub mod dates;
pub mod fuzzy;
pub mod hasher;
pub mod method;
pub mod nonspecific;
pub mod normalize;
pub mod personalized;
pub mod policy;
pub mod request;
pub mod wordlist;

pub use alternatives::Alternatives;
pub use audit::AuditLogger;
pub use builder::{PatternBuilder, PatternFragment};
pub use compiled::ScrubCounts;
pub use hasher::{Hasher, Sha256Hasher};
pub use method::{ScrubEntry, ScrubMethod, SubjectClass};
pub use nonspecific::{NonspecificConfig, NonspecificScrubber};
pub use normalize::{alphanumeric_of, digits_of};
pub use personalized::{PersonalizedScrubber, ScrubOutcome};
pub use policy::{PolicyConfig, StringPolicy};
pub use request::{ScrubRequest, ScrubSettings, SharedLists};
pub use wordlist::WordList;
