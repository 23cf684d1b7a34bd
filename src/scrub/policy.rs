//! Matching policy for subject-specific scrubbing
//!
//! A [`PolicyConfig`] is fixed per scrubber instance. The builders work on
//! narrower views of it ([`StringPolicy`], [`NumberPolicy`]) so that word
//! lists can carry their own string policy.

use crate::domain::errors::AnonymiserError;
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};

/// Default replacement for patient identifiers
pub const DEFAULT_REPLACEMENT_PATIENT: &str = "[__PPP__]";
/// Default replacement for third-party identifiers
pub const DEFAULT_REPLACEMENT_THIRD_PARTY: &str = "[__TTT__]";
/// Default replacement for denylist words and generic detectors
pub const DEFAULT_REPLACEMENT_NONSPECIFIC: &str = "[~~~]";

/// Largest edit distance accepted for fuzzy string matching
pub const MAX_STRING_REGEX_ERRORS: usize = 5;

/// Policy flags, fuzziness limits, suffixes and replacement texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Replacement for patient-class matches
    #[serde(default = "default_replacement_patient")]
    pub replacement_text_patient: String,

    /// Replacement for third-party-class matches
    #[serde(default = "default_replacement_third_party")]
    pub replacement_text_third_party: String,

    #[serde(default = "default_true")]
    pub anonymise_codes_at_word_boundaries_only: bool,

    #[serde(default = "default_true")]
    pub anonymise_dates_at_word_boundaries_only: bool,

    #[serde(default = "default_true")]
    pub anonymise_numbers_at_word_boundaries_only: bool,

    #[serde(default = "default_true")]
    pub anonymise_numbers_at_numeric_boundaries_only: bool,

    #[serde(default = "default_true")]
    pub anonymise_strings_at_word_boundaries_only: bool,

    /// Maximum insertions/deletions/substitutions for string tokens
    #[serde(default)]
    pub string_max_regex_errors: usize,

    /// Tokens shorter than this are matched exactly
    #[serde(default = "default_min_string_length_for_errors")]
    pub min_string_length_for_errors: usize,

    /// WORDS tokens shorter than this are not scrubbed at all
    #[serde(default = "default_min_string_length_to_scrub_with")]
    pub min_string_length_to_scrub_with: usize,

    /// Optional suffixes accepted after string matches (e.g. "s")
    #[serde(default)]
    pub scrub_string_suffixes: Vec<String>,

    /// Global "scrub all numbers" switch: numeric-only PHRASE values are
    /// scrubbed when set. PHRASE_UNLESS_NUMERIC ignores it.
    #[serde(default)]
    pub scrub_numeric_phrases: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            replacement_text_patient: default_replacement_patient(),
            replacement_text_third_party: default_replacement_third_party(),
            anonymise_codes_at_word_boundaries_only: true,
            anonymise_dates_at_word_boundaries_only: true,
            anonymise_numbers_at_word_boundaries_only: true,
            anonymise_numbers_at_numeric_boundaries_only: true,
            anonymise_strings_at_word_boundaries_only: true,
            string_max_regex_errors: 0,
            min_string_length_for_errors: default_min_string_length_for_errors(),
            min_string_length_to_scrub_with: default_min_string_length_to_scrub_with(),
            scrub_string_suffixes: Vec::new(),
            scrub_numeric_phrases: false,
        }
    }
}

impl PolicyConfig {
    /// Validate the policy
    ///
    /// # Errors
    ///
    /// Returns a configuration error for fuzziness beyond
    /// [`MAX_STRING_REGEX_ERRORS`], for a fuzzy threshold that would let a
    /// token be rewritten entirely, and for empty suffixes.
    pub fn validate(&self) -> Result<()> {
        self.string_policy().validate()
    }

    /// String matching view, used for phrases, words and word lists
    pub fn string_policy(&self) -> StringPolicy {
        StringPolicy {
            at_word_boundaries_only: self.anonymise_strings_at_word_boundaries_only,
            max_errors: self.string_max_regex_errors,
            min_length_for_errors: self.min_string_length_for_errors,
            suffixes: self.scrub_string_suffixes.clone(),
        }
    }

    /// Number matching view
    pub fn number_policy(&self) -> NumberPolicy {
        NumberPolicy {
            at_word_boundaries_only: self.anonymise_numbers_at_word_boundaries_only,
            at_numeric_boundaries_only: self.anonymise_numbers_at_numeric_boundaries_only,
        }
    }
}

/// How string tokens are matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringPolicy {
    pub at_word_boundaries_only: bool,
    pub max_errors: usize,
    pub min_length_for_errors: usize,
    pub suffixes: Vec<String>,
}

impl Default for StringPolicy {
    fn default() -> Self {
        PolicyConfig::default().string_policy()
    }
}

impl StringPolicy {
    /// Exact matching at word boundaries with no suffixes
    pub fn exact() -> Self {
        Self {
            at_word_boundaries_only: true,
            max_errors: 0,
            min_length_for_errors: default_min_string_length_for_errors(),
            suffixes: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_errors > MAX_STRING_REGEX_ERRORS {
            return Err(AnonymiserError::Configuration(format!(
                "string_max_regex_errors must be <= {MAX_STRING_REGEX_ERRORS}, got {}",
                self.max_errors
            )));
        }

        if self.max_errors > 0 && self.min_length_for_errors <= self.max_errors {
            return Err(AnonymiserError::Configuration(format!(
                "min_string_length_for_errors ({}) must exceed string_max_regex_errors ({})",
                self.min_length_for_errors, self.max_errors
            )));
        }

        if self.suffixes.iter().any(|s| s.trim().is_empty()) {
            return Err(AnonymiserError::Configuration(
                "scrub_string_suffixes cannot contain empty suffixes".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether a token of `len` characters gets bounded-error matching
    pub fn allows_errors_for(&self, len: usize) -> bool {
        self.max_errors > 0 && len >= self.min_length_for_errors
    }
}

/// How digit sequences are anchored
///
/// Both flags apply independently. Word boundaries are the stricter of the
/// two: a word boundary next to a digit already excludes a neighbouring digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberPolicy {
    pub at_word_boundaries_only: bool,
    pub at_numeric_boundaries_only: bool,
}

impl Default for NumberPolicy {
    fn default() -> Self {
        Self {
            at_word_boundaries_only: true,
            at_numeric_boundaries_only: true,
        }
    }
}

// Default value functions
fn default_replacement_patient() -> String {
    DEFAULT_REPLACEMENT_PATIENT.to_string()
}

fn default_replacement_third_party() -> String {
    DEFAULT_REPLACEMENT_THIRD_PARTY.to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_string_length_for_errors() -> usize {
    4
}

fn default_min_string_length_to_scrub_with() -> usize {
    2
}
