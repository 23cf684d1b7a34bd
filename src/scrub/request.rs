//! Scrub requests
//!
//! A [`ScrubRequest`] is the JSON contract a caller uses to describe one
//! subject: patient and third-party values by kind, allowlist and denylist
//! sources, and policy settings. Settings missing from the request fall back
//! to the configured [`ScrubSettings`].
//!
//! ```json
//! {
//!   "patient": { "phrases": ["Bob Hope"], "dates": ["1990-01-12"] },
//!   "third_party": { "codes": ["CB2 3EB"] },
//!   "denylist": { "words": ["secret"] },
//!   "scrub_all_dates": true,
//!   "replace_all_dates_with": "%b '%y"
//! }
//! ```

use crate::domain::errors::AnonymiserError;
use crate::domain::result::Result;
use crate::scrub::alternatives::Alternatives;
use crate::scrub::hasher::Hasher;
use crate::scrub::method::ScrubMethod;
use crate::scrub::nonspecific::{NonspecificConfig, NonspecificScrubber};
use crate::scrub::personalized::PersonalizedScrubber;
use crate::scrub::policy::{
    PolicyConfig, DEFAULT_REPLACEMENT_NONSPECIFIC, DEFAULT_REPLACEMENT_PATIENT,
    DEFAULT_REPLACEMENT_THIRD_PARTY,
};
use crate::scrub::wordlist::WordList;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Values of one subject class, by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectValues {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default)]
    pub non_numeric_phrases: Vec<String>,
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub codes: Vec<String>,
}

impl SubjectValues {
    /// Every value paired with the method its field implies
    pub fn by_method(&self) -> impl Iterator<Item = (ScrubMethod, &str)> {
        [
            (ScrubMethod::Date, &self.dates),
            (ScrubMethod::Phrase, &self.phrases),
            (ScrubMethod::PhraseUnlessNumeric, &self.non_numeric_phrases),
            (ScrubMethod::Words, &self.words),
            (ScrubMethod::Numeric, &self.numbers),
            (ScrubMethod::Code, &self.codes),
        ]
        .into_iter()
        .flat_map(|(method, values)| values.iter().map(move |v| (method, v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.by_method().next().is_none()
    }
}

/// Word list source: explicit words and/or files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSpec {
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl ListSpec {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.files.is_empty()
    }
}

/// Policy settings shared by the configuration file and requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrubSettings {
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

    #[serde(default)]
    pub string_max_regex_errors: usize,

    #[serde(default = "default_min_string_length_for_errors")]
    pub min_string_length_for_errors: usize,

    #[serde(default = "default_min_string_length_to_scrub_with")]
    pub min_string_length_to_scrub_with: usize,

    #[serde(default)]
    pub scrub_string_suffixes: Vec<String>,

    #[serde(default = "default_replace_patient")]
    pub replace_patient_info_with: String,

    #[serde(default = "default_replace_third_party")]
    pub replace_third_party_info_with: String,

    #[serde(default = "default_replace_nonspecific")]
    pub replace_nonspecific_info_with: String,

    /// strftime template for blurred dates
    #[serde(default)]
    pub replace_all_dates_with: Option<String>,

    #[serde(default)]
    pub scrub_all_numbers_of_n_digits: Vec<usize>,

    #[serde(default)]
    pub scrub_all_uk_postcodes: bool,

    #[serde(default)]
    pub scrub_all_dates: bool,

    /// Groups of interchangeable words, e.g. `[["street", "st"]]`
    #[serde(default)]
    pub alternatives: Vec<Vec<String>>,

    /// Scrub numeric-only PHRASE values
    #[serde(default)]
    pub scrub_numeric_phrases: bool,
}

impl Default for ScrubSettings {
    fn default() -> Self {
        Self {
            anonymise_codes_at_word_boundaries_only: true,
            anonymise_dates_at_word_boundaries_only: true,
            anonymise_numbers_at_word_boundaries_only: true,
            anonymise_numbers_at_numeric_boundaries_only: true,
            anonymise_strings_at_word_boundaries_only: true,
            string_max_regex_errors: 0,
            min_string_length_for_errors: default_min_string_length_for_errors(),
            min_string_length_to_scrub_with: default_min_string_length_to_scrub_with(),
            scrub_string_suffixes: Vec::new(),
            replace_patient_info_with: default_replace_patient(),
            replace_third_party_info_with: default_replace_third_party(),
            replace_nonspecific_info_with: default_replace_nonspecific(),
            replace_all_dates_with: None,
            scrub_all_numbers_of_n_digits: Vec::new(),
            scrub_all_uk_postcodes: false,
            scrub_all_dates: false,
            alternatives: Vec::new(),
            scrub_numeric_phrases: false,
        }
    }
}

impl ScrubSettings {
    /// Policy for subject-specific values
    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig {
            replacement_text_patient: self.replace_patient_info_with.clone(),
            replacement_text_third_party: self.replace_third_party_info_with.clone(),
            anonymise_codes_at_word_boundaries_only: self.anonymise_codes_at_word_boundaries_only,
            anonymise_dates_at_word_boundaries_only: self.anonymise_dates_at_word_boundaries_only,
            anonymise_numbers_at_word_boundaries_only: self
                .anonymise_numbers_at_word_boundaries_only,
            anonymise_numbers_at_numeric_boundaries_only: self
                .anonymise_numbers_at_numeric_boundaries_only,
            anonymise_strings_at_word_boundaries_only: self
                .anonymise_strings_at_word_boundaries_only,
            string_max_regex_errors: self.string_max_regex_errors,
            min_string_length_for_errors: self.min_string_length_for_errors,
            min_string_length_to_scrub_with: self.min_string_length_to_scrub_with,
            scrub_string_suffixes: self.scrub_string_suffixes.clone(),
            scrub_numeric_phrases: self.scrub_numeric_phrases,
        }
    }

    /// Settings of the generic detectors
    pub fn nonspecific_config(&self) -> NonspecificConfig {
        NonspecificConfig {
            replacement_text: self.replace_nonspecific_info_with.clone(),
            scrub_all_numbers_of_n_digits: self.scrub_all_numbers_of_n_digits.clone(),
            scrub_all_uk_postcodes: self.scrub_all_uk_postcodes,
            scrub_all_dates: self.scrub_all_dates,
            replacement_text_all_dates: self.replace_all_dates_with.clone(),
            anonymise_codes_at_word_boundaries_only: self.anonymise_codes_at_word_boundaries_only,
            anonymise_dates_at_word_boundaries_only: self.anonymise_dates_at_word_boundaries_only,
            anonymise_numbers_at_word_boundaries_only: self
                .anonymise_numbers_at_word_boundaries_only,
            anonymise_numbers_at_numeric_boundaries_only: self
                .anonymise_numbers_at_numeric_boundaries_only,
        }
    }

    /// Validate policy and detector settings
    pub fn validate(&self) -> Result<()> {
        self.policy().validate()?;
        self.nonspecific_config().validate()
    }
}

/// Allowlist and denylist built once and shared between scrubbers
#[derive(Debug, Clone, Default)]
pub struct SharedLists {
    pub allowlist: Option<Arc<WordList>>,
    pub denylist: Option<Arc<WordList>>,
}

/// One subject's scrub request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrubRequest {
    #[serde(default)]
    pub patient: SubjectValues,

    #[serde(default)]
    pub third_party: SubjectValues,

    #[serde(default)]
    pub allowlist: ListSpec,

    #[serde(default)]
    pub denylist: ListSpec,

    #[serde(flatten)]
    pub settings: ScrubSettings,
}

impl ScrubRequest {
    /// Parse a request, taking unset settings from `defaults`
    ///
    /// # Errors
    ///
    /// `Serialization` if the JSON is malformed or not an object.
    pub fn from_json_with_defaults(json: &str, defaults: &ScrubSettings) -> Result<Self> {
        let Value::Object(overrides) = serde_json::from_str::<Value>(json)? else {
            return Err(AnonymiserError::Serialization(
                "scrub request must be a JSON object".to_string(),
            ));
        };

        let mut merged = serde_json::to_value(defaults)?;
        if let Value::Object(base) = &mut merged {
            base.extend(overrides);
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// Build the allowlist and denylist
    ///
    /// # Errors
    ///
    /// `Configuration` if a list file cannot be read.
    pub fn prepare_lists(&self, hasher: &dyn Hasher) -> Result<SharedLists> {
        let allowlist = if self.allowlist.is_empty() {
            None
        } else {
            Some(Arc::new(
                WordList::builder("allowlist")
                    .words(self.allowlist.words.iter().cloned())
                    .files(self.allowlist.files.iter().cloned())
                    .build(hasher)?,
            ))
        };

        let denylist = if self.denylist.is_empty() {
            None
        } else {
            Some(Arc::new(
                WordList::builder("denylist")
                    .words(self.denylist.words.iter().cloned())
                    .files(self.denylist.files.iter().cloned())
                    .fuzzy_policy(self.settings.policy().string_policy())
                    .build(hasher)?,
            ))
        };

        Ok(SharedLists {
            allowlist,
            denylist,
        })
    }

    /// Build a scrubber loaded with this request's values
    pub fn build_scrubber(&self, hasher: Arc<dyn Hasher>) -> Result<PersonalizedScrubber> {
        let lists = self.prepare_lists(hasher.as_ref())?;
        self.build_scrubber_with(hasher, &lists)
    }

    /// Build a scrubber reusing already prepared lists
    ///
    /// # Errors
    ///
    /// `Configuration` if the settings are invalid.
    pub fn build_scrubber_with(
        &self,
        hasher: Arc<dyn Hasher>,
        lists: &SharedLists,
    ) -> Result<PersonalizedScrubber> {
        let nonspecific = NonspecificScrubber::new(
            Arc::clone(&hasher),
            self.settings.nonspecific_config(),
            lists.denylist.clone(),
        )?;

        let mut scrubber = PersonalizedScrubber::builder(hasher)
            .policy(self.settings.policy())
            .alternatives(Alternatives::new(&self.settings.alternatives))
            .allowlist(lists.allowlist.clone())
            .nonspecific(nonspecific)
            .build()?;

        for (method, value) in self.patient.by_method() {
            scrubber.add_value(value, method, true);
        }
        for (method, value) in self.third_party.by_method() {
            scrubber.add_value(value, method, false);
        }

        Ok(scrubber)
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_min_string_length_for_errors() -> usize {
    4
}

fn default_min_string_length_to_scrub_with() -> usize {
    2
}

fn default_replace_patient() -> String {
    DEFAULT_REPLACEMENT_PATIENT.to_string()
}

fn default_replace_third_party() -> String {
    DEFAULT_REPLACEMENT_THIRD_PARTY.to_string()
}

fn default_replace_nonspecific() -> String {
    DEFAULT_REPLACEMENT_NONSPECIFIC.to_string()
}
