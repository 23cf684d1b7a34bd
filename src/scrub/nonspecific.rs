//! Non-specific scrubbing: denylist words and generic detectors
//!
//! Stages run in a fixed order over the same text: denylist words, each
//! configured N-digit number length, UK postcodes, then dates. Dates can be
//! blurred through a strftime template instead of being replaced outright.

use crate::domain::errors::AnonymiserError;
use crate::domain::result::Result;
use crate::log_value_dropped;
use crate::scrub::builder::{n_digit_source, uk_postcode_source, PatternFragment};
use crate::scrub::compiled::{PatternSet, Redactor, ScrubCounts};
use crate::scrub::dates::{generic_date_source, parse_date_text, render_date};
use crate::scrub::hasher::Hasher;
use crate::scrub::policy::{NumberPolicy, DEFAULT_REPLACEMENT_NONSPECIFIC};
use crate::scrub::wordlist::WordList;
use chrono::NaiveDate;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Settings of the generic detectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonspecificConfig {
    #[serde(default = "default_replacement")]
    pub replacement_text: String,

    /// Lengths of digit runs to scrub wherever they occur
    #[serde(default)]
    pub scrub_all_numbers_of_n_digits: Vec<usize>,

    #[serde(default)]
    pub scrub_all_uk_postcodes: bool,

    #[serde(default)]
    pub scrub_all_dates: bool,

    /// strftime template for blurred dates, e.g. `%b '%y`
    #[serde(default)]
    pub replacement_text_all_dates: Option<String>,

    #[serde(default = "default_true")]
    pub anonymise_codes_at_word_boundaries_only: bool,

    #[serde(default = "default_true")]
    pub anonymise_dates_at_word_boundaries_only: bool,

    #[serde(default = "default_true")]
    pub anonymise_numbers_at_word_boundaries_only: bool,

    #[serde(default = "default_true")]
    pub anonymise_numbers_at_numeric_boundaries_only: bool,
}

impl Default for NonspecificConfig {
    fn default() -> Self {
        Self {
            replacement_text: default_replacement(),
            scrub_all_numbers_of_n_digits: Vec::new(),
            scrub_all_uk_postcodes: false,
            scrub_all_dates: false,
            replacement_text_all_dates: None,
            anonymise_codes_at_word_boundaries_only: true,
            anonymise_dates_at_word_boundaries_only: true,
            anonymise_numbers_at_word_boundaries_only: true,
            anonymise_numbers_at_numeric_boundaries_only: true,
        }
    }
}

impl NonspecificConfig {
    /// Validate detector settings
    ///
    /// A zero digit length is an error. A date template that cannot be used
    /// is only warned about: matches then fall back to the fixed replacement.
    pub fn validate(&self) -> Result<()> {
        if self.scrub_all_numbers_of_n_digits.contains(&0) {
            return Err(AnonymiserError::Configuration(
                "scrub_all_numbers_of_n_digits cannot contain 0".to_string(),
            ));
        }

        if let Some(template) = &self.replacement_text_all_dates {
            if !self.scrub_all_dates {
                warn!("Date replacement template is set but scrub_all_dates is disabled");
            }
            let reference = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
            if let Err(err) = render_date(template, reference) {
                warn!(error = %err, "Date replacement template is unusable; dates will use the fixed replacement");
            }
        }

        Ok(())
    }

    fn number_policy(&self) -> NumberPolicy {
        NumberPolicy {
            at_word_boundaries_only: self.anonymise_numbers_at_word_boundaries_only,
            at_numeric_boundaries_only: self.anonymise_numbers_at_numeric_boundaries_only,
        }
    }
}

struct NonspecificPatterns {
    denylist: PatternSet,
    numbers: PatternSet,
    postcodes: PatternSet,
    dates: PatternSet,
}

/// Denylist plus generic detectors
///
/// Compiled patterns are cached and rebuilt on first use after a change.
/// An instance is owned by one worker; it is `Send` but not `Sync`.
pub struct NonspecificScrubber {
    hasher: Arc<dyn Hasher>,
    config: NonspecificConfig,
    denylist: Option<Arc<WordList>>,
    allowlist: Option<Arc<WordList>>,
    compiled: OnceCell<NonspecificPatterns>,
}

impl NonspecificScrubber {
    /// # Errors
    ///
    /// `Configuration` if the detector settings are invalid.
    pub fn new(
        hasher: Arc<dyn Hasher>,
        config: NonspecificConfig,
        denylist: Option<Arc<WordList>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hasher,
            config,
            denylist,
            allowlist: None,
            compiled: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &NonspecificConfig {
        &self.config
    }

    /// Words on the allowlist are excluded from the denylist stage
    pub fn set_allowlist(&mut self, allowlist: Option<Arc<WordList>>) {
        self.allowlist = allowlist;
        self.compiled.take();
    }

    /// Scrub `text` on its own
    pub fn scrub(&self, text: &str) -> String {
        let mut redactor = Redactor::new(text);
        let mut counts = ScrubCounts::default();
        self.scrub_into(&mut redactor, &mut counts);
        redactor.render()
    }

    /// Run the non-specific stages on spans not yet taken
    pub fn scrub_into(&self, redactor: &mut Redactor<'_>, counts: &mut ScrubCounts) {
        let patterns = self.patterns();
        let fixed = self.config.replacement_text.as_str();
        let denylist_replacement = self
            .denylist
            .as_ref()
            .and_then(|list| list.replacement_text())
            .unwrap_or(fixed);

        counts.denylist += redactor.apply(&patterns.denylist, |_| denylist_replacement.to_string());
        counts.numbers += redactor.apply(&patterns.numbers, |_| fixed.to_string());
        counts.postcodes += redactor.apply(&patterns.postcodes, |_| fixed.to_string());
        counts.dates += redactor.apply(&patterns.dates, |matched| self.blur_date(matched));
    }

    /// Denylist pattern source, for audit and debugging
    pub fn denylist_pattern_source(&self) -> String {
        self.patterns().denylist.source()
    }

    /// Deterministic hash over denylist, allowlist and detector settings
    pub fn get_hash(&self) -> String {
        let state = serde_json::json!({
            "config": &self.config,
            "denylist": self.denylist.as_ref().map(|list| list.hash()),
            "allowlist": self.allowlist.as_ref().map(|list| list.hash()),
        });
        self.hasher.hash(&state.to_string())
    }

    fn blur_date(&self, matched: &str) -> String {
        let fixed = &self.config.replacement_text;
        let Some(template) = &self.config.replacement_text_all_dates else {
            return fixed.clone();
        };
        let Some(date) = parse_date_text(matched) else {
            warn!("Matched date could not be parsed; using fixed replacement");
            return fixed.clone();
        };
        render_date(template, date).unwrap_or_else(|err| {
            warn!(error = %err, "Date blurring failed; using fixed replacement");
            fixed.clone()
        })
    }

    fn patterns(&self) -> &NonspecificPatterns {
        self.compiled.get_or_init(|| self.compile())
    }

    fn compile(&self) -> NonspecificPatterns {
        let mut denylist = PatternSet::new();
        if let Some(list) = &self.denylist {
            for (word, fragment) in
                list.patterns_by_word(list.fuzzy_policy(), self.allowlist.as_deref())
            {
                if let Err(err) = denylist.add_value(&[fragment]) {
                    log_value_dropped!(self.hasher.hash(word), "denylist", err);
                }
            }
        }

        let number_policy = self.config.number_policy();
        let mut numbers = PatternSet::new();
        for &n in &self.config.scrub_all_numbers_of_n_digits {
            add_detector(&mut numbers, n_digit_source(n, number_policy), "n-digit number");
        }

        let mut postcodes = PatternSet::new();
        if self.config.scrub_all_uk_postcodes {
            add_detector(
                &mut postcodes,
                uk_postcode_source(self.config.anonymise_codes_at_word_boundaries_only),
                "UK postcode",
            );
        }

        let mut dates = PatternSet::new();
        if self.config.scrub_all_dates {
            add_detector(
                &mut dates,
                generic_date_source(self.config.anonymise_dates_at_word_boundaries_only),
                "date",
            );
        }

        debug!(
            denylist = denylist.len(),
            numbers = numbers.len(),
            postcodes = postcodes.len(),
            dates = dates.len(),
            "Compiled non-specific patterns"
        );

        NonspecificPatterns {
            denylist,
            numbers,
            postcodes,
            dates,
        }
    }
}

fn add_detector(set: &mut PatternSet, source: String, detector: &str) {
    if let Err(err) = set.add_value(&[PatternFragment::plain(source)]) {
        error!(detector, error = %err, "Generic detector failed to compile and is disabled");
    }
}

fn default_replacement() -> String {
    DEFAULT_REPLACEMENT_NONSPECIFIC.to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::scrub::hasher::Sha256Hasher;
    use crate::scrub::policy::StringPolicy;

    fn hasher() -> Arc<dyn Hasher> {
        Arc::new(Sha256Hasher::new(secret_string("test-key".to_string())))
    }

    fn scrubber(config: NonspecificConfig, denylist: Option<Arc<WordList>>) -> NonspecificScrubber {
        NonspecificScrubber::new(hasher(), config, denylist).unwrap()
    }

    #[test]
    fn test_n_digit_numbers() {
        let s = scrubber(
            NonspecificConfig {
                scrub_all_numbers_of_n_digits: vec![10],
                ..Default::default()
            },
            None,
        );
        assert_eq!(
            s.scrub("nhs 0123456789 old 012345678 new 01234567890"),
            "nhs [~~~] old 012345678 new 01234567890"
        );
    }

    #[test]
    fn test_postcodes() {
        let s = scrubber(
            NonspecificConfig {
                scrub_all_uk_postcodes: true,
                ..Default::default()
            },
            None,
        );
        assert_eq!(s.scrub("Lives at CB2 3EB now"), "Lives at [~~~] now");
    }

    #[test]
    fn test_date_blurring() {
        let s = scrubber(
            NonspecificConfig {
                scrub_all_dates: true,
                replacement_text_all_dates: Some("%b '%y".to_string()),
                ..Default::default()
            },
            None,
        );
        assert_eq!(s.scrub("Seen 12 Jan 1990."), "Seen Jan '90.");
    }

    #[test]
    fn test_bad_template_falls_back_to_fixed_text() {
        let s = scrubber(
            NonspecificConfig {
                scrub_all_dates: true,
                replacement_text_all_dates: Some("%H:%M".to_string()),
                ..Default::default()
            },
            None,
        );
        assert_eq!(s.scrub("Seen 12/01/1990"), "Seen [~~~]");
    }

    #[test]
    fn test_dates_without_template() {
        let s = scrubber(
            NonspecificConfig {
                scrub_all_dates: true,
                ..Default::default()
            },
            None,
        );
        assert_eq!(s.scrub("DOB 1990-01-12, seen May 2020"), "DOB [~~~], seen May 2020");
    }

    #[test]
    fn test_denylist_uses_own_replacement_and_allowlist() {
        let h = hasher();
        let deny = WordList::builder("deny")
            .words(["secret", "hope"])
            .replacement_text("[DENY]")
            .fuzzy_policy(StringPolicy::exact())
            .build(h.as_ref())
            .unwrap();
        let allow = WordList::builder("allow")
            .words(["hope"])
            .build(h.as_ref())
            .unwrap();

        let mut s = scrubber(NonspecificConfig::default(), Some(Arc::new(deny)));
        assert_eq!(s.scrub("secret hope"), "[DENY] [DENY]");

        s.set_allowlist(Some(Arc::new(allow)));
        assert_eq!(s.scrub("secret hope"), "[DENY] hope");
    }

    #[test]
    fn test_zero_digit_length_rejected() {
        let result = NonspecificScrubber::new(
            hasher(),
            NonspecificConfig {
                scrub_all_numbers_of_n_digits: vec![0],
                ..Default::default()
            },
            None,
        );
        assert!(matches!(result, Err(AnonymiserError::Configuration(_))));
    }

    #[test]
    fn test_hash_tracks_settings() {
        let a = scrubber(NonspecificConfig::default(), None);
        let b = scrubber(
            NonspecificConfig {
                scrub_all_uk_postcodes: true,
                ..Default::default()
            },
            None,
        );
        assert_eq!(a.get_hash(), scrubber(NonspecificConfig::default(), None).get_hash());
        assert_ne!(a.get_hash(), b.get_hash());
    }
}
