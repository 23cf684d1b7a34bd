//! Subject-specific scrubbing
//!
//! A [`PersonalizedScrubber`] holds the known identifiers of one subject
//! (patient and third-party values), an optional allowlist and an optional
//! [`NonspecificScrubber`]. Patterns are compiled lazily and cached until
//! the inputs change.
//!
//! # Example
//!
//! ```rust
//! use anonymiser::config::secret_string;
//! use anonymiser::scrub::{PersonalizedScrubber, PolicyConfig, ScrubMethod, Sha256Hasher};
//! use std::sync::Arc;
//!
//! let hasher = Arc::new(Sha256Hasher::new(secret_string("key".to_string())));
//! let mut scrubber = PersonalizedScrubber::builder(hasher)
//!     .policy(PolicyConfig {
//!         replacement_text_patient: "[PATIENT]".to_string(),
//!         replacement_text_third_party: "[THIRD]".to_string(),
//!         ..Default::default()
//!     })
//!     .build()
//!     .unwrap();
//!
//! scrubber.add_value("Bob Hope", ScrubMethod::Phrase, true);
//! scrubber.add_value("CB2 3EB", ScrubMethod::Code, false);
//!
//! assert_eq!(
//!     scrubber.scrub("Bob Hope visited CB2 3EB, or possibly CB23EB."),
//!     "[PATIENT] visited [THIRD], or possibly [THIRD]."
//! );
//! ```

use crate::domain::result::Result;
use crate::scrub::alternatives::Alternatives;
use crate::scrub::builder::PatternBuilder;
use crate::scrub::compiled::{PatternSet, Redactor, ScrubCounts};
use crate::scrub::hasher::Hasher;
use crate::scrub::method::{ScrubEntry, ScrubMethod, SubjectClass};
use crate::scrub::nonspecific::NonspecificScrubber;
use crate::scrub::policy::PolicyConfig;
use crate::scrub::wordlist::WordList;
use crate::{log_scrub_complete, log_value_dropped};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Cached compilation of the subject-specific patterns
pub struct CompiledScrubber {
    pub patient: PatternSet,
    pub third_party: PatternSet,
    pub config_hash: String,
}

/// Result of a scrub with per-stage counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrubOutcome {
    pub text: String,
    pub counts: ScrubCounts,
    pub config_hash: String,
}

/// Scrubber for one subject's identifiers
pub struct PersonalizedScrubber {
    hasher: Arc<dyn Hasher>,
    policy: PolicyConfig,
    alternatives: Alternatives,
    allowlist: Option<Arc<WordList>>,
    nonspecific: Option<NonspecificScrubber>,
    entries: BTreeSet<ScrubEntry>,
    compiled: OnceCell<CompiledScrubber>,
}

impl std::fmt::Debug for PersonalizedScrubber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalizedScrubber")
            .field("policy", &self.policy)
            .field("entries", &self.entries.len())
            .field("allowlist", &self.allowlist.is_some())
            .field("nonspecific", &self.nonspecific.is_some())
            .finish_non_exhaustive()
    }
}

impl PersonalizedScrubber {
    pub fn builder(hasher: Arc<dyn Hasher>) -> PersonalizedScrubberBuilder {
        PersonalizedScrubberBuilder {
            hasher,
            policy: PolicyConfig::default(),
            nonspecific: None,
            allowlist: None,
            alternatives: Alternatives::default(),
        }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Record a value to scrub
    ///
    /// Blank values and values on the allowlist are ignored. Adding a value
    /// that is already present changes nothing.
    pub fn add_value(&mut self, value: &str, method: ScrubMethod, patient: bool) {
        if value.trim().is_empty() {
            debug!(%method, "Ignoring blank scrub value");
            return;
        }
        if self.is_allowlisted(value) {
            debug!(%method, "Ignoring allowlisted scrub value");
            return;
        }

        let entry = ScrubEntry::new(value, method, SubjectClass::from_patient_flag(patient));
        if self.entries.insert(entry) {
            self.compiled.take();
        }
    }

    /// As [`add_value`](Self::add_value) with the method given by name
    ///
    /// # Errors
    ///
    /// `Configuration` if `method` is not a known scrub method.
    pub fn add_value_named(&mut self, value: &str, method: &str, patient: bool) -> Result<()> {
        let method: ScrubMethod = method.parse()?;
        self.add_value(value, method, patient);
        Ok(())
    }

    /// Remove every subject value
    pub fn clear_values(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.compiled.take();
        }
    }

    /// Number of stored values
    pub fn value_count(&self) -> usize {
        self.entries.len()
    }

    /// Replace the allowlist, here and in the non-specific scrubber
    pub fn set_allowlist(&mut self, allowlist: Option<Arc<WordList>>) {
        if let Some(nonspecific) = &mut self.nonspecific {
            nonspecific.set_allowlist(allowlist.clone());
        }
        self.allowlist = allowlist;
        self.compiled.take();
    }

    /// Scrub `text`
    pub fn scrub(&self, text: &str) -> String {
        self.scrub_with_report(text).text
    }

    /// Scrub `text` and report replacements per stage
    pub fn scrub_with_report(&self, text: &str) -> ScrubOutcome {
        let compiled = self.compiled();
        let mut redactor = Redactor::new(text);
        let mut counts = ScrubCounts::default();

        let patient = self.policy.replacement_text_patient.as_str();
        let third_party = self.policy.replacement_text_third_party.as_str();
        counts.patient = redactor.apply(&compiled.patient, |_| patient.to_string());
        counts.third_party = redactor.apply(&compiled.third_party, |_| third_party.to_string());

        if let Some(nonspecific) = &self.nonspecific {
            nonspecific.scrub_into(&mut redactor, &mut counts);
        }

        log_scrub_complete!(counts);

        ScrubOutcome {
            text: redactor.render(),
            counts,
            config_hash: compiled.config_hash.clone(),
        }
    }

    /// Deterministic hash of everything that decides the scrub output
    ///
    /// Covers the sorted patient and third-party values with their methods,
    /// the allowlist, the non-specific settings, the alternatives and the
    /// policy. Insertion order does not matter.
    pub fn get_hash(&self) -> String {
        let state = serde_json::json!({
            "patient": self.values_of(SubjectClass::Patient),
            "third_party": self.values_of(SubjectClass::ThirdParty),
            "allowlist": self.allowlist.as_ref().map(|list| list.hash()),
            "nonspecific": self.nonspecific.as_ref().map(NonspecificScrubber::get_hash),
            "alternatives": &self.alternatives,
            "policy": &self.policy,
        });
        self.hasher.hash(&state.to_string())
    }

    /// Patient pattern source; privacy-sensitive, for debugging only
    pub fn get_patient_pattern_source(&self) -> String {
        self.compiled().patient.source()
    }

    /// Third-party pattern source; privacy-sensitive, for debugging only
    pub fn get_third_party_pattern_source(&self) -> String {
        self.compiled().third_party.source()
    }

    /// Denylist pattern source of the non-specific scrubber, if any
    pub fn get_denylist_pattern_source(&self) -> Option<String> {
        self.nonspecific
            .as_ref()
            .map(NonspecificScrubber::denylist_pattern_source)
    }

    /// Sorted (value, method) pairs of one class
    fn values_of(&self, class: SubjectClass) -> Vec<(&str, ScrubMethod)> {
        self.entries
            .iter()
            .filter(|e| e.subject_class() == class)
            .map(|e| (e.raw_value(), e.method()))
            .collect()
    }

    fn is_allowlisted(&self, value: &str) -> bool {
        self.allowlist
            .as_ref()
            .is_some_and(|list| list.contains(value))
    }

    fn compiled(&self) -> &CompiledScrubber {
        self.compiled.get_or_init(|| self.compile())
    }

    fn compile(&self) -> CompiledScrubber {
        let builder =
            PatternBuilder::new(&self.policy, &self.alternatives, self.allowlist.as_deref());
        let mut patient = PatternSet::new();
        let mut third_party = PatternSet::new();

        for entry in &self.entries {
            if self.is_allowlisted(entry.raw_value()) {
                continue;
            }
            let set = match entry.subject_class() {
                SubjectClass::Patient => &mut patient,
                SubjectClass::ThirdParty => &mut third_party,
            };
            let added = builder
                .build(entry.raw_value(), entry.method())
                .and_then(|fragments| set.add_value(&fragments));
            if let Err(err) = added {
                log_value_dropped!(self.hasher.hash(entry.raw_value()), entry.method(), err);
            }
        }

        debug!(
            entries = self.entries.len(),
            patient_fragments = patient.len(),
            third_party_fragments = third_party.len(),
            "Compiled subject patterns"
        );

        CompiledScrubber {
            patient,
            third_party,
            config_hash: self.get_hash(),
        }
    }
}

/// Builder for [`PersonalizedScrubber`]
pub struct PersonalizedScrubberBuilder {
    hasher: Arc<dyn Hasher>,
    policy: PolicyConfig,
    nonspecific: Option<NonspecificScrubber>,
    allowlist: Option<Arc<WordList>>,
    alternatives: Alternatives,
}

impl PersonalizedScrubberBuilder {
    pub fn policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn nonspecific(mut self, nonspecific: NonspecificScrubber) -> Self {
        self.nonspecific = Some(nonspecific);
        self
    }

    pub fn allowlist(mut self, allowlist: Option<Arc<WordList>>) -> Self {
        self.allowlist = allowlist;
        self
    }

    pub fn alternatives(mut self, alternatives: Alternatives) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// # Errors
    ///
    /// `Configuration` if the policy is invalid.
    pub fn build(self) -> Result<PersonalizedScrubber> {
        self.policy.validate()?;

        let mut nonspecific = self.nonspecific;
        if let Some(scrubber) = &mut nonspecific {
            scrubber.set_allowlist(self.allowlist.clone());
        }

        Ok(PersonalizedScrubber {
            hasher: self.hasher,
            policy: self.policy,
            alternatives: self.alternatives,
            allowlist: self.allowlist,
            nonspecific,
            entries: BTreeSet::new(),
            compiled: OnceCell::new(),
        })
    }
}
