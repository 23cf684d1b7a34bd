//! Scrub methods and subject-specific scrub entries

use crate::domain::errors::AnonymiserError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a raw scrub value decomposes into match patterns
///
/// The value provider picks the method per field: `Date` for dates of birth,
/// `Code` for postcodes and identifiers, `Phrase` for addresses, `Words` for
/// names, `Numeric` for telephone and record numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrubMethod {
    /// Whole phrase, tokens joined by flexible whitespace; numeric-only values are skipped
    Phrase,
    /// As `Phrase`, but numeric-only values are always skipped
    PhraseUnlessNumeric,
    /// Each whitespace-separated token scrubbed independently
    Words,
    /// Canonical digit sequence with flexible separators
    Numeric,
    /// Canonical alphanumeric sequence with flexible whitespace
    Code,
    /// Calendar date in any of the supported renderings
    Date,
}

impl ScrubMethod {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phrase => "PHRASE",
            Self::PhraseUnlessNumeric => "PHRASE_UNLESS_NUMERIC",
            Self::Words => "WORDS",
            Self::Numeric => "NUMERIC",
            Self::Code => "CODE",
            Self::Date => "DATE",
        }
    }

    /// Request-surface field name carrying values of this method
    pub fn request_field(&self) -> &'static str {
        match self {
            Self::Phrase => "phrases",
            Self::PhraseUnlessNumeric => "non_numeric_phrases",
            Self::Words => "words",
            Self::Numeric => "numbers",
            Self::Code => "codes",
            Self::Date => "dates",
        }
    }

    /// All methods, in declaration order
    pub fn all() -> [ScrubMethod; 6] {
        [
            Self::Phrase,
            Self::PhraseUnlessNumeric,
            Self::Words,
            Self::Numeric,
            Self::Code,
            Self::Date,
        ]
    }
}

impl fmt::Display for ScrubMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrubMethod {
    type Err = AnonymiserError;

    /// Accepts canonical names (any case) and request field names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .into_iter()
            .find(|m| {
                m.as_str().eq_ignore_ascii_case(wanted)
                    || m.request_field().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| AnonymiserError::Configuration(format!("Unknown scrub method: {s}")))
    }
}

/// Whose identifier a scrub value is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectClass {
    /// The subject of the record
    Patient,
    /// Relatives, carers and other third parties
    ThirdParty,
}

impl SubjectClass {
    /// Map the `patient` flag of `add_value` to a class
    pub fn from_patient_flag(patient: bool) -> Self {
        if patient {
            Self::Patient
        } else {
            Self::ThirdParty
        }
    }
}

/// A stored scrub value; immutable once created
///
/// Ordering is (value, method, class), which is the order used when the
/// scrubber hash is computed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScrubEntry {
    raw_value: String,
    method: ScrubMethod,
    subject_class: SubjectClass,
}

impl ScrubEntry {
    /// Create a new entry
    pub fn new(raw_value: impl Into<String>, method: ScrubMethod, subject_class: SubjectClass) -> Self {
        Self {
            raw_value: raw_value.into(),
            method,
            subject_class,
        }
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn method(&self) -> ScrubMethod {
        self.method
    }

    pub fn subject_class(&self) -> SubjectClass {
        self.subject_class
    }
}
