//! Fuzzy pattern builder
//!
//! Turns one raw scrub value and its [`ScrubMethod`] into pattern fragments.
//! Each fragment is compiled on its own, so a value that cannot be compiled
//! is dropped without affecting the others.
//!
//! String tokens become an alternation of exact forms (the token and its
//! alternative spellings, each tolerant of internal punctuation) and, where
//! the policy allows errors, a length-windowed candidate group that is later
//! verified by edit distance. See [`crate::scrub::fuzzy`].

use crate::domain::errors::AnonymiserError;
use crate::domain::result::Result;
use crate::scrub::alternatives::Alternatives;
use crate::scrub::dates::{parse_date_text, specific_date_source};
use crate::scrub::fuzzy::FuzzySlot;
use crate::scrub::method::ScrubMethod;
use crate::scrub::normalize::{alphanumeric_of, alphanumeric_runs, digits_of, folded_alphanumeric};
use crate::scrub::policy::{NumberPolicy, PolicyConfig, StringPolicy};
use crate::scrub::wordlist::WordList;

/// Separators tolerated between the digits of a subject's number
///
/// Includes brackets and slashes, as in "(01223) 123456" or "01223/123456".
pub const NUMERIC_SEPARATOR: &str = r"[\s.\-/()]*";

/// Separators tolerated inside generic N-digit numbers
///
/// No slash, so numeric dates are left to the date detector.
const GENERIC_NUMBER_SEPARATOR: &str = r"[\s.\-()]*";

/// Connector between the tokens of a phrase
const TOKEN_GAP: &str = r"[\W_]+";

/// Connector between the alphanumeric runs inside one token
const INTRA_TOKEN_GAP: &str = r"[\W_]*";

/// Connector between the characters of a code
const CODE_GAP: &str = r"\s*";

/// Single punctuation mark allowed inside a fuzzy candidate ("D'Sousa")
const CANDIDATE_JOIN: &str = r"[^\w\s]?";

/// One independently compiled alternative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFragment {
    /// Regex source, without the case-insensitivity flag
    pub source: String,
    /// Candidate groups needing edit-distance verification
    pub fuzzy_slots: Vec<FuzzySlot>,
    /// Whether the source ends with a word-boundary assertion
    pub word_bounded: bool,
}

impl PatternFragment {
    /// Fragment with no fuzzy verification
    pub fn plain(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fuzzy_slots: Vec::new(),
            word_bounded: false,
        }
    }
}

/// Builds fragments for subject-specific values under one policy
pub struct PatternBuilder<'a> {
    policy: &'a PolicyConfig,
    string_policy: StringPolicy,
    alternatives: &'a Alternatives,
    allowlist: Option<&'a WordList>,
}

impl<'a> PatternBuilder<'a> {
    pub fn new(
        policy: &'a PolicyConfig,
        alternatives: &'a Alternatives,
        allowlist: Option<&'a WordList>,
    ) -> Self {
        Self {
            policy,
            string_policy: policy.string_policy(),
            alternatives,
            allowlist,
        }
    }

    /// Fragments for `value` under `method`
    ///
    /// An empty result means the value legitimately contributes nothing
    /// (numeric-only phrase, all words too short or allowlisted).
    ///
    /// # Errors
    ///
    /// `InvalidValue` when a NUMERIC value has no digits, a CODE value has no
    /// letters or digits, or a DATE value does not parse.
    pub fn build(&self, value: &str, method: ScrubMethod) -> Result<Vec<PatternFragment>> {
        match method {
            ScrubMethod::Phrase => {
                if is_numeric_only(value) && !self.policy.scrub_numeric_phrases {
                    return Ok(Vec::new());
                }
                Ok(self.phrase(value))
            }
            ScrubMethod::PhraseUnlessNumeric => {
                if is_numeric_only(value) {
                    return Ok(Vec::new());
                }
                Ok(self.phrase(value))
            }
            ScrubMethod::Words => Ok(self.words(value)),
            ScrubMethod::Numeric => {
                let digits = digits_of(value);
                if digits.is_empty() {
                    return Err(AnonymiserError::InvalidValue(
                        "NUMERIC value contains no digits".to_string(),
                    ));
                }
                Ok(vec![numeric_fragment(&digits, self.policy.number_policy())])
            }
            ScrubMethod::Code => {
                let code = alphanumeric_of(value);
                if code.is_empty() {
                    return Err(AnonymiserError::InvalidValue(
                        "CODE value contains no letters or digits".to_string(),
                    ));
                }
                Ok(vec![code_fragment(
                    &code,
                    self.policy.anonymise_codes_at_word_boundaries_only,
                )])
            }
            ScrubMethod::Date => {
                let date = parse_date_text(value).ok_or_else(|| {
                    AnonymiserError::InvalidValue("DATE value is not a recognisable date".to_string())
                })?;
                Ok(vec![PatternFragment::plain(specific_date_source(
                    date,
                    self.policy.anonymise_dates_at_word_boundaries_only,
                ))])
            }
        }
    }

    fn phrase(&self, value: &str) -> Vec<PatternFragment> {
        let tokens: Vec<&str> = value.split_whitespace().collect();
        string_fragment(&tokens, &self.string_policy, self.alternatives)
            .into_iter()
            .collect()
    }

    fn words(&self, value: &str) -> Vec<PatternFragment> {
        value
            .split_whitespace()
            .filter(|token| token.chars().count() >= self.policy.min_string_length_to_scrub_with)
            .filter(|token| !self.allowlist.is_some_and(|list| list.contains(token)))
            .filter_map(|token| string_fragment(&[token], &self.string_policy, self.alternatives))
            .collect()
    }
}

/// Whether a value is a bare number
///
/// Trim, drop at most one trailing ".", then only digits remain with at most
/// one decimal point. A leading sign and "," thousands separators are also
/// accepted. Text such as "5 Tree Road" or "5b" is not numeric-only.
pub fn is_numeric_only(value: &str) -> bool {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    let unsigned = trimmed
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(trimmed);

    let mut seen_digit = false;
    let mut seen_point = false;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            ',' if !seen_point && seen_digit => {}
            _ => return false,
        }
    }
    seen_digit
}

/// Phrase fragment from a token sequence
///
/// Tokens without letters or digits are skipped; `None` if nothing remains.
/// Boundary assertions go only at the two ends of the whole phrase. Suffixes
/// are accepted after the last token.
pub fn string_fragment(
    tokens: &[&str],
    policy: &StringPolicy,
    alternatives: &Alternatives,
) -> Option<PatternFragment> {
    let tokens: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| alphanumeric_runs(t).next().is_some())
        .collect();
    if tokens.is_empty() {
        return None;
    }

    let mut slots = Vec::new();
    let last = tokens.len() - 1;
    let pieces: Vec<String> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, token)| token_piece(token, policy, alternatives, i == last, &mut slots))
        .collect();
    if pieces.is_empty() {
        return None;
    }

    let mut body = pieces.join(TOKEN_GAP);
    if let Some(group) = suffix_group(&policy.suffixes) {
        body.push_str(&group);
    }

    let source = if policy.at_word_boundaries_only {
        format!(r"\b{body}\b")
    } else {
        format!("(?:{body})")
    };

    Some(PatternFragment {
        source,
        fuzzy_slots: slots,
        word_bounded: policy.at_word_boundaries_only,
    })
}

fn token_piece(
    token: &str,
    policy: &StringPolicy,
    alternatives: &Alternatives,
    is_last: bool,
    slots: &mut Vec<FuzzySlot>,
) -> Option<String> {
    let mut forms: Vec<&str> = vec![token];
    forms.extend(alternatives.of(token));

    let mut exact: Vec<String> = forms.iter().filter_map(|f| exact_form_source(f)).collect();
    if exact.is_empty() {
        return None;
    }
    exact.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    exact.dedup();
    let exact = exact.join("|");

    let mut fuzzy_forms: Vec<String> = forms
        .iter()
        .map(|f| folded_alphanumeric(f))
        .filter(|f| policy.allows_errors_for(f.chars().count()))
        .collect();
    fuzzy_forms.sort();
    fuzzy_forms.dedup();

    if fuzzy_forms.is_empty() {
        return Some(format!("(?:{exact})"));
    }

    let e = policy.max_errors;
    let lengths = fuzzy_forms.iter().map(|f| f.chars().count());
    let min_len = lengths.clone().min().unwrap_or(0);
    let max_len = lengths.max().unwrap_or(0);

    let suffixes: Vec<String> = if is_last {
        policy
            .suffixes
            .iter()
            .map(|s| folded_alphanumeric(s))
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        Vec::new()
    };
    let max_suffix = suffixes.iter().map(|s| s.chars().count()).max().unwrap_or(0);

    let suffixed: Vec<String> = fuzzy_forms
        .iter()
        .flat_map(|form| suffixes.iter().map(move |s| format!("{form}{s}")))
        .collect();
    fuzzy_forms.extend(suffixed);

    let group = format!("fz{}", slots.len());
    let lo = min_len.saturating_sub(e).max(1);
    let hi = max_len + e + max_suffix;
    // Counts letters and digits; one punctuation mark may sit between any two
    let (more_lo, more_hi) = (lo - 1, hi - 1);
    let piece = format!(
        "(?:{exact}|(?P<{group}>[^\\W_](?:{CANDIDATE_JOIN}[^\\W_]){{{more_lo},{more_hi}}}))"
    );

    slots.push(FuzzySlot {
        group,
        forms: fuzzy_forms,
        max_errors: e,
    });
    Some(piece)
}

/// Escaped token tolerant of punctuation or spacing between its runs
fn exact_form_source(form: &str) -> Option<String> {
    let runs: Vec<String> = alphanumeric_runs(form).map(regex::escape).collect();
    (!runs.is_empty()).then(|| runs.join(INTRA_TOKEN_GAP))
}

fn suffix_group(suffixes: &[String]) -> Option<String> {
    let mut escaped: Vec<String> = suffixes
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return None;
    }
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    escaped.dedup();
    Some(format!("(?:{})?", escaped.join("|")))
}

/// Digit sequence with flexible separators between digits
pub fn numeric_fragment(digits: &str, policy: NumberPolicy) -> PatternFragment {
    let core: Vec<String> = digits.chars().map(|c| c.to_string()).collect();
    PatternFragment::plain(number_bounds(&core.join(NUMERIC_SEPARATOR), policy))
}

/// Alphanumeric code with flexible whitespace between characters
pub fn code_fragment(code: &str, at_word_boundaries_only: bool) -> PatternFragment {
    let core: Vec<String> = code
        .chars()
        .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
        .collect();
    let core = core.join(CODE_GAP);
    let source = if at_word_boundaries_only {
        format!(r"\b{core}\b")
    } else {
        format!("(?:{core})")
    };
    PatternFragment::plain(source)
}

/// Any run of exactly `n` digits, separators as for NUMERIC values
pub fn n_digit_source(n: usize, policy: NumberPolicy) -> String {
    let core = match n {
        0 | 1 => "[0-9]".to_string(),
        _ => format!("[0-9](?:{GENERIC_NUMBER_SEPARATOR}[0-9]){{{}}}", n - 1),
    };
    number_bounds(&core, policy)
}

/// Generic UK postcode grammar
pub fn uk_postcode_source(at_word_boundaries_only: bool) -> String {
    let core = r"[A-Z]{1,2}[0-9](?:[0-9]|[A-Z])?\s*[0-9][A-Z]{2}";
    if at_word_boundaries_only {
        format!(r"\b{core}\b")
    } else {
        format!("(?:{core})")
    }
}

/// Anchor a number pattern
///
/// Both flags apply when both are set; the word boundary is the stricter.
fn number_bounds(core: &str, policy: NumberPolicy) -> String {
    let mut source = String::new();
    if policy.at_word_boundaries_only {
        source.push_str(r"\b");
    }
    if policy.at_numeric_boundaries_only {
        source.push_str("(?<![0-9])");
    }
    source.push_str("(?:");
    source.push_str(core);
    source.push(')');
    if policy.at_numeric_boundaries_only {
        source.push_str("(?![0-9])");
    }
    if policy.at_word_boundaries_only {
        source.push_str(r"\b");
    }
    source
}
