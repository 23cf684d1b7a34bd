//! Bounded-error token matching
//!
//! The regex engine has no native approximate matching, so fuzzy tokens are
//! matched in two phases: the compiled pattern captures a length-windowed
//! alphanumeric candidate in a named group, and the candidate is then
//! verified here by edit distance against the token's accepted forms.

use crate::scrub::normalize::folded_alphanumeric;

/// A fuzzy capture group within one compiled fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzySlot {
    /// Capture group name in the fragment source
    pub group: String,
    /// Folded alphanumeric forms the candidate may approximate
    pub forms: Vec<String>,
    pub max_errors: usize,
}

impl FuzzySlot {
    /// Whether `candidate` lies within `max_errors` edits of any form
    pub fn accepts(&self, candidate: &str) -> bool {
        let folded = folded_alphanumeric(candidate);
        self.forms
            .iter()
            .any(|form| bounded_levenshtein(&folded, form, self.max_errors).is_some())
    }
}

/// Levenshtein distance between `a` and `b`, or `None` if it exceeds `max`
///
/// Works on chars. Stops as soon as every cell in a row exceeds `max`.
pub fn bounded_levenshtein(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        let d = a.len().max(b.len());
        return (d <= max).then_some(d);
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }

        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let d = prev[b.len()];
    (d <= max).then_some(d)
}
