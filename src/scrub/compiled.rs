//! Compiled pattern sets and single-pass redaction
//!
//! Every stage of a scrub runs against the original text. Replaced spans are
//! recorded in a [`Redactor`]; a later stage never matches anything that
//! overlaps a span an earlier stage already took, and within one stage
//! overlapping matches are merged into a single replacement.

use crate::domain::result::Result;
use crate::scrub::builder::PatternFragment;
use crate::scrub::fuzzy::FuzzySlot;
use fancy_regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// One compiled fragment and its fuzzy verification slots
#[derive(Debug)]
pub struct CompiledFragment {
    regex: Regex,
    fuzzy_slots: Vec<FuzzySlot>,
    word_bounded: bool,
}

impl CompiledFragment {
    /// Compile case-insensitively
    ///
    /// # Errors
    ///
    /// `PatternCompilation` if the generated source is rejected.
    pub fn compile(fragment: &PatternFragment) -> Result<Self> {
        let regex = Regex::new(&format!("(?i){}", fragment.source))?;
        Ok(Self {
            regex,
            fuzzy_slots: fragment.fuzzy_slots.clone(),
            word_bounded: fragment.word_bounded,
        })
    }

    fn verified(&self, caps: &Captures<'_>) -> bool {
        self.fuzzy_slots.iter().all(|slot| {
            caps.name(&slot.group)
                .map_or(true, |candidate| slot.accepts(candidate.as_str()))
        })
    }
}

/// The compiled fragments of one stage
#[derive(Debug, Default)]
pub struct PatternSet {
    fragments: Vec<CompiledFragment>,
    sources: Vec<String>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile all fragments of one value and add them together
    ///
    /// If any fragment fails, none are added.
    pub fn add_value(&mut self, fragments: &[PatternFragment]) -> Result<()> {
        let compiled = fragments
            .iter()
            .map(CompiledFragment::compile)
            .collect::<Result<Vec<_>>>()?;

        self.fragments.extend(compiled);
        self.sources
            .extend(fragments.iter().map(|f| f.source.clone()));
        Ok(())
    }

    /// `|`-joined source of every fragment, for audit and debugging
    pub fn source(&self) -> String {
        self.sources.join("|")
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Replacements made per stage of one scrub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrubCounts {
    pub patient: usize,
    pub third_party: usize,
    pub denylist: usize,
    pub numbers: usize,
    pub postcodes: usize,
    pub dates: usize,
}

impl ScrubCounts {
    pub fn total(&self) -> usize {
        self.patient + self.third_party + self.denylist + self.numbers + self.postcodes + self.dates
    }
}

/// Records replacement spans over an immutable input text
pub struct Redactor<'t> {
    text: &'t str,
    /// start -> (end, replacement); spans never overlap
    spans: BTreeMap<usize, (usize, String)>,
}

impl<'t> Redactor<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            spans: BTreeMap::new(),
        }
    }

    /// Run one stage, returning the number of replacements made
    ///
    /// `replace` receives the matched text and returns its replacement.
    pub fn apply<F>(&mut self, set: &PatternSet, replace: F) -> usize
    where
        F: Fn(&str) -> String,
    {
        let mut found = Vec::new();
        for fragment in &set.fragments {
            self.scan(fragment, &mut found);
        }
        if found.is_empty() {
            return 0;
        }

        found.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(found.len());
        for (start, end) in found {
            match merged.last_mut() {
                Some(last) if start < last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        for &(start, end) in &merged {
            let replacement = replace(&self.text[start..end]);
            self.spans.insert(start, (end, replacement));
        }
        merged.len()
    }

    fn scan(&self, fragment: &CompiledFragment, found: &mut Vec<(usize, usize)>) {
        let text = self.text;
        let mut pos = 0;

        while pos <= text.len() {
            let caps = match fragment.regex.captures_from_pos(text, pos) {
                Ok(Some(caps)) => caps,
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "Pattern matching aborted for one fragment");
                    break;
                }
            };
            let Some(whole) = caps.get(0) else {
                break;
            };
            let (start, end) = (whole.start(), whole.end());

            if start == end {
                pos = next_char_boundary(text, end);
                continue;
            }

            if let Some((taken_start, taken_end)) = self.taken(start, end) {
                pos = if taken_start <= start {
                    taken_end
                } else {
                    next_char_boundary(text, start)
                };
                continue;
            }

            let accepted = if fragment.verified(&caps) {
                Some(end)
            } else {
                self.shorter_match(fragment, start, end)
            };
            match accepted {
                Some(end) => {
                    found.push((start, end));
                    pos = end;
                }
                None => pos = next_char_boundary(text, start),
            }
        }
    }

    /// Retry a rejected fuzzy match from the same start with the text cut
    /// short, longest first, so a shorter candidate still gets verified
    ///
    /// A cut makes the end of the text look like a word boundary, so a
    /// word-bounded fragment is only accepted where the full text has one.
    fn shorter_match(&self, fragment: &CompiledFragment, start: usize, end: usize) -> Option<usize> {
        if fragment.fuzzy_slots.is_empty() {
            return None;
        }
        let text = self.text;
        let cuts: Vec<usize> = text[start..end]
            .char_indices()
            .skip(1)
            .map(|(i, _)| start + i)
            .collect();

        for &cut in cuts.iter().rev() {
            let Ok(Some(caps)) = fragment.regex.captures_from_pos(&text[..cut], start) else {
                continue;
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() != start || whole.end() == start {
                continue;
            }
            if fragment.word_bounded && !is_word_boundary(text, whole.end()) {
                continue;
            }
            if fragment.verified(&caps) {
                return Some(whole.end());
            }
        }
        None
    }

    /// The recorded span overlapping `[start, end)`, if any
    fn taken(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        self.spans
            .range(..end)
            .next_back()
            .filter(|(_, (taken_end, _))| *taken_end > start)
            .map(|(&taken_start, (taken_end, _))| (taken_start, *taken_end))
    }

    /// The input with every recorded span replaced
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut last = 0;
        for (&start, (end, replacement)) in &self.spans {
            out.push_str(&self.text[last..start]);
            out.push_str(replacement);
            last = *end;
        }
        out.push_str(&self.text[last..]);
        out
    }
}

fn is_word_boundary(text: &str, at: usize) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let before = text[..at].chars().next_back().is_some_and(is_word);
    let after = text[at..].chars().next().is_some_and(is_word);
    before != after
}

fn next_char_boundary(text: &str, at: usize) -> usize {
    at + text[at..].chars().next().map_or(1, char::len_utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(sources: &[&str]) -> PatternSet {
        let mut set = PatternSet::new();
        for source in sources {
            set.add_value(&[PatternFragment::plain(*source)]).unwrap();
        }
        set
    }

    #[test]
    fn test_apply_and_render() {
        let mut redactor = Redactor::new("Bob met Alice and bob");
        let n = redactor.apply(&set_of(&[r"\bbob\b"]), |_| "[X]".to_string());
        assert_eq!(n, 2);
        assert_eq!(redactor.render(), "[X] met Alice and [X]");
    }

    #[test]
    fn test_later_stage_skips_taken_spans() {
        let mut redactor = Redactor::new("Bob Hope visited");
        redactor.apply(&set_of(&[r"\bBob Hope\b"]), |_| "[P]".to_string());
        let n = redactor.apply(&set_of(&[r"\bHope\b", r"\bvisited\b"]), |_| "[T]".to_string());
        assert_eq!(n, 1);
        assert_eq!(redactor.render(), "[P] [T]");
    }

    #[test]
    fn test_overlapping_matches_merge_within_stage() {
        let mut redactor = Redactor::new("x Mary Jane Smith y");
        let n = redactor.apply(
            &set_of(&[r"\bMary Jane\b", r"\bJane Smith\b"]),
            |_| "[P]".to_string(),
        );
        assert_eq!(n, 1);
        assert_eq!(redactor.render(), "x [P] y");
    }

    #[test]
    fn test_replacement_sees_matched_text() {
        let mut redactor = Redactor::new("a 12 b 7");
        redactor.apply(&set_of(&[r"[0-9]+"]), |m| format!("<{}>", m.len()));
        assert_eq!(redactor.render(), "a <2> b <1>");
    }

    #[test]
    fn test_failed_value_adds_nothing() {
        let mut set = PatternSet::new();
        let result = set.add_value(&[
            PatternFragment::plain("fine"),
            PatternFragment::plain("(broken"),
        ]);
        assert!(result.is_err());
        assert!(set.is_empty());
        assert_eq!(set.source(), "");
    }

    #[test]
    fn test_fuzzy_slot_verification() {
        let fragment = PatternFragment {
            source: r"\b(?:smith|(?P<fz0>[^\W_]{4,6}))\b".to_string(),
            fuzzy_slots: vec![FuzzySlot {
                group: "fz0".to_string(),
                forms: vec!["smith".to_string()],
                max_errors: 1,
            }],
            word_bounded: true,
        };
        let mut set = PatternSet::new();
        set.add_value(&[fragment]).unwrap();

        let mut redactor = Redactor::new("Dr Smyth and Dr Jones saw Smith");
        let n = redactor.apply(&set, |_| "[X]".to_string());
        assert_eq!(n, 2);
        assert_eq!(redactor.render(), "Dr [X] and Dr Jones saw [X]");
    }

    fn secret_slot() -> Vec<FuzzySlot> {
        vec![FuzzySlot {
            group: "fz0".to_string(),
            forms: vec!["secret".to_string()],
            max_errors: 1,
        }]
    }

    #[test]
    fn test_shorter_candidate_retried_inside_word() {
        let fragment = PatternFragment {
            source: r"(?:(?:secret|(?P<fz0>[^\W_]{5,7})))".to_string(),
            fuzzy_slots: secret_slot(),
            word_bounded: false,
        };
        let mut set = PatternSet::new();
        set.add_value(&[fragment]).unwrap();

        let mut redactor = Redactor::new("the secratary");
        assert_eq!(redactor.apply(&set, |_| "[X]".to_string()), 1);
        assert_eq!(redactor.render(), "the [X]ary");
    }

    #[test]
    fn test_shorter_candidate_needs_real_boundary() {
        let fragment = PatternFragment {
            source: r"\b(?:secret|(?P<fz0>[^\W_]{5,7}))\b".to_string(),
            fuzzy_slots: secret_slot(),
            word_bounded: true,
        };
        let mut set = PatternSet::new();
        set.add_value(&[fragment]).unwrap();

        let mut redactor = Redactor::new("the secratary");
        assert_eq!(redactor.apply(&set, |_| "[X]".to_string()), 0);
        assert_eq!(redactor.render(), "the secratary");
    }

    #[test]
    fn test_word_boundary() {
        assert!(is_word_boundary("ab cd", 2));
        assert!(is_word_boundary("ab", 2));
        assert!(!is_word_boundary("abcd", 2));
        assert!(!is_word_boundary("a  b", 2));
    }

    #[test]
    fn test_counts_total() {
        let counts = ScrubCounts {
            patient: 2,
            dates: 1,
            ..Default::default()
        };
        assert_eq!(counts.total(), 3);
    }
}
