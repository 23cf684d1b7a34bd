//! Allowlists and denylists
//!
//! A [`WordList`] is built once from explicit words and/or files and is
//! immutable afterwards, so one instance can be shared read-only (behind an
//! `Arc`) by every worker's scrubber.
//!
//! # Example
//!
//! ```rust
//! use anonymiser::config::secret_string;
//! use anonymiser::scrub::{Sha256Hasher, WordList};
//!
//! let hasher = Sha256Hasher::new(secret_string("key".to_string()));
//! let allowlist = WordList::builder("allowlist")
//!     .words(["Hope", "Street"])
//!     .build(&hasher)
//!     .unwrap();
//!
//! assert!(allowlist.contains("HOPE"));
//! assert!(!allowlist.contains("Bob"));
//! ```

use crate::domain::errors::AnonymiserError;
use crate::domain::result::Result;
use crate::scrub::alternatives::Alternatives;
use crate::scrub::builder::{string_fragment, PatternFragment};
use crate::scrub::hasher::Hasher;
use crate::scrub::policy::StringPolicy;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Named, case-folded set of words
pub struct WordList {
    name: String,
    words: BTreeSet<String>,
    replacement_text: Option<String>,
    fuzzy_policy: StringPolicy,
    hash: String,
}

impl WordList {
    /// Start building a list
    pub fn builder(name: impl Into<String>) -> WordListBuilder {
        WordListBuilder {
            name: name.into(),
            words: Vec::new(),
            files: Vec::new(),
            replacement_text: None,
            fuzzy_policy: StringPolicy::exact(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive exact membership
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&normalize_word(token))
    }

    /// Normalised words, sorted
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Replacement text carried by the list itself, if any
    pub fn replacement_text(&self) -> Option<&str> {
        self.replacement_text.as_deref()
    }

    /// Policy the list was built with, used when it acts as a denylist
    pub fn fuzzy_policy(&self) -> &StringPolicy {
        &self.fuzzy_policy
    }

    /// Deterministic hash over the sorted, normalised words
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// One fragment per word under `policy`
    pub fn build_patterns(&self, policy: &StringPolicy) -> Vec<PatternFragment> {
        self.patterns_by_word(policy, None)
            .into_iter()
            .map(|(_, fragment)| fragment)
            .collect()
    }

    /// Fragments keyed by their word, skipping words `exclude` contains
    pub fn patterns_by_word<'a>(
        &'a self,
        policy: &StringPolicy,
        exclude: Option<&WordList>,
    ) -> Vec<(&'a str, PatternFragment)> {
        let alternatives = Alternatives::default();
        self.words()
            .filter(|word| !exclude.is_some_and(|list| list.contains(word)))
            .filter_map(|word| {
                let tokens: Vec<&str> = word.split_whitespace().collect();
                string_fragment(&tokens, policy, &alternatives).map(|fragment| (word, fragment))
            })
            .collect()
    }
}

impl fmt::Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("name", &self.name)
            .field("len", &self.words.len())
            .field("hash", &self.hash)
            .finish()
    }
}

/// Builder for [`WordList`]
pub struct WordListBuilder {
    name: String,
    words: Vec<String>,
    files: Vec<PathBuf>,
    replacement_text: Option<String>,
    fuzzy_policy: StringPolicy,
}

impl WordListBuilder {
    /// Add explicit words
    pub fn words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(words.into_iter().map(Into::into));
        self
    }

    /// Add a file with one entry per line; blank and `#` lines are skipped
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn replacement_text(mut self, text: impl Into<String>) -> Self {
        self.replacement_text = Some(text.into());
        self
    }

    pub fn fuzzy_policy(mut self, policy: StringPolicy) -> Self {
        self.fuzzy_policy = policy;
        self
    }

    /// Read files, normalise and hash
    ///
    /// # Errors
    ///
    /// `Configuration` if a file cannot be read or the policy is invalid.
    pub fn build(self, hasher: &dyn Hasher) -> Result<WordList> {
        self.fuzzy_policy.validate()?;

        let mut words: BTreeSet<String> = self
            .words
            .iter()
            .map(|w| normalize_word(w))
            .filter(|w| !w.is_empty())
            .collect();

        for path in &self.files {
            words.extend(read_word_file(path)?);
        }

        let hash = hasher.hash(&serde_json::to_string(&words).unwrap_or_default());

        debug!(
            list = %self.name,
            words = words.len(),
            files = self.files.len(),
            "Built word list"
        );

        Ok(WordList {
            name: self.name,
            words,
            replacement_text: self.replacement_text,
            fuzzy_policy: self.fuzzy_policy,
            hash,
        })
    }
}

fn normalize_word(word: &str) -> String {
    word.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn read_word_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AnonymiserError::Configuration(format!(
            "Failed to read word list file {}: {e}",
            path.display()
        ))
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_word)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::scrub::hasher::Sha256Hasher;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn hasher() -> Sha256Hasher {
        Sha256Hasher::new(secret_string("test-key".to_string()))
    }

    #[test]
    fn test_words_are_case_folded() {
        let list = WordList::builder("deny")
            .words(["Secret", "  Top   Secret "])
            .build(&hasher())
            .unwrap();
        assert!(list.contains("SECRET"));
        assert!(list.contains("top secret"));
        assert_eq!(list.words().collect::<Vec<_>>(), vec!["secret", "top secret"]);
    }

    #[test]
    fn test_file_entries_skip_blanks_and_comments() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# staff names").unwrap();
        writeln!(file, "Smith").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Jones  ").unwrap();

        let list = WordList::builder("file")
            .file(file.path())
            .build(&hasher())
            .unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains("jones"));
        assert!(!list.contains("# staff names"));
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let err = WordList::builder("missing")
            .file("/nonexistent/words.txt")
            .build(&hasher())
            .unwrap_err();
        assert!(matches!(err, AnonymiserError::Configuration(_)));
    }

    #[test]
    fn test_hash_is_order_independent() {
        let a = WordList::builder("a")
            .words(["one", "Two"])
            .build(&hasher())
            .unwrap();
        let b = WordList::builder("b")
            .words(["two", "ONE", "one"])
            .build(&hasher())
            .unwrap();
        assert_eq!(a.hash(), b.hash());
        assert!(!format!("{a:?}").contains("one"));
    }

    #[test]
    fn test_build_patterns_one_per_word() {
        let list = WordList::builder("deny")
            .words(["secret", "classified", "--"])
            .build(&hasher())
            .unwrap();
        assert_eq!(list.build_patterns(&StringPolicy::exact()).len(), 2);
    }

    #[test]
    fn test_patterns_exclude_allowlisted_words() {
        let deny = WordList::builder("deny")
            .words(["secret", "hope"])
            .build(&hasher())
            .unwrap();
        let allow = WordList::builder("allow")
            .words(["Hope"])
            .build(&hasher())
            .unwrap();
        let patterns = deny.patterns_by_word(&StringPolicy::exact(), Some(&allow));
        let words: Vec<&str> = patterns.iter().map(|(w, _)| *w).collect();
        assert_eq!(words, vec!["secret"]);
    }
}
