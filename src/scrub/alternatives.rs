//! Interchangeable word spellings
//!
//! Supplied at construction as groups of words (e.g. `["street", "st"]`,
//! `["road", "rd"]`). Lookup is case-insensitive and returns the other
//! members of every group the word belongs to.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Immutable map from a word to its alternative spellings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Alternatives {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl Alternatives {
    /// Build from groups of interchangeable words
    ///
    /// Blank entries are ignored. A word appearing in several groups maps to
    /// the union of their other members.
    pub fn new<G, W>(groups: G) -> Self
    where
        G: IntoIterator<Item = W>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for group in groups {
            let members: BTreeSet<String> = group
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();

            for word in &members {
                let others = map.entry(word.clone()).or_default();
                others.extend(members.iter().filter(|m| *m != word).cloned());
            }
        }

        map.retain(|_, others| !others.is_empty());
        Self { groups: map }
    }

    /// Alternative spellings of `word`, excluding the word itself
    pub fn of(&self, word: &str) -> impl Iterator<Item = &str> {
        self.groups
            .get(&word.trim().to_lowercase())
            .into_iter()
            .flat_map(|others| others.iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let alts = Alternatives::new(vec![vec!["Street", "St"], vec!["Road", "Rd"]]);
        let found: Vec<&str> = alts.of("STREET").collect();
        assert_eq!(found, vec!["st"]);
        let found: Vec<&str> = alts.of("rd").collect();
        assert_eq!(found, vec!["road"]);
    }

    #[test]
    fn test_word_in_multiple_groups() {
        let alts = Alternatives::new(vec![vec!["st", "street"], vec!["st", "saint"]]);
        let found: Vec<&str> = alts.of("st").collect();
        assert_eq!(found, vec!["saint", "street"]);
    }

    #[test]
    fn test_unknown_word_and_singletons() {
        let alts = Alternatives::new(vec![vec!["alone"], vec!["", "  "]]);
        assert!(alts.is_empty());
        assert_eq!(alts.of("alone").count(), 0);
    }
}
