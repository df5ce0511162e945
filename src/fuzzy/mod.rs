// src/fuzzy/mod.rs
//! Near-miss lookup over canonical identifiers.

pub mod symspell;

use crate::core::dictionary::Dictionary;
use crate::core::normalizer::normalize_word;
use crate::error::Result;
use crate::core::engine::CONSOLIDATED_DIR;
use crate::metrics::METRICS_DIR;
use crate::persistence::{dictionary_files, load_dictionary};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use symspell::{SymSpell, TermId};
use tracing::{debug, warn};

pub const DEFAULT_MAX_DISTANCE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuzzyMatch {
    pub word: String,
    pub distance: usize,
}

/// Restricts which dictionary words get indexed.
#[derive(Debug, Clone, Default)]
pub struct FuzzyFilter {
    pub language: Option<String>,
    pub word_type: Option<String>,
}

pub struct FuzzyIndex {
    symspell: SymSpell,
    terms: Vec<String>,
    ids: HashMap<String, TermId>,
}

impl FuzzyIndex {
    pub fn new(max_distance: usize) -> Self {
        Self {
            symspell: SymSpell::new(max_distance),
            terms: Vec::new(),
            ids: HashMap::new(),
        }
    }

    pub fn max_distance(&self) -> usize {
        self.symspell.max_edit_distance()
    }

    /// Indexes an identifier once; repeats are ignored.
    pub fn insert(&mut self, identifier: &str) {
        if self.ids.contains_key(identifier) {
            return;
        }
        let id = self.terms.len() as TermId;
        self.symspell.add_term(identifier, id);
        self.terms.push(identifier.to_string());
        self.ids.insert(identifier.to_string(), id);
    }

    pub fn insert_dictionary(&mut self, dictionary: &Dictionary, filter: &FuzzyFilter) {
        for word in dictionary.words() {
            if let Some(language) = &filter.language {
                if !word.languages().contains(language) {
                    continue;
                }
            }
            if let Some(word_type) = &filter.word_type {
                if &word.word_type() != word_type {
                    continue;
                }
            }
            self.insert(word.normalized());
        }
    }

    /// Indexes every dictionary file under `root`, leaving out the
    /// consolidated lists and run metrics. Files that do not load as
    /// dictionaries are skipped.
    pub fn from_dir(root: &Path, max_distance: usize, filter: &FuzzyFilter) -> Result<Self> {
        let mut index = Self::new(max_distance);
        let (consolidated, metrics) = (root.join(CONSOLIDATED_DIR), root.join(METRICS_DIR));
        for path in dictionary_files(root, &[&consolidated, &metrics])? {
            match load_dictionary(&path) {
                Ok(dictionary) => index.insert_dictionary(&dictionary, filter),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping file"),
            }
        }
        debug!(terms = index.len(), "built fuzzy index");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Matches within the index distance, nearest first, ties by identifier.
    /// The query goes through the same folding as ingested words.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<FuzzyMatch> {
        let query = normalize_word(query);
        let max = self.max_distance();
        let mut matches: Vec<FuzzyMatch> = self
            .symspell
            .candidates(&query)
            .into_iter()
            .filter_map(|id| {
                let term = &self.terms[id as usize];
                let distance = strsim::levenshtein(&query, term);
                (distance <= max).then(|| FuzzyMatch { word: term.clone(), distance })
            })
            .collect();

        matches.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.word.cmp(&b.word)));
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::tests::word;
    use crate::persistence::save_dictionary;
    use tempfile::TempDir;

    fn index(words: &[&str]) -> FuzzyIndex {
        let mut index = FuzzyIndex::new(DEFAULT_MAX_DISTANCE);
        for w in words {
            index.insert(w);
        }
        index
    }

    #[test]
    fn ranked_by_distance_then_word() {
        let idx = index(&["care", "core", "cure", "card", "dog", "scare"]);
        let found = idx.search("care", None);
        let words: Vec<_> = found.iter().map(|m| (m.word.as_str(), m.distance)).collect();
        assert_eq!(
            words,
            [("care", 0), ("card", 1), ("core", 1), ("cure", 1), ("scare", 1)]
        );
    }

    #[test]
    fn query_is_folded() {
        let idx = index(&["care", "uber"]);
        assert_eq!(idx.search("Çare", Some(1))[0].word, "care");
        assert_eq!(idx.search("Über", None)[0].distance, 0);
    }

    #[test]
    fn limit_and_max_distance() {
        let idx = index(&["abcd", "abce", "abff", "zzzz"]);
        assert_eq!(idx.search("abcd", Some(2)).len(), 2);
        assert!(idx.search("abcd", None).iter().all(|m| m.word != "zzzz"));
    }

    #[test]
    fn repeated_inserts_are_ignored() {
        let idx = index(&["care", "care"]);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.search("care", None).len(), 1);
    }

    #[test]
    fn builds_from_output_tree_with_filters() {
        let dir = TempDir::new().unwrap();
        let mut en = Dictionary::new("en_4-c");
        en.add_word(word("care", "en", "standard"));
        let mut tr = Dictionary::new("tr_5-c");
        tr.add_word(word("kedim", "tr", "standard"));
        save_dictionary(&en, &dir.path().join("en/4-c.json")).unwrap();
        save_dictionary(&tr, &dir.path().join("tr/5-c.json")).unwrap();
        std::fs::write(dir.path().join("en/_config.json"), "{}").unwrap();

        let all = FuzzyIndex::from_dir(dir.path(), 2, &FuzzyFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let filter = FuzzyFilter { language: Some("tr".into()), word_type: None };
        let tr_only = FuzzyIndex::from_dir(dir.path(), 2, &filter).unwrap();
        assert_eq!(tr_only.len(), 1);

        let filter = FuzzyFilter { language: None, word_type: Some("4-c".into()) };
        let short = FuzzyIndex::from_dir(dir.path(), 2, &filter).unwrap();
        assert_eq!(short.search("cares", None)[0].word, "care");
    }

    #[test]
    fn consolidated_and_metrics_trees_are_not_indexed() {
        let dir = TempDir::new().unwrap();
        let mut en = Dictionary::new("en_4-c").with_language("en").with_word_type("4-c");
        en.add_word(word("care", "en", "standard"));
        save_dictionary(&en, &dir.path().join("en/4-c.json")).unwrap();

        let mut stray = Dictionary::new("stray").with_word_type("5-c");
        stray.add_word(word("zebra", "en", "standard"));
        save_dictionary(&stray, &dir.path().join("consolidated/5-c.json")).unwrap();
        save_dictionary(&stray, &dir.path().join("metrics/latest.json")).unwrap();

        let index = FuzzyIndex::from_dir(dir.path(), 2, &FuzzyFilter::default()).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.search("zebra", None).is_empty());
    }
}
