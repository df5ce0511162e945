// src/builder/dictionary.rs
//! Per-language and combined partitions.
//!
//! Words are bucketed by language then length as they are added. Anything
//! outside `[min_length, max_length]` is dropped at admission and never
//! stored.
//!
//! Output layout:
//! ```text
//! <output>/<language>/<N>-c.json
//! <output>/<combined-name>/<N>-c.json
//! ```

use crate::core::dictionary::Dictionary;
use crate::core::merge::{combine_into, merge_into, MergeOutcome};
use crate::core::normalizer::is_valid_identifier;
use crate::core::types::{word_type_for_length, Word};
use crate::error::{DitongError, Result};
use crate::ingest::IngestResult;
use crate::persistence::save_dictionary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_MIN_LENGTH: usize = 3;
pub const DEFAULT_MAX_LENGTH: usize = 10;
pub const DEFAULT_COMBINED_NAME: &str = "all";

/// Counts gathered while building partitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildStats {
    pub total_words: usize,
    pub by_length: BTreeMap<usize, usize>,
    pub by_language: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub files_written: Vec<PathBuf>,
}

impl BuildStats {
    fn record(&mut self, word: &Word, languages: &[&str]) {
        self.total_words += 1;
        *self.by_length.entry(word.length()).or_insert(0) += 1;
        for language in languages {
            *self.by_language.entry((*language).to_string()).or_insert(0) += 1;
        }
        for category in word.categories() {
            *self.by_category.entry(category.clone()).or_insert(0) += 1;
        }
    }
}

/// Checks a `[min, max]` length range before anything is built with it.
pub fn validate_length_range(min_length: usize, max_length: usize) -> Result<()> {
    if min_length == 0 {
        return Err(DitongError::Config("min_length must be at least 1".into()));
    }
    if min_length > max_length {
        return Err(DitongError::Config(format!(
            "min_length ({min_length}) is greater than max_length ({max_length})"
        )));
    }
    Ok(())
}

/// language -> length -> identifier -> word
type LanguageStore = BTreeMap<String, BTreeMap<usize, BTreeMap<String, Word>>>;

pub struct DictionaryBuilder {
    output_dir: PathBuf,
    min_length: usize,
    max_length: usize,
    words: LanguageStore,
    rejected: usize,
}

impl DictionaryBuilder {
    pub fn new(output_dir: impl Into<PathBuf>, min_length: usize, max_length: usize) -> Result<Self> {
        validate_length_range(min_length, max_length)?;
        Ok(Self {
            output_dir: output_dir.into(),
            min_length,
            max_length,
            words: BTreeMap::new(),
            rejected: 0,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn admits(&self, length: usize) -> bool {
        (self.min_length..=self.max_length).contains(&length)
    }

    /// Adds one word under `language`. Returns `None` when the word was
    /// dropped: its length is out of range or its identifier is not
    /// canonical.
    pub fn add_word(&mut self, word: Word, language: &str) -> Option<MergeOutcome> {
        if !is_valid_identifier(word.normalized()) {
            warn!(word = word.normalized(), "dropped non-canonical identifier");
            self.rejected += 1;
            return None;
        }
        let length = word.length();
        if !self.admits(length) {
            debug!(word = word.normalized(), length, "dropped at admission");
            self.rejected += 1;
            return None;
        }
        let bucket = self
            .words
            .entry(language.to_string())
            .or_default()
            .entry(length)
            .or_default();
        Some(merge_into(bucket, word))
    }

    /// Adds every word of an ingest result under the result's language.
    /// Returns how many words were admitted.
    pub fn add_words(&mut self, result: &IngestResult) -> usize {
        let mut admitted = 0;
        for word in &result.words {
            if self.add_word(word.clone(), &result.language).is_some() {
                admitted += 1;
            }
        }
        debug!(dict = %result.dict_name, admitted, "added ingest result");
        admitted
    }

    /// Number of words dropped at admission so far.
    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn languages(&self) -> Vec<&str> {
        self.words.keys().map(String::as_str).collect()
    }

    pub fn word_count(&self, language: Option<&str>, length: Option<usize>) -> usize {
        self.words
            .iter()
            .filter(|(lang, _)| language.map_or(true, |l| l == lang.as_str()))
            .flat_map(|(_, by_length)| by_length.iter())
            .filter(|(len, _)| length.map_or(true, |l| l == **len))
            .map(|(_, words)| words.len())
            .sum()
    }

    /// One dictionary per non-empty (language, length) cell.
    pub fn language_dictionaries(&self) -> Vec<Dictionary> {
        let mut out = Vec::new();
        for (language, by_length) in &self.words {
            for (length, words) in by_length {
                if words.is_empty() {
                    continue;
                }
                let word_type = word_type_for_length(*length);
                let mut dictionary = Dictionary::new(format!("{language}_{word_type}"))
                    .with_language(language.clone())
                    .with_word_type(word_type);
                for word in words.values() {
                    dictionary.add_word(word.clone());
                }
                out.push(dictionary);
            }
        }
        out
    }

    /// One multi-language dictionary per length. Words sharing an identifier
    /// across languages are combined into fresh copies; the per-language
    /// entries are left untouched.
    pub fn combined_dictionaries(&self, name: &str) -> Vec<Dictionary> {
        let mut combined: BTreeMap<usize, BTreeMap<String, Word>> = BTreeMap::new();
        for by_length in self.words.values() {
            for (length, words) in by_length {
                let bucket = combined.entry(*length).or_default();
                for word in words.values() {
                    combine_into(bucket, word);
                }
            }
        }

        combined
            .into_iter()
            .filter(|(_, words)| !words.is_empty())
            .map(|(length, words)| {
                let word_type = word_type_for_length(length);
                let mut dictionary =
                    Dictionary::new(format!("{name}_{word_type}")).with_word_type(word_type);
                for word in words.into_values() {
                    dictionary.add_word(word);
                }
                dictionary
            })
            .collect()
    }

    /// Writes `<output>/<language>/<N>-c.json` for every non-empty cell.
    /// Every language is checked as a directory name before any file is
    /// written.
    pub fn build(&self) -> Result<BuildStats> {
        for language in self.words.keys() {
            crate::config::validate_output_name(language)?;
        }
        let mut stats = BuildStats::default();
        for dictionary in self.language_dictionaries() {
            let language = dictionary.language.clone().unwrap_or_default();
            for word in dictionary.words() {
                stats.record(word, &[language.as_str()]);
            }
            let path = self.partition_path(&language, &dictionary);
            save_dictionary(&dictionary, &path)?;
            info!(path = %path.display(), words = dictionary.count(), "wrote dictionary");
            stats.files_written.push(path);
        }
        Ok(stats)
    }

    /// Writes `<output>/<name>/<N>-c.json` with all languages merged.
    pub fn build_combined(&self, name: &str) -> Result<BuildStats> {
        crate::config::validate_output_name(name)?;
        let mut stats = BuildStats::default();
        for dictionary in self.combined_dictionaries(name) {
            for word in dictionary.words() {
                let languages: Vec<&str> = word.languages().iter().map(String::as_str).collect();
                stats.record(word, &languages);
            }
            let path = self.partition_path(name, &dictionary);
            save_dictionary(&dictionary, &path)?;
            info!(path = %path.display(), words = dictionary.count(), "wrote combined dictionary");
            stats.files_written.push(path);
        }
        Ok(stats)
    }

    fn partition_path(&self, dir: &str, dictionary: &Dictionary) -> PathBuf {
        let word_type = dictionary.word_type.as_deref().unwrap_or("unknown");
        self.output_dir.join(dir).join(format!("{word_type}.json"))
    }

    /// Every stored word with the language it was filed under.
    pub fn iter_words(&self) -> impl Iterator<Item = (&str, &Word)> {
        self.words.iter().flat_map(|(language, by_length)| {
            by_length
                .values()
                .flat_map(move |words| words.values().map(move |w| (language.as_str(), w)))
        })
    }
}
