// src/core/types.rs
use crate::core::normalizer::is_valid_identifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default category for words coming from ordinary dictionaries.
pub const STANDARD_CATEGORY: &str = "standard";

/// Length-class label for a word length, e.g. `5` -> `"5-c"`.
pub fn word_type_for_length(length: usize) -> String {
    format!("{length}-c")
}

/// Inverse of [`word_type_for_length`].
pub fn length_from_word_type(word_type: &str) -> Option<usize> {
    word_type.strip_suffix("-c")?.parse().ok()
}

/// One attestation of a word: which dictionary, file, line and category
/// produced a canonical identifier, and in what original spelling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Source {
    pub dict_name: String,
    pub dict_filepath: String,
    pub language: String,
    pub original_form: String,
    pub line_number: Option<u32>,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    STANDARD_CATEGORY.to_string()
}

impl Source {
    pub fn new(
        dict_name: impl Into<String>,
        dict_filepath: impl Into<String>,
        language: impl Into<String>,
        original_form: impl Into<String>,
        line_number: Option<u32>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            dict_name: dict_name.into(),
            dict_filepath: dict_filepath.into(),
            language: language.into(),
            original_form: original_form.into(),
            line_number,
            category: category.into(),
        }
    }
}

/// The canonical, deduplicated entity.
///
/// `categories` and `languages` are derived from `sources` and can only grow
/// through [`Word::add_source`], so they always equal the union over the
/// attached sources. A word always has at least one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WordRecord", into = "WordRecord")]
pub struct Word {
    normalized: String,
    sources: Vec<Source>,
    categories: BTreeSet<String>,
    languages: BTreeSet<String>,
    /// Caller-controlled labels, unioned on merge.
    pub tags: BTreeSet<String>,
    pub ipa: Option<String>,
    pub synthesis_groups: BTreeSet<String>,
}

impl Word {
    /// Creates a word from its canonical identifier and first attestation.
    /// The identifier is expected to come from the normalizer.
    pub fn new(normalized: impl Into<String>, source: Source) -> Self {
        let mut word = Self {
            normalized: normalized.into(),
            sources: Vec::with_capacity(1),
            categories: BTreeSet::new(),
            languages: BTreeSet::new(),
            tags: BTreeSet::new(),
            ipa: None,
            synthesis_groups: BTreeSet::new(),
        };
        word.add_source(source);
        word
    }

    /// The only way to attach a source. Extends the derived sets.
    pub fn add_source(&mut self, source: Source) {
        if !self.categories.contains(&source.category) {
            self.categories.insert(source.category.clone());
        }
        if !self.languages.contains(&source.language) {
            self.languages.insert(source.language.clone());
        }
        self.sources.push(source);
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Character count of the identifier. Identifiers are ASCII, so this is
    /// also the byte length.
    pub fn length(&self) -> usize {
        self.normalized.len()
    }

    pub fn word_type(&self) -> String {
        word_type_for_length(self.length())
    }

    pub fn first_letter(&self) -> Option<char> {
        self.normalized.chars().next()
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    /// Dictionary names of every source, in attachment order, duplicates kept.
    pub fn source_dicts(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.dict_name.as_str())
    }

    pub(crate) fn into_contributions(self) -> (Vec<Source>, BTreeSet<String>, BTreeSet<String>) {
        (self.sources, self.tags, self.synthesis_groups)
    }
}

/// Wire shape of a [`Word`] in dictionary files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WordRecord {
    normalized: String,
    length: usize,
    #[serde(rename = "type")]
    word_type: String,
    sources: Vec<Source>,
    #[serde(default)]
    categories: BTreeSet<String>,
    #[serde(default)]
    languages: BTreeSet<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    ipa: Option<String>,
    #[serde(default)]
    synthesis_groups: BTreeSet<String>,
}

impl From<Word> for WordRecord {
    fn from(word: Word) -> Self {
        Self {
            length: word.length(),
            word_type: word.word_type(),
            normalized: word.normalized,
            sources: word.sources,
            categories: word.categories,
            languages: word.languages,
            tags: word.tags,
            ipa: word.ipa,
            synthesis_groups: word.synthesis_groups,
        }
    }
}

impl TryFrom<WordRecord> for Word {
    type Error = String;

    /// Rebuilds the derived sets from the sources instead of trusting the
    /// stored arrays.
    fn try_from(record: WordRecord) -> Result<Self, Self::Error> {
        if !is_valid_identifier(&record.normalized) {
            return Err(format!("'{}' is not a canonical identifier", record.normalized));
        }
        let length = record.normalized.len();
        if record.length != length || length_from_word_type(&record.word_type) != Some(length) {
            return Err(format!(
                "'{}' has length {} but records length {} and type '{}'",
                record.normalized, length, record.length, record.word_type
            ));
        }

        let mut sources = record.sources.into_iter();
        let first = sources
            .next()
            .ok_or_else(|| format!("'{}' has no sources", record.normalized))?;
        let mut word = Word::new(record.normalized, first);
        for source in sources {
            word.add_source(source);
        }
        word.tags = record.tags;
        word.ipa = record.ipa;
        word.synthesis_groups = record.synthesis_groups;
        Ok(word)
    }
}
