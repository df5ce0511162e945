// src/core/dictionary.rs
use crate::core::merge::{merge_into, MergeOutcome};
use crate::core::types::Word;
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// A named collection of words keyed by canonical identifier.
///
/// Adding a word whose identifier is already present merges it into the
/// existing entry. `languages` and `source_dicts` are derived from the added
/// words and only change through [`Dictionary::add_word`].
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "DictionaryRecord")]
pub struct Dictionary {
    pub name: String,
    /// `None` for combined and synthesis collections.
    pub language: Option<String>,
    /// Length-class label when the dictionary holds a single length, e.g. `"5-c"`.
    pub word_type: Option<String>,
    pub generated_at: DateTime<Utc>,
    languages: BTreeSet<String>,
    source_dicts: BTreeSet<String>,
    words: BTreeMap<String, Word>,
}

impl Dictionary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: None,
            word_type: None,
            generated_at: Utc::now(),
            languages: BTreeSet::new(),
            source_dicts: BTreeSet::new(),
            words: BTreeMap::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_word_type(mut self, word_type: impl Into<String>) -> Self {
        self.word_type = Some(word_type.into());
        self
    }

    /// Adds or merges a word.
    pub fn add_word(&mut self, word: Word) -> MergeOutcome {
        self.languages.extend(word.languages().iter().cloned());
        for dict in word.source_dicts() {
            if !self.source_dicts.contains(dict) {
                self.source_dicts.insert(dict.to_string());
            }
        }
        merge_into(&mut self.words, word)
    }

    pub fn get(&self, normalized: &str) -> Option<&Word> {
        self.words.get(normalized)
    }

    /// Words in canonical-identifier order.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.words.values()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.words.keys().map(String::as_str)
    }

    pub fn count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    pub fn source_dicts(&self) -> &BTreeSet<String> {
        &self.source_dicts
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Dictionary", 8)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("language", &self.language)?;
        s.serialize_field("languages", &self.languages)?;
        s.serialize_field("word_type", &self.word_type)?;
        s.serialize_field("generated_at", &self.generated_at)?;
        s.serialize_field("source_dicts", &self.source_dicts)?;
        s.serialize_field("word_count", &self.words.len())?;
        s.serialize_field("words", &self.words)?;
        s.end()
    }
}

#[derive(Deserialize)]
struct DictionaryRecord {
    name: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    word_type: Option<String>,
    #[serde(default = "Utc::now")]
    generated_at: DateTime<Utc>,
    #[serde(default)]
    word_count: Option<usize>,
    #[serde(default)]
    words: BTreeMap<String, Word>,
}

impl TryFrom<DictionaryRecord> for Dictionary {
    type Error = String;

    fn try_from(record: DictionaryRecord) -> Result<Self, Self::Error> {
        if let Some(expected) = record.word_count {
            if expected != record.words.len() {
                return Err(format!(
                    "word_count is {expected} but {} words are present",
                    record.words.len()
                ));
            }
        }

        let mut dictionary = Dictionary::new(record.name);
        dictionary.language = record.language;
        dictionary.word_type = record.word_type;
        dictionary.generated_at = record.generated_at;
        for (key, word) in record.words {
            if key != word.normalized() {
                return Err(format!("key '{key}' holds word '{}'", word.normalized()));
            }
            dictionary.add_word(word);
        }
        Ok(dictionary)
    }
}
