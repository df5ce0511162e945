// src/builder/synthesis.rs
//! Filter-driven cross-language views over a shared word pool.
//!
//! ```text
//! <output>/synthesis/<name>/_config.json
//! <output>/synthesis/<name>/<N>-c/<letter>.json   (split_by_letter)
//! <output>/synthesis/<name>/<N>-c.json            (otherwise)
//! ```

use crate::builder::dictionary::{validate_length_range, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH};
use crate::core::dictionary::Dictionary;
use crate::core::merge::{merge_into, MergeOutcome};
use crate::core::normalizer::is_valid_identifier;
use crate::core::types::{word_type_for_length, Word};
use crate::error::Result;
use crate::persistence::{save_dictionary, save_json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory under the output root that holds every synthesis view.
pub const SYNTHESIS_DIR: &str = "synthesis";

fn default_min_length() -> usize {
    DEFAULT_MIN_LENGTH
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_split() -> bool {
    true
}

/// A named filter over the pool. Unset (or empty) sets put no constraint on
/// their dimension; all set dimensions must pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisConfig {
    pub name: String,
    #[serde(default)]
    pub include_languages: Option<BTreeSet<String>>,
    #[serde(default)]
    pub exclude_languages: Option<BTreeSet<String>>,
    #[serde(default)]
    pub include_categories: Option<BTreeSet<String>>,
    #[serde(default)]
    pub exclude_categories: Option<BTreeSet<String>>,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_split")]
    pub split_by_letter: bool,
}

fn to_set<I, S>(items: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Some(items.into_iter().map(Into::into).collect())
}

/// An empty set behaves like an unset one.
fn active(set: &Option<BTreeSet<String>>) -> Option<&BTreeSet<String>> {
    set.as_ref().filter(|s| !s.is_empty())
}

fn intersects(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    a.iter().any(|x| b.contains(x))
}

impl SynthesisConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include_languages: None,
            exclude_languages: None,
            include_categories: None,
            exclude_categories: None,
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            split_by_letter: true,
        }
    }

    pub fn include_languages<I: IntoIterator<Item = S>, S: Into<String>>(mut self, langs: I) -> Self {
        self.include_languages = to_set(langs);
        self
    }

    pub fn exclude_languages<I: IntoIterator<Item = S>, S: Into<String>>(mut self, langs: I) -> Self {
        self.exclude_languages = to_set(langs);
        self
    }

    pub fn include_categories<I: IntoIterator<Item = S>, S: Into<String>>(mut self, cats: I) -> Self {
        self.include_categories = to_set(cats);
        self
    }

    pub fn exclude_categories<I: IntoIterator<Item = S>, S: Into<String>>(mut self, cats: I) -> Self {
        self.exclude_categories = to_set(cats);
        self
    }

    pub fn lengths(mut self, min_length: usize, max_length: usize) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    pub fn split_by_letter(mut self, split: bool) -> Self {
        self.split_by_letter = split;
        self
    }

    pub fn validate(&self) -> Result<()> {
        crate::config::validate_output_name(&self.name)?;
        validate_length_range(self.min_length, self.max_length)
    }

    pub fn matches(&self, word: &Word) -> bool {
        let length = word.length();
        if length < self.min_length || length > self.max_length {
            return false;
        }
        if let Some(include) = active(&self.include_languages) {
            if !intersects(word.languages(), include) {
                return false;
            }
        }
        if let Some(exclude) = active(&self.exclude_languages) {
            if intersects(word.languages(), exclude) {
                return false;
            }
        }
        if let Some(include) = active(&self.include_categories) {
            if !intersects(word.categories(), include) {
                return false;
            }
        }
        if let Some(exclude) = active(&self.exclude_categories) {
            if intersects(word.categories(), exclude) {
                return false;
            }
        }
        true
    }
}

/// Resolved config as written to `_config.json`: empty sets become `null`.
impl Serialize for SynthesisConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("SynthesisConfig", 8)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("include_languages", &active(&self.include_languages))?;
        s.serialize_field("exclude_languages", &active(&self.exclude_languages))?;
        s.serialize_field("include_categories", &active(&self.include_categories))?;
        s.serialize_field("exclude_categories", &active(&self.exclude_categories))?;
        s.serialize_field("min_length", &self.min_length)?;
        s.serialize_field("max_length", &self.max_length)?;
        s.serialize_field("split_by_letter", &self.split_by_letter)?;
        s.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SynthesisStats {
    pub config_name: String,
    pub total_words: usize,
    pub by_length: BTreeMap<usize, usize>,
    pub by_letter: BTreeMap<char, usize>,
    pub languages_included: BTreeSet<String>,
    pub categories_included: BTreeSet<String>,
    pub files_written: Vec<PathBuf>,
}

#[derive(Serialize)]
struct MetadataStats<'a> {
    total_words: usize,
    by_length: &'a BTreeMap<usize, usize>,
    languages: &'a BTreeSet<String>,
    categories: &'a BTreeSet<String>,
}

#[derive(Serialize)]
struct SynthesisMetadata<'a> {
    config: &'a SynthesisConfig,
    generated_at: DateTime<Utc>,
    stats: MetadataStats<'a>,
}

pub struct SynthesisBuilder {
    output_dir: PathBuf,
    pool: BTreeMap<String, Word>,
    rejected: usize,
}

impl SynthesisBuilder {
    /// Output goes under `<output_dir>/synthesis`.
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().join(SYNTHESIS_DIR),
            pool: BTreeMap::new(),
            rejected: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Pools a word regardless of language; identical identifiers merge.
    /// Words whose identifier is not canonical are counted and dropped.
    pub fn add_word(&mut self, word: Word) -> Option<MergeOutcome> {
        if !is_valid_identifier(word.normalized()) {
            warn!(word = word.normalized(), "dropped non-canonical identifier");
            self.rejected += 1;
            return None;
        }
        Some(merge_into(&mut self.pool, word))
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn add_words<I: IntoIterator<Item = Word>>(&mut self, words: I) {
        for word in words {
            self.add_word(word);
        }
    }

    pub fn clear_pool(&mut self) {
        self.pool.clear();
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn pool(&self) -> impl Iterator<Item = &Word> {
        self.pool.values()
    }

    /// Adds the config's name to every matching word's `synthesis_groups`.
    fn label(&mut self, config: &SynthesisConfig) -> usize {
        let mut labeled = 0;
        for word in self.pool.values_mut().filter(|w| config.matches(w)) {
            word.synthesis_groups.insert(config.name.clone());
            labeled += 1;
        }
        debug!(config = %config.name, labeled, "labeled synthesis group");
        labeled
    }

    /// Filters the pool through `config` and writes the result.
    pub fn build(&mut self, config: &SynthesisConfig) -> Result<SynthesisStats> {
        config.validate()?;
        self.label(config);
        self.write(config)
    }

    /// Labels every config before writing anything, so each written word
    /// lists all the groups of this run it belongs to.
    pub fn build_multiple(&mut self, configs: &[SynthesisConfig]) -> Result<Vec<SynthesisStats>> {
        for config in configs {
            config.validate()?;
        }
        for config in configs {
            self.label(config);
        }
        configs.iter().map(|config| self.write(config)).collect()
    }

    fn write(&self, config: &SynthesisConfig) -> Result<SynthesisStats> {
        let mut stats = SynthesisStats {
            config_name: config.name.clone(),
            ..SynthesisStats::default()
        };

        // length -> letter -> words, already in identifier order
        let mut grouped: BTreeMap<usize, BTreeMap<char, Vec<&Word>>> = BTreeMap::new();
        for word in self.pool.values().filter(|w| config.matches(w)) {
            let Some(letter) = word.first_letter() else { continue };
            grouped
                .entry(word.length())
                .or_default()
                .entry(letter)
                .or_default()
                .push(word);

            stats.total_words += 1;
            *stats.by_length.entry(word.length()).or_insert(0) += 1;
            *stats.by_letter.entry(letter).or_insert(0) += 1;
            stats.languages_included.extend(word.languages().iter().cloned());
            stats.categories_included.extend(word.categories().iter().cloned());
        }

        let synth_dir = self.output_dir.join(&config.name);
        let metadata = SynthesisMetadata {
            config,
            generated_at: Utc::now(),
            stats: MetadataStats {
                total_words: stats.total_words,
                by_length: &stats.by_length,
                languages: &stats.languages_included,
                categories: &stats.categories_included,
            },
        };
        let config_path = synth_dir.join("_config.json");
        save_json(&metadata, &config_path)?;
        stats.files_written.push(config_path);

        for (length, by_letter) in &grouped {
            let word_type = word_type_for_length(*length);
            if config.split_by_letter {
                let length_dir = synth_dir.join(&word_type);
                for (letter, words) in by_letter {
                    let mut dictionary =
                        Dictionary::new(format!("{}_{word_type}_{letter}", config.name))
                            .with_word_type(word_type.clone());
                    for word in words {
                        dictionary.add_word((*word).clone());
                    }
                    let path = length_dir.join(format!("{letter}.json"));
                    save_dictionary(&dictionary, &path)?;
                    stats.files_written.push(path);
                }
            } else {
                let mut dictionary = Dictionary::new(format!("{}_{word_type}", config.name))
                    .with_word_type(word_type.clone());
                for word in by_letter.values().flatten() {
                    dictionary.add_word((*word).clone());
                }
                let path = synth_dir.join(format!("{word_type}.json"));
                save_dictionary(&dictionary, &path)?;
                stats.files_written.push(path);
            }
        }

        info!(
            config = %config.name,
            words = stats.total_words,
            files = stats.files_written.len(),
            "wrote synthesis"
        );
        Ok(stats)
    }
}
