// src/ingest/mod.rs
//! Ingestion boundary.
//!
//! A [`WordParser`] turns a file into raw `(word, line)` entries. An
//! [`Ingestor`] pairs a parser with a language, category and length range,
//! normalizes every entry and merges repeats within the one source, producing
//! an [`IngestResult`] the builders consume.

pub mod cursewords;
pub mod hunspell;
pub mod plain_text;

use crate::builder::dictionary::{validate_length_range, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH};
use crate::core::merge::{merge_into, MergeOutcome};
use crate::core::normalizer::normalize_and_validate;
use crate::core::types::{Source, Word, STANDARD_CATEGORY};
use crate::error::{DitongError, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One entry as it appears in a source file, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub word: String,
    pub line_number: Option<u32>,
}

impl RawEntry {
    pub fn new(word: impl Into<String>, line_number: u32) -> Self {
        Self { word: word.into(), line_number: Some(line_number) }
    }
}

/// Reads `reader` line by line as `(line_number, text)`. Invalid UTF-8 is
/// replaced rather than rejected.
pub(crate) fn lossy_lines(reader: &mut dyn BufRead) -> Result<Vec<(u32, String)>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0u32;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| DitongError::io("<reader>", e))?;
        if read == 0 {
            break;
        }
        line_number += 1;
        lines.push((line_number, String::from_utf8_lossy(&buf).into_owned()));
    }
    Ok(lines)
}

/// A source format.
pub trait WordParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extensions this format is usually stored under; `""` stands for none.
    fn file_extensions(&self) -> &'static [&'static str];

    fn recognizes(&self, path: &Path) -> bool {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.file_extensions()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension))
    }

    /// Languages the adapter accepts; `None` means any.
    fn supported_languages(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Category every word from this adapter is filed under, overriding the
    /// ingestor's configured one.
    fn forced_category(&self) -> Option<&'static str> {
        None
    }

    /// Tags added to every word from this adapter.
    fn word_tags(&self) -> &'static [&'static str] {
        &[]
    }

    fn default_max_length(&self) -> usize {
        DEFAULT_MAX_LENGTH
    }

    fn dict_name(&self, path: &Path, _language: &str) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name().to_string())
    }

    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<Vec<RawEntry>>;

    fn parse_path(&self, path: &Path) -> Result<Vec<RawEntry>> {
        let file = File::open(path).map_err(|e| DitongError::io(path, e))?;
        let mut reader = BufReader::new(file);
        self.parse_reader(&mut reader).map_err(|e| match e {
            DitongError::Io { source, .. } => DitongError::io(path, source),
            other => other,
        })
    }
}

/// Output of ingesting one source: its words, already normalized and merged
/// within the source, plus counts.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub words: Vec<Word>,
    pub source_path: String,
    pub dict_name: String,
    pub language: String,
    pub category: String,
    /// Entries the parser produced.
    pub total_raw: usize,
    /// Unique words kept.
    pub total_valid: usize,
    /// Kept entries that merged into an earlier word of the same source.
    pub total_duplicates: usize,
    /// Entries dropped by normalization or the length range.
    pub total_rejected: usize,
}

impl fmt::Display for IngestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} valid, {} dupes, {} rejected",
            self.dict_name, self.total_valid, self.total_raw, self.total_duplicates, self.total_rejected
        )
    }
}

pub struct Ingestor {
    parser: Box<dyn WordParser>,
    language: String,
    category: String,
    min_length: usize,
    max_length: usize,
    dict_name: Option<String>,
}

impl Ingestor {
    /// Fails with a configuration error when the adapter does not support
    /// `language`, or when `language` cannot serve as an output directory
    /// name.
    pub fn new(parser: Box<dyn WordParser>, language: impl Into<String>) -> Result<Self> {
        let language = language.into();
        crate::config::validate_output_name(&language)?;
        if let Some(supported) = parser.supported_languages() {
            if !supported.contains(&language.as_str()) {
                return Err(DitongError::Config(format!(
                    "{} does not support language '{language}' (supported: {})",
                    parser.name(),
                    supported.join(", ")
                )));
            }
        }
        let category = parser.forced_category().unwrap_or(STANDARD_CATEGORY).to_string();
        let max_length = parser.default_max_length();
        Ok(Self {
            parser,
            language,
            category,
            min_length: DEFAULT_MIN_LENGTH,
            max_length,
            dict_name: None,
        })
    }

    /// Ignored for adapters that force their own category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        if self.parser.forced_category().is_none() {
            self.category = category.into();
        }
        self
    }

    pub fn with_lengths(mut self, min_length: usize, max_length: usize) -> Result<Self> {
        validate_length_range(min_length, max_length)?;
        self.min_length = min_length;
        self.max_length = max_length;
        Ok(self)
    }

    pub fn with_dict_name(mut self, dict_name: impl Into<String>) -> Self {
        self.dict_name = Some(dict_name.into());
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn parser_name(&self) -> &'static str {
        self.parser.name()
    }

    pub fn ingest_path(&self, path: &Path) -> Result<IngestResult> {
        if !self.parser.recognizes(path) {
            warn!(
                path = %path.display(),
                parser = self.parser.name(),
                expected = ?self.parser.file_extensions(),
                "unexpected file extension for parser"
            );
        }
        let entries = self.parser.parse_path(path)?;
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let dict_name = self
            .dict_name
            .clone()
            .unwrap_or_else(|| self.parser.dict_name(path, &self.language));
        let result = self.collect(entries, resolved.to_string_lossy().into_owned(), dict_name);
        info!(
            source = %result.dict_name,
            valid = result.total_valid,
            raw = result.total_raw,
            duplicates = result.total_duplicates,
            "ingested"
        );
        Ok(result)
    }

    /// Ingests from an in-memory reader; `label` stands in for the file path.
    pub fn ingest_reader(&self, reader: &mut dyn BufRead, label: &str) -> Result<IngestResult> {
        let entries = self.parser.parse_reader(reader)?;
        let dict_name = self
            .dict_name
            .clone()
            .unwrap_or_else(|| self.parser.dict_name(Path::new(label), &self.language));
        Ok(self.collect(entries, label.to_string(), dict_name))
    }

    fn collect(&self, entries: Vec<RawEntry>, source_path: String, dict_name: String) -> IngestResult {
        let mut words: BTreeMap<String, Word> = BTreeMap::new();
        let mut total_duplicates = 0;
        let mut total_rejected = 0;
        let total_raw = entries.len();

        for entry in entries {
            let Some(normalized) = normalize_and_validate(&entry.word) else {
                total_rejected += 1;
                continue;
            };
            if normalized.len() < self.min_length || normalized.len() > self.max_length {
                total_rejected += 1;
                continue;
            }

            let source = Source::new(
                dict_name.clone(),
                source_path.clone(),
                self.language.clone(),
                entry.word,
                entry.line_number,
                self.category.clone(),
            );
            let mut word = Word::new(normalized, source);
            word.tags.extend(self.parser.word_tags().iter().map(|t| t.to_string()));

            if merge_into(&mut words, word) == MergeOutcome::Merged {
                total_duplicates += 1;
            }
        }

        IngestResult {
            total_valid: words.len(),
            words: words.into_values().collect(),
            source_path,
            dict_name,
            language: self.language.clone(),
            category: self.category.clone(),
            total_raw,
            total_duplicates,
            total_rejected,
        }
    }
}

type ParserFactory = fn() -> Box<dyn WordParser>;

/// Adapters by name.
pub struct ParserRegistry {
    factories: BTreeMap<String, ParserFactory>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(hunspell::NAME, || Box::new(hunspell::HunspellParser));
        registry.register(plain_text::NAME, || Box::new(plain_text::PlainTextParser));
        registry.register(cursewords::NAME, || Box::new(cursewords::CursewordParser));
        registry
    }
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self { factories: BTreeMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ParserFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn get(&self, name: &str) -> Result<Box<dyn WordParser>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| DitongError::UnknownIngestor {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

/// One source to ingest.
pub struct IngestJob {
    pub ingestor: Ingestor,
    pub path: PathBuf,
}

/// Runs each job on the rayon pool with its own accumulator. Results come
/// back in job order; merging them into shared builders is up to the caller.
pub fn ingest_parallel(jobs: &[IngestJob]) -> Vec<Result<IngestResult>> {
    jobs.par_iter()
        .map(|job| {
            job.ingestor.ingest_path(&job.path).map_err(|e| {
                warn!(path = %job.path.display(), error = %e, "ingestion failed");
                e
            })
        })
        .collect()
}
