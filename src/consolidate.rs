// src/consolidate.rs
//! Flattens a built output tree into plain word lists, one per length class,
//! as JSON and CSV, plus `all_words.{json,csv}`.

use crate::error::{DitongError, Result};
use crate::metrics::METRICS_DIR;
use crate::persistence::{dictionary_files, load_dictionary, save_json, write_atomically};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordSummary {
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedList {
    #[serde(rename = "type")]
    pub word_type: String,
    pub count: usize,
    pub words: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_with_metadata: Option<Vec<WordSummary>>,
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidateStats {
    pub by_type: BTreeMap<String, usize>,
    pub total_unique: usize,
    pub files_written: Vec<PathBuf>,
}

/// Gathers words per length class from every dictionary under `input_dir`
/// and writes the lists to `output_dir`. The first file to mention an
/// identifier supplies its metadata. `output_dir` and the run-metrics
/// directory are skipped if they sit inside `input_dir`.
pub fn consolidate(input_dir: &Path, output_dir: &Path, with_metadata: bool) -> Result<ConsolidateStats> {
    let mut by_type: BTreeMap<String, BTreeMap<String, WordSummary>> = BTreeMap::new();

    let metrics_dir = input_dir.join(METRICS_DIR);
    for path in dictionary_files(input_dir, &[output_dir, &metrics_dir])? {
        let dictionary = match load_dictionary(&path) {
            Ok(d) => d,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                continue;
            }
        };
        let word_type = dictionary.word_type.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let bucket = by_type.entry(word_type).or_default();
        for word in dictionary.words() {
            bucket.entry(word.normalized().to_string()).or_insert_with(|| WordSummary {
                word: word.normalized().to_string(),
                ipa: word.ipa.clone(),
                languages: word.languages().iter().cloned().collect(),
            });
        }
    }

    fs::create_dir_all(output_dir).map_err(|e| DitongError::io(output_dir, e))?;
    let mut stats = ConsolidateStats::default();
    let mut all_words = BTreeSet::new();

    for (word_type, words) in by_type {
        let list = ConsolidatedList {
            word_type: word_type.clone(),
            count: words.len(),
            words: words.keys().cloned().collect(),
            words_with_metadata: with_metadata.then(|| words.values().cloned().collect()),
        };
        let json_path = output_dir.join(format!("{word_type}.json"));
        save_json(&list, &json_path)?;

        let csv_path = output_dir.join(format!("{word_type}.csv"));
        write_csv(&csv_path, words.values(), with_metadata)?;

        info!(word_type = %word_type, words = list.count, "consolidated");
        stats.by_type.insert(word_type, list.count);
        stats.files_written.push(json_path);
        stats.files_written.push(csv_path);
        all_words.extend(list.words);
    }

    let all = ConsolidatedList {
        word_type: "all".to_string(),
        count: all_words.len(),
        words: all_words.into_iter().collect(),
        words_with_metadata: None,
    };
    let json_path = output_dir.join("all_words.json");
    save_json(&all, &json_path)?;
    let csv_path = output_dir.join("all_words.csv");
    write_atomically(&csv_path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        for word in &all.words {
            writer.write_record([word]).map_err(|e| DitongError::csv(&csv_path, e))?;
        }
        writer.flush().map_err(|e| DitongError::io(&csv_path, e))
    })?;

    stats.total_unique = all.count;
    stats.files_written.push(json_path);
    stats.files_written.push(csv_path);
    Ok(stats)
}

fn write_csv<'a, I>(path: &Path, words: I, with_metadata: bool) -> Result<()>
where
    I: IntoIterator<Item = &'a WordSummary>,
{
    write_atomically(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        let csv_err = |e: csv::Error| DitongError::csv(path, e);
        if with_metadata {
            writer.write_record(["word", "ipa", "languages"]).map_err(csv_err)?;
        }
        for summary in words {
            if with_metadata {
                let ipa = summary.ipa.as_deref().unwrap_or_default();
                let languages = summary.languages.join(";");
                writer
                    .write_record([summary.word.as_str(), ipa, languages.as_str()])
                    .map_err(csv_err)?;
            } else {
                writer.write_record([summary.word.as_str()]).map_err(csv_err)?;
            }
        }
        writer.flush().map_err(|e| DitongError::io(path, e))
    })
}
