// src/ingest/hunspell.rs
//! Hunspell `.dic` files: an optional word count on line 1, then
//! `word/FLAGS` per line.

use super::{lossy_lines, RawEntry, WordParser};
use crate::error::Result;
use std::io::BufRead;
use std::path::Path;

pub const NAME: &str = "hunspell";

pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "tr", "de", "fr", "es", "it", "pt", "nl", "pl", "ru"];

pub struct HunspellParser;

impl WordParser for HunspellParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["dic"]
    }

    fn supported_languages(&self) -> Option<&'static [&'static str]> {
        Some(SUPPORTED_LANGUAGES)
    }

    fn dict_name(&self, _path: &Path, language: &str) -> String {
        format!("hunspell_{language}")
    }

    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<Vec<RawEntry>> {
        let mut entries = Vec::new();
        for (line_number, line) in lossy_lines(reader)? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line_number == 1 && line.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let word = line.split('/').next().unwrap_or_default();
            if !word.is_empty() {
                entries.push(RawEntry::new(word, line_number));
            }
        }
        Ok(entries)
    }
}
