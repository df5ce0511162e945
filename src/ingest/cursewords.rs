// src/ingest/cursewords.rs
use super::plain_text::parse_word_list;
use super::{RawEntry, WordParser};
use crate::error::Result;
use std::io::BufRead;
use std::path::Path;

pub const NAME: &str = "cursewords";
pub const CATEGORY: &str = "curseword";

/// Compound profanity runs long.
pub const MAX_LENGTH: usize = 15;

pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "tr", "de", "fr", "es", "it", "pt", "nl", "pl", "ru"];

/// Plain word lists whose entries are filed under `curseword` and tagged so.
pub struct CursewordParser;

impl WordParser for CursewordParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["txt", ""]
    }

    fn supported_languages(&self) -> Option<&'static [&'static str]> {
        Some(SUPPORTED_LANGUAGES)
    }

    fn forced_category(&self) -> Option<&'static str> {
        Some(CATEGORY)
    }

    fn word_tags(&self) -> &'static [&'static str] {
        &[CATEGORY]
    }

    fn default_max_length(&self) -> usize {
        MAX_LENGTH
    }

    fn dict_name(&self, _path: &Path, language: &str) -> String {
        format!("cursewords_{language}")
    }

    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<Vec<RawEntry>> {
        parse_word_list(reader)
    }
}
