// src/ingest/plain_text.rs
use super::{lossy_lines, RawEntry, WordParser};
use crate::error::Result;
use std::io::BufRead;

pub const NAME: &str = "plain_text";

const COMMENT: char = '#';

/// One word per line. Blank lines and `#` comments, whole-line or trailing,
/// are skipped.
pub struct PlainTextParser;

pub(crate) fn parse_word_list(reader: &mut dyn BufRead) -> Result<Vec<RawEntry>> {
    let mut entries = Vec::new();
    for (line_number, line) in lossy_lines(reader)? {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT) {
            continue;
        }
        let word = match line.split_once(COMMENT) {
            Some((before, _)) => before.trim(),
            None => line,
        };
        if !word.is_empty() {
            entries.push(RawEntry::new(word, line_number));
        }
    }
    Ok(entries)
}

impl WordParser for PlainTextParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["txt", "list", "words"]
    }

    fn parse_reader(&self, reader: &mut dyn BufRead) -> Result<Vec<RawEntry>> {
        parse_word_list(reader)
    }
}
