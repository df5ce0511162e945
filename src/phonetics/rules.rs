// src/phonetics/rules.rs
//! Grapheme-table transcriber. Rough, but needs nothing installed.

use super::Transcriber;

pub const NAME: &str = "rules";

/// Longest grapheme any table holds, in chars.
const MAX_GRAPHEME: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleSet {
    English,
    Turkish,
    German,
    French,
    Basic,
}

impl RuleSet {
    fn for_language(language: &str) -> Self {
        match language {
            "en" => RuleSet::English,
            "tr" => RuleSet::Turkish,
            "de" => RuleSet::German,
            "fr" => RuleSet::French,
            _ => RuleSet::Basic,
        }
    }

    fn lookup(self, grapheme: &str) -> Option<&'static str> {
        match self {
            RuleSet::English => english(grapheme),
            RuleSet::Turkish => turkish(grapheme),
            RuleSet::German => german(grapheme),
            RuleSet::French => french(grapheme),
            RuleSet::Basic => basic(grapheme),
        }
    }
}

fn basic(g: &str) -> Option<&'static str> {
    Some(match g {
        "a" => "a", "b" => "b", "c" => "k", "d" => "d", "e" => "e",
        "f" => "f", "g" => "g", "h" => "h", "i" => "i", "j" => "dʒ",
        "k" => "k", "l" => "l", "m" => "m", "n" => "n", "o" => "o",
        "p" => "p", "q" => "k", "r" => "r", "s" => "s", "t" => "t",
        "u" => "u", "v" => "v", "w" => "w", "x" => "ks", "y" => "j",
        "z" => "z",
        _ => return None,
    })
}

fn english(g: &str) -> Option<&'static str> {
    Some(match g {
        "tion" => "ʃən", "sion" => "ʒən", "ough" => "oʊ", "eigh" => "eɪ", "ould" => "ʊd",
        "igh" => "aɪ",
        "th" => "θ", "ch" => "tʃ", "sh" => "ʃ", "ph" => "f", "wh" => "w",
        "ng" => "ŋ", "ck" => "k", "gh" => "", "kn" => "n", "wr" => "r", "mb" => "m",
        "ee" => "iː", "ea" => "iː", "oo" => "uː", "ou" => "aʊ", "oi" => "ɔɪ",
        "oy" => "ɔɪ", "ai" => "eɪ", "ay" => "eɪ", "aw" => "ɔː", "au" => "ɔː",
        "ew" => "juː",
        "a" => "æ", "e" => "ɛ", "i" => "ɪ", "o" => "ɒ", "u" => "ʌ",
        _ => return basic(g),
    })
}

fn turkish(g: &str) -> Option<&'static str> {
    Some(match g {
        "ç" => "tʃ", "ş" => "ʃ", "ğ" => "ː", "ı" => "ɯ", "ö" => "ø", "ü" => "y",
        "c" => "dʒ", "j" => "ʒ", "q" | "w" | "x" => return None,
        _ => return basic(g),
    })
}

fn german(g: &str) -> Option<&'static str> {
    Some(match g {
        "tsch" => "tʃ", "sch" => "ʃ",
        "ch" => "x", "tz" => "ts", "ie" => "iː", "ei" => "aɪ", "eu" => "ɔʏ",
        "äu" => "ɔʏ", "au" => "aʊ",
        "ß" => "s", "ä" => "ɛ", "ö" => "ø", "ü" => "y",
        "j" => "j", "v" => "f", "w" => "v", "y" => "y", "z" => "ts",
        _ => return basic(g),
    })
}

fn french(g: &str) -> Option<&'static str> {
    Some(match g {
        "eau" => "o",
        "ch" => "ʃ", "gn" => "ɲ", "qu" => "k", "ou" => "u", "oi" => "wa",
        "ai" => "ɛ", "ei" => "ɛ", "au" => "o", "eu" => "ø", "œu" => "ø",
        "an" => "ɑ̃", "en" => "ɑ̃", "in" => "ɛ̃", "on" => "ɔ̃", "un" => "œ̃",
        "œ" => "ø", "é" => "e", "è" | "ê" | "ë" => "ɛ", "à" => "a", "â" => "ɑ",
        "î" | "ï" => "i", "ô" => "o", "û" | "ù" => "y", "ç" => "s",
        "e" => "ə", "h" => "", "j" => "ʒ", "r" => "ʁ", "u" => "y", "y" => "i",
        _ => return basic(g),
    })
}

/// Greedy longest-match over the language's grapheme table. Letters with no
/// rule pass through; anything else is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleTranscriber;

impl RuleTranscriber {
    pub fn new() -> Self {
        Self
    }

    pub fn transliterate(&self, word: &str, language: &str) -> String {
        let rules = RuleSet::for_language(language);
        let chars: Vec<char> = word.to_lowercase().chars().collect();
        let mut result = String::new();
        let mut i = 0;

        while i < chars.len() {
            let longest = MAX_GRAPHEME.min(chars.len() - i);
            let matched = (1..=longest).rev().find_map(|len| {
                let grapheme: String = chars[i..i + len].iter().collect();
                rules.lookup(&grapheme).map(|ipa| (ipa, len))
            });

            match matched {
                Some((ipa, len)) => {
                    result.push_str(ipa);
                    i += len;
                }
                None => {
                    if chars[i].is_alphabetic() {
                        result.push(chars[i]);
                    }
                    i += 1;
                }
            }
        }
        result
    }
}

impl Transcriber for RuleTranscriber {
    fn name(&self) -> &'static str {
        NAME
    }

    fn supported_languages(&self) -> &'static [&'static str] {
        &["en", "tr", "de", "fr"]
    }

    /// Every language gets at least the basic table.
    fn supports_language(&self, _language: &str) -> bool {
        true
    }

    fn transcribe(&self, word: &str, language: &str) -> Option<String> {
        let ipa = self.transliterate(word, language);
        (!ipa.is_empty()).then_some(ipa)
    }
}
