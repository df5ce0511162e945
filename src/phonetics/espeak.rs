// src/phonetics/espeak.rs
use super::Transcriber;
use std::process::Command;
use tracing::debug;

pub const NAME: &str = "espeak";

const PROGRAM: &str = "espeak-ng";

/// Shells out to `espeak-ng --ipa`. Any failure, including a missing
/// executable, yields `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EspeakTranscriber;

impl EspeakTranscriber {
    fn voice(language: &str) -> Option<&'static str> {
        Some(match language {
            "en" => "en-us",
            "tr" => "tr",
            "de" => "de",
            "fr" => "fr",
            "es" => "es",
            "it" => "it",
            "nl" => "nl",
            "pl" => "pl",
            "ru" => "ru",
            "pt" => "pt",
            _ => return None,
        })
    }
}

impl Transcriber for EspeakTranscriber {
    fn name(&self) -> &'static str {
        NAME
    }

    fn supported_languages(&self) -> &'static [&'static str] {
        &["en", "tr", "de", "fr", "es", "it", "nl", "pl", "ru", "pt"]
    }

    fn transcribe(&self, word: &str, language: &str) -> Option<String> {
        let voice = Self::voice(language)?;
        let output = Command::new(PROGRAM)
            .args(["-v", voice, "-q", "--ipa", word])
            .output()
            .map_err(|e| debug!(error = %e, "espeak-ng unavailable"))
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let ipa = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!ipa.is_empty()).then_some(ipa)
    }
}
