// src/phonetics/mod.rs
//! Phonetic boundary: `transcribe(word, language) -> Option<ipa>`.
//!
//! Backends are looked up by name in a [`TranscriberRegistry`]. The name used
//! when none is given lives in a process-wide setting; tests that change it
//! must call [`reset_default_transcriber`] afterwards.

pub mod espeak;
pub mod rules;

use crate::error::{DitongError, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

pub use espeak::EspeakTranscriber;
pub use rules::RuleTranscriber;

pub const DEFAULT_TRANSCRIBER: &str = rules::NAME;

pub trait Transcriber: Send + Sync {
    fn name(&self) -> &'static str;

    fn supported_languages(&self) -> &'static [&'static str];

    fn supports_language(&self, language: &str) -> bool {
        self.supported_languages().contains(&language)
    }

    /// The result is stored verbatim; nothing validates it as IPA.
    fn transcribe(&self, word: &str, language: &str) -> Option<String>;

    fn batch_transcribe(&self, words: &[&str], language: &str) -> BTreeMap<String, Option<String>> {
        words
            .iter()
            .map(|w| (w.to_string(), self.transcribe(w, language)))
            .collect()
    }
}

type TranscriberFactory = fn() -> Arc<dyn Transcriber>;

pub struct TranscriberRegistry {
    factories: BTreeMap<String, TranscriberFactory>,
}

impl Default for TranscriberRegistry {
    fn default() -> Self {
        let mut registry = Self { factories: BTreeMap::new() };
        registry.register(rules::NAME, || Arc::new(RuleTranscriber));
        registry.register(espeak::NAME, || Arc::new(EspeakTranscriber));
        registry
    }
}

impl TranscriberRegistry {
    pub fn register(&mut self, name: impl Into<String>, factory: TranscriberFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Transcriber>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| DitongError::UnknownTranscriber {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

static BUILTIN: Lazy<TranscriberRegistry> = Lazy::new(TranscriberRegistry::default);

static DEFAULT_BACKEND: Lazy<RwLock<String>> =
    Lazy::new(|| RwLock::new(DEFAULT_TRANSCRIBER.to_string()));

pub fn default_transcriber() -> String {
    DEFAULT_BACKEND
        .read()
        .map(|name| name.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
}

/// Changes the backend used when callers pass no name. Fails for names the
/// built-in registry does not know.
pub fn set_default_transcriber(name: &str) -> Result<()> {
    if !BUILTIN.contains(name) {
        return Err(DitongError::UnknownTranscriber {
            name: name.to_string(),
            available: BUILTIN.names().join(", "),
        });
    }
    let mut guard = DEFAULT_BACKEND
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = name.to_string();
    Ok(())
}

pub fn reset_default_transcriber() {
    let mut guard = DEFAULT_BACKEND
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = DEFAULT_TRANSCRIBER.to_string();
}

/// Resolves `backend`, or the process default when `None`.
pub fn get_transcriber(backend: Option<&str>) -> Result<Arc<dyn Transcriber>> {
    match backend {
        Some(name) => BUILTIN.get(name),
        None => BUILTIN.get(&default_transcriber()),
    }
}

pub fn transcribe(word: &str, language: &str, backend: Option<&str>) -> Result<Option<String>> {
    Ok(get_transcriber(backend)?.transcribe(word, language))
}

pub fn batch_transcribe(
    words: &[&str],
    language: &str,
    backend: Option<&str>,
) -> Result<BTreeMap<String, Option<String>>> {
    Ok(get_transcriber(backend)?.batch_transcribe(words, language))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct Echo;

    impl Transcriber for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn supported_languages(&self) -> &'static [&'static str] {
            &["en"]
        }

        fn transcribe(&self, word: &str, _language: &str) -> Option<String> {
            Some(format!("/{word}/"))
        }
    }

    #[test]
    fn registry_names_and_custom_backends() {
        let mut registry = TranscriberRegistry::default();
        assert_eq!(registry.names(), ["espeak", "rules"]);
        registry.register("echo", || Arc::new(Echo));
        assert_eq!(registry.get("echo").unwrap().transcribe("hi", "en").as_deref(), Some("/hi/"));
        assert!(matches!(
            registry.get("missing"),
            Err(DitongError::UnknownTranscriber { .. })
        ));
    }

    #[test]
    fn batch_keeps_every_word() {
        let out = Echo.batch_transcribe(&["a", "b"], "en");
        assert_eq!(out.len(), 2);
        assert_eq!(out["b"].as_deref(), Some("/b/"));
    }

    #[test]
    #[serial]
    fn default_backend_set_and_reset() {
        assert_eq!(default_transcriber(), "rules");
        assert_eq!(transcribe("sheep", "en", None).unwrap().as_deref(), Some("ʃiːp"));

        set_default_transcriber("espeak").unwrap();
        assert_eq!(default_transcriber(), "espeak");
        assert_eq!(get_transcriber(None).unwrap().name(), "espeak");

        assert!(set_default_transcriber("nope").is_err());
        assert_eq!(default_transcriber(), "espeak");

        reset_default_transcriber();
        assert_eq!(default_transcriber(), "rules");
    }

    #[test]
    #[serial]
    fn explicit_backend_ignores_default() {
        let out = batch_transcribe(&["cam"], "tr", Some("rules")).unwrap();
        assert_eq!(out["cam"].as_deref(), Some("dʒam"));
        assert!(transcribe("x", "en", Some("nope")).is_err());
    }
}
