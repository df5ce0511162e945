// src/config.rs
//! TOML configuration.
//!
//! Resolution order:
//! 1. Path given on the command line
//! 2. `./ditong.toml`
//! 3. Built-in defaults
//!
//! Command-line flags are applied on top by the binary.

use crate::builder::dictionary::{
    validate_length_range, DEFAULT_COMBINED_NAME, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH,
};
use crate::builder::synthesis::{SynthesisConfig, SYNTHESIS_DIR};
use crate::core::engine::CONSOLIDATED_DIR;
use crate::error::{DitongError, Result};
use crate::ingest::{Ingestor, ParserRegistry};
use crate::metrics::METRICS_DIR;
use crate::phonetics::TranscriberRegistry;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "ditong.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "output/dicts";

/// Names used as directory names in the output tree must be one plain path
/// component.
pub fn validate_output_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    );
    if name.is_empty() || !single {
        return Err(DitongError::Config(format!(
            "'{name}' is not usable as an output directory name"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Defaults {
    pub min_length: usize,
    pub max_length: usize,
    pub output_dir: PathBuf,
    /// Directory and dictionary-name prefix of the combined view.
    pub combined_name: String,
    pub build_combined: bool,
    pub ipa: bool,
    /// Transcriber name; the process default when unset.
    pub ipa_backend: Option<String>,
    pub consolidate: bool,
    pub consolidate_metadata: bool,
    pub metrics: bool,
    /// Ingestion threads; 0 lets rayon decide.
    pub workers: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            combined_name: DEFAULT_COMBINED_NAME.to_string(),
            build_combined: true,
            ipa: false,
            ipa_backend: None,
            consolidate: false,
            consolidate_metadata: false,
            metrics: true,
            workers: 0,
        }
    }
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub parser: String,
    pub language: String,
    pub path: PathBuf,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub dict_name: Option<String>,
    /// Per-source override of the ingestion length range.
    #[serde(default)]
    pub max_length: Option<usize>,
}

impl SourceConfig {
    pub fn new(parser: impl Into<String>, language: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            parser: parser.into(),
            language: language.into(),
            path: path.into(),
            category: None,
            dict_name: None,
            max_length: None,
        }
    }

    /// Resolves the parser and checks the language. The ingestion range
    /// starts at the build minimum and ends at the source's own maximum, or
    /// the adapter default.
    pub fn ingestor(&self, registry: &ParserRegistry, defaults: &Defaults) -> Result<Ingestor> {
        let parser = registry.get(&self.parser)?;
        let mut ingestor = Ingestor::new(parser, self.language.clone())?;
        let max_length = self
            .max_length
            .unwrap_or_else(|| ingestor_default_max(&ingestor, defaults));
        ingestor = ingestor.with_lengths(defaults.min_length, max_length)?;
        if let Some(category) = &self.category {
            ingestor = ingestor.with_category(category.clone());
        }
        if let Some(dict_name) = &self.dict_name {
            ingestor = ingestor.with_dict_name(dict_name.clone());
        }
        Ok(ingestor)
    }
}

fn ingestor_default_max(ingestor: &Ingestor, defaults: &Defaults) -> usize {
    // Curseword lists keep their longer range so compounds survive into the
    // pool; the builders still apply the build range.
    if ingestor.parser_name() == crate::ingest::cursewords::NAME {
        crate::ingest::cursewords::MAX_LENGTH.max(defaults.max_length)
    } else {
        defaults.max_length
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DitongConfig {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub synthesis: Vec<SynthesisConfig>,
}

impl DitongConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DitongError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// An explicit path must exist; otherwise `./ditong.toml` is used when
    /// present and the built-in defaults when not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    /// Per-language partitions share the output root with the other views, so
    /// a language may not take one of their directory names.
    fn check_language_dir(&self, language: &str) -> Result<()> {
        let taken = [SYNTHESIS_DIR, CONSOLIDATED_DIR, METRICS_DIR].contains(&language)
            || (self.defaults.build_combined && language == self.defaults.combined_name);
        if taken {
            return Err(DitongError::Config(format!(
                "language '{language}' collides with the '{language}' output directory"
            )));
        }
        Ok(())
    }

    /// Everything that can be checked before output is written.
    pub fn validate(&self, parsers: &ParserRegistry) -> Result<()> {
        validate_length_range(self.defaults.min_length, self.defaults.max_length)?;
        if self.defaults.build_combined {
            validate_output_name(&self.defaults.combined_name)?;
        }
        if self.defaults.ipa {
            if let Some(backend) = &self.defaults.ipa_backend {
                TranscriberRegistry::default().get(backend)?;
            }
        }
        for source in &self.sources {
            source.ingestor(parsers, &self.defaults)?;
            self.check_language_dir(&source.language)?;
        }
        let mut seen = std::collections::BTreeSet::new();
        for synthesis in &self.synthesis {
            synthesis.validate()?;
            if !seen.insert(synthesis.name.as_str()) {
                return Err(DitongError::Config(format!(
                    "synthesis name '{}' is used more than once",
                    synthesis.name
                )));
            }
        }
        Ok(())
    }
}
