// src/lib.rs

pub mod builder;
pub mod config;
pub mod consolidate;
pub mod core;
pub mod error;
pub mod fuzzy;
pub mod ingest;
pub mod metrics;
pub mod persistence;
pub mod phonetics;

pub use crate::builder::{DictionaryBuilder, SynthesisBuilder, SynthesisConfig};
pub use crate::config::DitongConfig;
pub use crate::core::dictionary::Dictionary;
pub use crate::core::engine::{BuildReport, LexiconEngine};
pub use crate::core::normalizer::{normalize_and_validate, normalize_word};
pub use crate::core::types::{Source, Word};
pub use crate::error::{DitongError, Result};
pub use crate::ingest::{Ingestor, ParserRegistry};
