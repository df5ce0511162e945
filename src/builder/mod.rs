// src/builder/mod.rs
pub mod dictionary;
pub mod synthesis;

pub use dictionary::{BuildStats, DictionaryBuilder};
pub use synthesis::{SynthesisBuilder, SynthesisConfig, SynthesisStats};
