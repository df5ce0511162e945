// src/core/mod.rs
pub mod dictionary;
pub mod engine;
pub mod merge;
pub mod normalizer;
pub mod types;
