// src/core/engine.rs
use crate::builder::{BuildStats, DictionaryBuilder, SynthesisBuilder, SynthesisConfig, SynthesisStats};
use crate::config::DitongConfig;
use crate::consolidate::{consolidate, ConsolidateStats};
use crate::error::{DitongError, Result};
use crate::ingest::{ingest_parallel, IngestJob, IngestResult, ParserRegistry};
use crate::metrics::{MetricsCollector, MetricsReporter, RunComparison, RunMetrics};
use crate::persistence::{load_pool, save_pool};
use crate::phonetics::{get_transcriber, Transcriber};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CONSOLIDATED_DIR: &str = "consolidated";

/// Everything a build run produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub ingested: Vec<IngestSummary>,
    pub dictionaries: BuildStats,
    pub combined: Option<BuildStats>,
    pub synthesis: Vec<SynthesisStats>,
    pub consolidated: Option<ConsolidateStats>,
    pub metrics: Option<RunMetrics>,
    /// Against the last run recorded in the same output directory.
    pub comparison: Option<RunComparison>,
}

impl BuildReport {
    pub fn files_written(&self) -> usize {
        self.dictionaries.files_written.len()
            + self.combined.as_ref().map_or(0, |c| c.files_written.len())
            + self.synthesis.iter().map(|s| s.files_written.len()).sum::<usize>()
            + self.consolidated.as_ref().map_or(0, |c| c.files_written.len())
    }
}

/// Counts from one ingested source, kept after its words move into the
/// builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub dict_name: String,
    pub language: String,
    pub total_raw: usize,
    pub total_valid: usize,
    pub total_duplicates: usize,
    pub total_rejected: usize,
}

impl From<&IngestResult> for IngestSummary {
    fn from(r: &IngestResult) -> Self {
        Self {
            dict_name: r.dict_name.clone(),
            language: r.language.clone(),
            total_raw: r.total_raw,
            total_valid: r.total_valid,
            total_duplicates: r.total_duplicates,
            total_rejected: r.total_rejected,
        }
    }
}

/// Owns the accumulators of one build run: the per-language builder and the
/// synthesis pool. All merging happens here, on one thread.
pub struct LexiconEngine {
    builder: DictionaryBuilder,
    synthesis: SynthesisBuilder,
    transcriber: Option<Arc<dyn Transcriber>>,
    ingested: Vec<IngestSummary>,
}

impl LexiconEngine {
    pub fn new(output_dir: impl Into<PathBuf>, min_length: usize, max_length: usize) -> Result<Self> {
        let output_dir = output_dir.into();
        Ok(Self {
            synthesis: SynthesisBuilder::new(&output_dir),
            builder: DictionaryBuilder::new(output_dir, min_length, max_length)?,
            transcriber: None,
            ingested: Vec::new(),
        })
    }

    /// Words added afterwards get `ipa` from this backend, using the
    /// language of the source they came from.
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.builder.output_dir()
    }

    pub fn builder(&self) -> &DictionaryBuilder {
        &self.builder
    }

    pub fn synthesis(&self) -> &SynthesisBuilder {
        &self.synthesis
    }

    pub fn ingested(&self) -> &[IngestSummary] {
        &self.ingested
    }

    /// Feeds one source into both accumulators. Each gets its own copy of
    /// every word, so merges in one never show up in the other.
    pub fn add_result(&mut self, mut result: IngestResult) -> usize {
        if let Some(transcriber) = &self.transcriber {
            if transcriber.supports_language(&result.language) {
                for word in result.words.iter_mut().filter(|w| w.ipa.is_none()) {
                    word.ipa = transcriber.transcribe(word.normalized(), &result.language);
                }
            } else {
                debug!(
                    backend = transcriber.name(),
                    language = %result.language,
                    "language not supported by transcriber"
                );
            }
        }
        let admitted = self.builder.add_words(&result);
        self.ingested.push(IngestSummary::from(&result));
        self.synthesis.add_words(result.words);
        admitted
    }

    /// Ingests every job in parallel, then merges the results in job order.
    /// The first failed job aborts the run before anything is written.
    pub fn ingest(&mut self, jobs: &[IngestJob]) -> Result<()> {
        let results = ingest_parallel(jobs);
        let results: Vec<IngestResult> = results.into_iter().collect::<Result<_>>()?;
        for result in results {
            info!(%result, "merging source");
            self.add_result(result);
        }
        Ok(())
    }

    pub fn build(&self) -> Result<BuildStats> {
        self.builder.build()
    }

    pub fn build_combined(&self, name: &str) -> Result<BuildStats> {
        self.builder.build_combined(name)
    }

    pub fn build_synthesis(&mut self, configs: &[SynthesisConfig]) -> Result<Vec<SynthesisStats>> {
        self.synthesis.build_multiple(configs)
    }

    pub fn save_pool(&self, path: &Path) -> Result<()> {
        save_pool(self.synthesis.pool(), path)
    }

    /// Adds a saved pool to the synthesis accumulator only; per-language
    /// partitions need the original sources.
    pub fn load_pool(&mut self, path: &Path) -> Result<usize> {
        let words = load_pool(path)?;
        let count = words.len();
        self.synthesis.add_words(words);
        Ok(count)
    }

    /// Runs a whole configured build: validate, ingest, write partitions,
    /// then the optional consolidation and metrics.
    pub fn run(config: &DitongConfig, parsers: &ParserRegistry) -> Result<BuildReport> {
        config.validate(parsers)?;
        let defaults = &config.defaults;

        let mut metrics = MetricsCollector::new();
        metrics.set_config("min_length", defaults.min_length);
        metrics.set_config("max_length", defaults.max_length);
        metrics.set_config("sources", config.sources.len());
        metrics.set_config("ipa", defaults.ipa);
        info!(run_id = metrics.run_id(), sources = config.sources.len(), "starting build");

        let mut engine = Self::new(&defaults.output_dir, defaults.min_length, defaults.max_length)?;
        if defaults.ipa {
            engine = engine.with_transcriber(get_transcriber(defaults.ipa_backend.as_deref())?);
        }

        let jobs = config
            .sources
            .iter()
            .map(|source| {
                Ok(IngestJob {
                    ingestor: source.ingestor(parsers, defaults)?,
                    path: source.path.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        metrics.start_stage("ingest");
        if defaults.workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(defaults.workers)
                .build()
                .map_err(|e| DitongError::Config(format!("cannot start {} workers: {e}", defaults.workers)))?;
            pool.install(|| engine.ingest(&jobs))?;
        } else {
            engine.ingest(&jobs)?;
        }
        let words_processed: usize = engine.ingested.iter().map(|s| s.total_raw).sum();
        metrics.set_counter("sources", jobs.len() as u64);
        metrics.set_counter("raw_words", words_processed as u64);
        metrics.set_counter("rejected_at_admission", engine.builder.rejected_count() as u64);
        metrics.end_stage("ingest");

        let mut report = BuildReport::default();

        metrics.start_stage("build");
        report.dictionaries = engine.build()?;
        metrics.set_counter("words", report.dictionaries.total_words as u64);
        metrics.end_stage("build");

        if defaults.build_combined {
            metrics.start_stage("combined");
            let stats = engine.build_combined(&defaults.combined_name)?;
            metrics.set_counter("words", stats.total_words as u64);
            report.combined = Some(stats);
            metrics.end_stage("combined");
        }

        if !config.synthesis.is_empty() {
            metrics.start_stage("synthesis");
            report.synthesis = engine.build_synthesis(&config.synthesis)?;
            metrics.set_counter("configs", report.synthesis.len() as u64);
            for stats in &report.synthesis {
                metrics.increment_counter("words", stats.total_words as u64);
            }
            metrics.end_stage("synthesis");
        }

        if defaults.consolidate {
            metrics.start_stage("consolidate");
            let out = defaults.output_dir.join(CONSOLIDATED_DIR);
            let stats = consolidate(&defaults.output_dir, &out, defaults.consolidate_metadata)?;
            metrics.set_counter("unique_words", stats.total_unique as u64);
            report.consolidated = Some(stats);
            metrics.end_stage("consolidate");
        }

        report.ingested = engine.ingested;
        if defaults.metrics {
            let reporter = MetricsReporter::new(&defaults.output_dir);
            let previous = reporter.last_run().unwrap_or_else(|e| {
                warn!(error = %e, "could not read metrics history");
                None
            });
            let run = metrics.finalize(words_processed as u64, report.files_written());
            match reporter.write(&run) {
                Ok(()) => info!(run_id = %run.run_id, dir = %reporter.dir().display(), "wrote metrics"),
                Err(e) => warn!(error = %e, "could not write metrics"),
            }
            report.comparison = previous.map(|previous| RunComparison::between(&run, &previous));
            report.metrics = Some(run);
        }
        Ok(report)
    }
}
