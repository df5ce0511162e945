//! ditong command-line front end.
//!
//! ```bash
//! ditong build --source hunspell:en:sources/en_US.dic --source hunspell:tr:sources/tr.dic
//! ditong consolidate --input output/dicts
//! ditong fuzzy helo
//! ditong normalize Çare Straße
//! ```

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use ditong::config::{DitongConfig, SourceConfig};
use ditong::consolidate::consolidate;
use ditong::core::engine::CONSOLIDATED_DIR;
use ditong::fuzzy::{FuzzyFilter, FuzzyIndex, DEFAULT_MAX_DISTANCE};
use ditong::phonetics::transcribe;
use ditong::{normalize_and_validate, LexiconEngine, ParserRegistry, SynthesisConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ditong", version)]
#[command(about = "Build multi-language word dictionaries folded to canonical ASCII")]
struct Cli {
    /// Config file (defaults to ./ditong.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest sources and write per-language, combined and synthesis dictionaries
    Build(BuildArgs),
    /// Flatten a built tree into per-length word lists (JSON and CSV)
    Consolidate(ConsolidateArgs),
    /// Find dictionary words within a few edits of a query
    Fuzzy(FuzzyArgs),
    /// Show the canonical identifier for each word, or why it is rejected
    Normalize {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Transcribe a word to IPA
    Ipa {
        word: String,
        #[arg(short, long, default_value = "en")]
        language: String,
        #[arg(short, long)]
        backend: Option<String>,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Source as PARSER:LANG:PATH; replaces the config's sources when given
    #[arg(short, long = "source", value_name = "PARSER:LANG:PATH", value_parser = parse_source)]
    sources: Vec<SourceConfig>,

    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    #[arg(long)]
    min_length: Option<usize>,

    #[arg(long)]
    max_length: Option<usize>,

    /// Annotate words with IPA
    #[arg(long)]
    ipa: bool,

    /// Transcriber to use; implies --ipa
    #[arg(long, value_name = "NAME")]
    ipa_backend: Option<String>,

    /// Skip the combined cross-language view
    #[arg(long)]
    no_combined: bool,

    /// Consolidate the output tree after building
    #[arg(long)]
    consolidate: bool,

    /// Include ipa and languages in consolidated lists
    #[arg(long)]
    metadata: bool,

    #[arg(long)]
    no_metrics: bool,

    /// Ingestion threads (0 = one per CPU)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Adds a synthesis view with this name
    #[arg(long, value_name = "NAME")]
    synthesis: Option<String>,

    /// Languages the synthesis view keeps (comma separated)
    #[arg(long, value_delimiter = ',', requires = "synthesis")]
    include_languages: Vec<String>,

    /// Categories the synthesis view drops (comma separated)
    #[arg(long, value_delimiter = ',', requires = "synthesis")]
    exclude_categories: Vec<String>,

    /// Write synthesis lengths as single files instead of per-letter files
    #[arg(long, requires = "synthesis")]
    no_split: bool,
}

#[derive(Args, Debug)]
struct ConsolidateArgs {
    /// Built tree (defaults to the configured output_dir)
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Destination (defaults to <input>/consolidated)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    #[arg(long)]
    metadata: bool,
}

#[derive(Args, Debug)]
struct FuzzyArgs {
    query: String,

    /// Built tree to index (defaults to the configured output_dir)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    #[arg(short, long, default_value_t = DEFAULT_MAX_DISTANCE)]
    max_distance: usize,

    #[arg(short, long)]
    language: Option<String>,

    /// Only index one length class, e.g. 5-c
    #[arg(long)]
    word_type: Option<String>,

    #[arg(short = 'n', long, default_value_t = 10)]
    limit: usize,
}

fn parse_source(value: &str) -> Result<SourceConfig, String> {
    let mut parts = value.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(parser), Some(language), Some(path))
            if !parser.is_empty() && !language.is_empty() && !path.is_empty() =>
        {
            Ok(SourceConfig::new(parser, language, path))
        }
        _ => Err(format!("expected PARSER:LANG:PATH, got '{value}'")),
    }
}

fn init_logging(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("ditong=debug")
    } else if cli.quiet {
        EnvFilter::new("ditong=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ditong=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = DitongConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Build(args) => build(config, args),
        Command::Consolidate(args) => {
            let input = args.input.unwrap_or(config.defaults.output_dir);
            let output = args.output.unwrap_or_else(|| input.join(CONSOLIDATED_DIR));
            let stats = consolidate(&input, &output, args.metadata)
                .with_context(|| format!("consolidating {}", input.display()))?;
            for (word_type, count) in &stats.by_type {
                println!("  {:>6}  {count}", word_type.as_str().cyan());
            }
            println!(
                "{} {} unique words -> {}",
                "Consolidated".green().bold(),
                stats.total_unique,
                output.display()
            );
            Ok(())
        }
        Command::Fuzzy(args) => {
            let dir = args.dir.unwrap_or(config.defaults.output_dir);
            let filter = FuzzyFilter {
                language: args.language,
                word_type: args.word_type,
            };
            let index = FuzzyIndex::from_dir(&dir, args.max_distance, &filter)
                .with_context(|| format!("indexing {}", dir.display()))?;
            if index.is_empty() {
                bail!("no dictionary words found under {}", dir.display());
            }
            let matches = index.search(&args.query, Some(args.limit));
            if matches.is_empty() {
                println!("{}", "No matches.".dark_grey());
            }
            for m in matches {
                println!("  {}  {}", m.distance.to_string().yellow(), m.word);
            }
            Ok(())
        }
        Command::Normalize { words } => {
            for raw in words {
                match normalize_and_validate(&raw) {
                    Some(id) => println!("{raw} -> {}", id.green()),
                    None => println!("{raw} -> {}", "rejected".red()),
                }
            }
            Ok(())
        }
        Command::Ipa { word, language, backend } => {
            let id = normalize_and_validate(&word).unwrap_or(word);
            match transcribe(&id, &language, backend.as_deref())? {
                Some(ipa) => println!("{id} /{}/", ipa.as_str().cyan()),
                None => println!("{id} {}", "(no transcription)".dark_grey()),
            }
            Ok(())
        }
    }
}

fn build(mut config: DitongConfig, args: BuildArgs) -> anyhow::Result<()> {
    let defaults = &mut config.defaults;
    if let Some(output) = args.output {
        defaults.output_dir = output;
    }
    if let Some(min) = args.min_length {
        defaults.min_length = min;
    }
    if let Some(max) = args.max_length {
        defaults.max_length = max;
    }
    if args.ipa_backend.is_some() {
        defaults.ipa_backend = args.ipa_backend;
        defaults.ipa = true;
    }
    defaults.ipa |= args.ipa;
    defaults.build_combined &= !args.no_combined;
    defaults.consolidate |= args.consolidate;
    defaults.consolidate_metadata |= args.metadata;
    defaults.metrics &= !args.no_metrics;
    if let Some(workers) = args.workers {
        defaults.workers = workers;
    }
    if !args.sources.is_empty() {
        config.sources = args.sources;
    }
    if let Some(name) = args.synthesis {
        let mut synthesis = SynthesisConfig::new(name)
            .lengths(config.defaults.min_length, config.defaults.max_length)
            .split_by_letter(!args.no_split);
        if !args.include_languages.is_empty() {
            synthesis = synthesis.include_languages(args.include_languages);
        }
        if !args.exclude_categories.is_empty() {
            synthesis = synthesis.exclude_categories(args.exclude_categories);
        }
        config.synthesis.push(synthesis);
    }
    if config.sources.is_empty() {
        bail!("no sources: pass --source PARSER:LANG:PATH or list [[sources]] in the config");
    }

    println!(
        "{} {} source(s), lengths {}-{}",
        "Building".green().bold(),
        config.sources.len(),
        config.defaults.min_length,
        config.defaults.max_length
    );

    let report = LexiconEngine::run(&config, &ParserRegistry::default()).context("build failed")?;

    for source in &report.ingested {
        println!(
            "  {:<24} {} valid, {} duplicates, {} rejected",
            source.dict_name.as_str().cyan(),
            source.total_valid,
            source.total_duplicates,
            source.total_rejected
        );
    }
    for (language, count) in &report.dictionaries.by_language {
        println!("  {:<24} {count} words", language.as_str().yellow());
    }
    if let Some(combined) = &report.combined {
        println!("  {:<24} {} words", config.defaults.combined_name.as_str().yellow(), combined.total_words);
    }
    for synthesis in &report.synthesis {
        println!(
            "  {:<24} {} words",
            format!("synthesis/{}", synthesis.config_name).magenta(),
            synthesis.total_words
        );
    }
    if let Some(consolidated) = &report.consolidated {
        println!("  {:<24} {} unique words", CONSOLIDATED_DIR.blue(), consolidated.total_unique);
    }
    println!(
        "{} {} files in {}",
        "Done".green().bold(),
        report.files_written(),
        config.defaults.output_dir.display()
    );
    if let Some(run) = &report.metrics {
        println!("  {:<24} {}", "run".dark_grey(), run.run_id);
        match &report.comparison {
            Some(comparison) => println!("  {:<24} {comparison}", "vs previous".dark_grey()),
            None => println!("  {}", "No previous run to compare".dark_grey()),
        }
    }
    Ok(())
}
