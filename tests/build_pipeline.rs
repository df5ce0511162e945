//! End-to-end builds from source files on disk to the written output tree.

use ditong::config::{DitongConfig, SourceConfig};
use ditong::persistence::{dictionary_files, load_dictionary};
use ditong::{Dictionary, LexiconEngine, ParserRegistry, SynthesisConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const EN_DIC: &str = "6\ncat/S\ncare\nhello/MS\nelephant\ncafé\nnaïve\n";
const TR_DIC: &str = "4\nçare\nkedi/A\nmerhaba\nhello\n";

fn write_sources(dir: &Path) {
    fs::write(dir.join("en.dic"), EN_DIC).unwrap();
    fs::write(dir.join("tr.dic"), TR_DIC).unwrap();
}

fn config(dir: &Path, min_length: usize, max_length: usize) -> DitongConfig {
    let mut config = DitongConfig::default();
    config.defaults.output_dir = dir.join("out");
    config.defaults.min_length = min_length;
    config.defaults.max_length = max_length;
    config.defaults.metrics = false;
    config.sources = vec![
        SourceConfig::new("hunspell", "en", dir.join("en.dic")),
        SourceConfig::new("hunspell", "tr", dir.join("tr.dic")),
    ];
    config
}

fn load(path: &Path) -> Dictionary {
    load_dictionary(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

fn ids(dictionary: &Dictionary) -> Vec<&str> {
    dictionary.identifiers().collect()
}

#[test]
fn only_lengths_in_range_are_written() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let report = LexiconEngine::run(&config(dir.path(), 4, 6), &ParserRegistry::default()).unwrap();

    let out = dir.path().join("out");
    let mut en_files: Vec<_> = fs::read_dir(out.join("en"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    en_files.sort();
    assert_eq!(en_files, vec!["4-c.json", "5-c.json"]);

    assert_eq!(ids(&load(&out.join("en/4-c.json"))), vec!["cafe", "care"]);
    assert_eq!(ids(&load(&out.join("en/5-c.json"))), vec!["hello", "naive"]);

    let en = &report.ingested[0];
    assert_eq!(en.dict_name, "hunspell_en");
    assert_eq!(en.total_raw, 6);
    assert_eq!(en.total_valid, 4);
    assert_eq!(report.dictionaries.by_language["en"], 4);
}

#[test]
fn cross_language_identifier_merges_only_in_combined_view() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    LexiconEngine::run(&config(dir.path(), 3, 10), &ParserRegistry::default()).unwrap();
    let out = dir.path().join("out");

    let combined = load(&out.join("all/4-c.json"));
    let care = combined.get("care").unwrap();
    let languages: Vec<&str> = care.languages().iter().map(String::as_str).collect();
    assert_eq!(languages, vec!["en", "tr"]);
    assert_eq!(care.sources().len(), 2);
    let originals: Vec<&str> = care.sources().iter().map(|s| s.original_form.as_str()).collect();
    assert!(originals.contains(&"care") && originals.contains(&"çare"));
    assert_eq!(combined.language, None);

    let en = load(&out.join("en/4-c.json"));
    assert_eq!(en.get("care").unwrap().languages().len(), 1);
    assert_eq!(en.get("care").unwrap().sources().len(), 1);
    let tr = load(&out.join("tr/4-c.json"));
    assert_eq!(tr.get("care").unwrap().sources()[0].original_form, "çare");
}

#[test]
fn synthesis_view_filters_the_pool() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let mut config = config(dir.path(), 3, 10);
    config.defaults.build_combined = false;
    config.synthesis = vec![
        SynthesisConfig::new("tr_five")
            .include_languages(["tr"])
            .lengths(5, 5)
            .split_by_letter(false),
        SynthesisConfig::new("letters").lengths(4, 4),
    ];
    let report = LexiconEngine::run(&config, &ParserRegistry::default()).unwrap();
    let out = dir.path().join("out");
    assert!(!out.join("all").exists());

    let tr_five = load(&out.join("synthesis/tr_five/5-c.json"));
    assert_eq!(ids(&tr_five), vec!["hello"]);
    let hello = tr_five.get("hello").unwrap();
    assert_eq!(hello.languages().len(), 2);
    assert!(hello.synthesis_groups.contains("tr_five"));

    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("synthesis/tr_five/_config.json")).unwrap())
            .unwrap();
    assert_eq!(meta["config"]["include_languages"], serde_json::json!(["tr"]));
    assert_eq!(meta["config"]["exclude_languages"], serde_json::Value::Null);
    assert_eq!(meta["stats"]["total_words"], 1);

    let c = load(&out.join("synthesis/letters/4-c/c.json"));
    assert_eq!(c.name, "letters_4-c_c");
    assert_eq!(ids(&c), vec!["cafe", "care"]);
    assert!(out.join("synthesis/letters/4-c/k.json").is_file());
    assert_eq!(report.synthesis[1].by_letter[&'c'], 2);
}

#[test]
fn every_written_word_matches_its_partition() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let mut config = config(dir.path(), 4, 7);
    config.synthesis = vec![SynthesisConfig::new("mix").lengths(4, 7)];
    LexiconEngine::run(&config, &ParserRegistry::default()).unwrap();

    let files = dictionary_files(&dir.path().join("out"), &[]).unwrap();
    assert!(files.len() > 5);
    for path in files {
        let dictionary = load(&path);
        let word_type = dictionary.word_type.clone().unwrap();
        for word in dictionary.words() {
            assert!((4..=7).contains(&word.length()), "{}", word.normalized());
            assert_eq!(word.word_type(), word_type);
            assert!(word.normalized().bytes().all(|b| b.is_ascii_lowercase()));
        }
    }
}

#[test]
fn written_dictionaries_reload_unchanged() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let report = LexiconEngine::run(&config(dir.path(), 3, 10), &ParserRegistry::default()).unwrap();

    for path in &report.dictionaries.files_written {
        let first = load(path);
        let json = serde_json::to_value(&first).unwrap();
        let copy = dir.path().join("copy.json");
        ditong::persistence::save_dictionary(&first, &copy).unwrap();
        let second = load(&copy);
        assert_eq!(json["words"], serde_json::to_value(&second).unwrap()["words"]);
        assert_eq!(first.languages(), second.languages());
        assert_eq!(first.source_dicts(), second.source_dicts());
    }
}

#[test]
fn toml_configured_run_with_ipa_consolidation_and_metrics() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    fs::write(dir.path().join("bad.txt"), "# local slurs\nfrick\nfrickinghell\n").unwrap();
    let toml = format!(
        r#"
[defaults]
output_dir = '{out}'
max_length = 8
ipa = true
ipa_backend = "rules"
consolidate = true
consolidate_metadata = true

[[sources]]
parser = "hunspell"
language = "en"
path = '{root}/en.dic'

[[sources]]
parser = "hunspell"
language = "tr"
path = '{root}/tr.dic'

[[sources]]
parser = "cursewords"
language = "en"
path = '{root}/bad.txt'

[[synthesis]]
name = "clean"
exclude_categories = ["curseword"]
split_by_letter = false
"#,
        out = dir.path().join("out").display(),
        root = dir.path().display(),
    );
    let config = DitongConfig::from_toml_str(&toml).unwrap();
    let report = LexiconEngine::run(&config, &ParserRegistry::default()).unwrap();
    let out = dir.path().join("out");

    let tr4 = load(&out.join("tr/4-c.json"));
    assert!(tr4.get("kedi").unwrap().ipa.is_some());

    let en5 = load(&out.join("en/5-c.json"));
    let frick = en5.get("frick").unwrap();
    assert!(frick.categories().contains("curseword"));
    assert!(frick.tags.contains("curseword"));
    assert!(!out.join("en/12-c.json").exists());

    let clean = load(&out.join("synthesis/clean/5-c.json"));
    assert!(clean.get("hello").is_some());
    assert!(clean.get("frick").is_none());

    let consolidated = report.consolidated.as_ref().unwrap();
    assert!(consolidated.total_unique >= 6);
    assert!(out.join("consolidated/all_words.csv").is_file());
    let csv = fs::read_to_string(out.join("consolidated/4-c.csv")).unwrap();
    assert!(csv.starts_with("word,ipa,languages\n"));

    let metrics: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("metrics/latest.json")).unwrap()).unwrap();
    for stage in ["ingest", "build", "combined", "synthesis", "consolidate"] {
        assert!(metrics["stages"][stage].is_object(), "{stage}");
    }
    assert_eq!(metrics["stages"]["ingest"]["counters"]["sources"], 3);
    assert_eq!(
        metrics["stages"]["synthesis"]["counters"]["words"],
        report.synthesis[0].total_words
    );
    assert_eq!(report.ingested.len(), 3);
    assert!(report.comparison.is_none());

    let rerun = LexiconEngine::run(&config, &ParserRegistry::default()).unwrap();
    let history = fs::read_to_string(out.join("metrics/history.jsonl")).unwrap();
    assert_eq!(history.lines().count(), 2);
    let first_id = report.metrics.as_ref().unwrap().run_id.as_str();
    let comparison = rerun.comparison.unwrap();
    assert_eq!(comparison.previous_run_id, first_id);
    assert_eq!(comparison.words_diff, 0);
    assert!(out.join(format!("metrics/run_{first_id}.json")).is_file());
    assert_eq!(rerun.consolidated.unwrap().total_unique, consolidated.total_unique);
}

#[test]
fn language_names_cannot_escape_or_shadow_the_output_tree() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    for language in ["../escaped", "all", "synthesis", "metrics"] {
        let mut config = config(dir.path(), 3, 10);
        config.sources.push(SourceConfig::new("hunspell", language, dir.path().join("en.dic")));
        assert!(LexiconEngine::run(&config, &ParserRegistry::default()).is_err(), "{language}");
    }
    assert!(!dir.path().join("out").exists());
    assert!(!dir.path().join("escaped").exists());
}

#[test]
fn invalid_config_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let mut config = config(dir.path(), 3, 10);
    config.synthesis = vec![SynthesisConfig::new("ok"), SynthesisConfig::new("a/b")];
    assert!(LexiconEngine::run(&config, &ParserRegistry::default()).is_err());

    let mut missing = self::config(dir.path(), 3, 10);
    missing.sources.push(SourceConfig::new("plain_text", "en", dir.path().join("absent.txt")));
    assert!(LexiconEngine::run(&missing, &ParserRegistry::default()).is_err());

    assert!(!dir.path().join("out").exists());
}

#[test]
fn saved_pool_feeds_a_later_synthesis_run() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let registry = ParserRegistry::default();
    let jobs: Vec<_> = config(dir.path(), 3, 10)
        .sources
        .iter()
        .map(|s| ditong::ingest::IngestJob {
            ingestor: s.ingestor(&registry, &Default::default()).unwrap(),
            path: s.path.clone(),
        })
        .collect();

    let mut first = LexiconEngine::new(dir.path().join("a"), 3, 10).unwrap();
    first.ingest(&jobs).unwrap();
    let pool = dir.path().join("pool.bin");
    first.save_pool(&pool).unwrap();

    let mut second = LexiconEngine::new(dir.path().join("b"), 3, 10).unwrap();
    assert_eq!(second.load_pool(&pool).unwrap(), first.synthesis().pool_size());
    let stats = second.build_synthesis(&[SynthesisConfig::new("later")]).unwrap();
    assert_eq!(stats[0].total_words, first.synthesis().pool_size());
}
