// src/metrics.rs
//! Per-run timing reports.
//!
//! A run's report lands in `<output>/metrics/` three times over:
//! `latest.json` (replaced each run), `run_<id>.json`, and one compact line
//! appended to `history.jsonl`, which is what later runs compare against.

use crate::error::{DitongError, Result};
use crate::persistence::save_json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

pub const METRICS_DIR: &str = "metrics";
const LATEST_FILE: &str = "latest.json";
const HISTORY_FILE: &str = "history.jsonl";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageMetrics {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counters: BTreeMap<String, u64>,
    #[serde(skip)]
    started: Option<Instant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalMetrics {
    pub duration_ms: u64,
    pub words_processed: u64,
    pub files_written: usize,
    pub throughput_words_per_sec: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub version: String,
    pub os: String,
    pub arch: String,
    pub num_cpu: usize,
}

impl EnvironmentInfo {
    fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            num_cpu: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub config: BTreeMap<String, serde_json::Value>,
    pub stages: BTreeMap<String, StageMetrics>,
    pub totals: TotalMetrics,
    pub environment: EnvironmentInfo,
}

/// How a run did against the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunComparison {
    pub current_run_id: String,
    pub previous_run_id: String,
    /// Previous duration over current; 1.0 when the current run took no time.
    pub speedup_factor: f64,
    pub time_saved_ms: i64,
    pub words_diff: i64,
    pub throughput_diff: f64,
}

impl RunComparison {
    pub fn between(current: &RunMetrics, previous: &RunMetrics) -> Self {
        let (cur, prev) = (&current.totals, &previous.totals);
        let speedup_factor = if cur.duration_ms > 0 {
            prev.duration_ms as f64 / cur.duration_ms as f64
        } else {
            1.0
        };
        Self {
            current_run_id: current.run_id.clone(),
            previous_run_id: previous.run_id.clone(),
            speedup_factor,
            time_saved_ms: prev.duration_ms as i64 - cur.duration_ms as i64,
            words_diff: cur.words_processed as i64 - prev.words_processed as i64,
            throughput_diff: cur.throughput_words_per_sec - prev.throughput_words_per_sec,
        }
    }
}

impl fmt::Display for RunComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.speedup_factor < 1.0 { "slower" } else { "faster" };
        write!(
            f,
            "{:.2}x {direction} than previous run ({:+}ms, {:+.0} words/sec)",
            self.speedup_factor, -self.time_saved_ms, self.throughput_diff
        )
    }
}

/// Reads and writes the reports kept under `<output>/metrics/`.
pub struct MetricsReporter {
    dir: PathBuf,
}

impl MetricsReporter {
    pub fn new(output_dir: &Path) -> Self {
        Self { dir: output_dir.join(METRICS_DIR) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_path(&self, run_id: &str) -> PathBuf {
        self.dir.join(format!("run_{run_id}.json"))
    }

    pub fn write(&self, run: &RunMetrics) -> Result<()> {
        save_json(run, &self.dir.join(LATEST_FILE))?;
        save_json(run, &self.run_path(&run.run_id))?;
        self.append_history(run)
    }

    fn append_history(&self, run: &RunMetrics) -> Result<()> {
        let path = self.dir.join(HISTORY_FILE);
        fs::create_dir_all(&self.dir).map_err(|e| DitongError::io(&self.dir, e))?;
        let line = serde_json::to_string(run)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| DitongError::io(&path, e))?;
        writeln!(file, "{line}").map_err(|e| DitongError::io(&path, e))
    }

    /// The last `limit` runs in history order, oldest first; `0` means all.
    /// Lines that do not parse are skipped. No history yet is an empty list.
    pub fn read_history(&self, limit: usize) -> Result<Vec<RunMetrics>> {
        let path = self.dir.join(HISTORY_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DitongError::io(&path, e)),
        };
        let mut runs = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| DitongError::io(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RunMetrics>(&line) {
                Ok(run) => runs.push(run),
                Err(e) => debug!(line = number + 1, error = %e, "skipping history line"),
            }
        }
        if limit > 0 && runs.len() > limit {
            runs.drain(..runs.len() - limit);
        }
        Ok(runs)
    }

    pub fn last_run(&self) -> Result<Option<RunMetrics>> {
        Ok(self.read_history(1)?.pop())
    }
}

/// Records named stages and per-stage counters. Counter calls apply to the
/// most recently started stage and are ignored when none is active.
pub struct MetricsCollector {
    run_id: String,
    timestamp: DateTime<Utc>,
    started: Instant,
    config: BTreeMap<String, serde_json::Value>,
    stages: BTreeMap<String, StageMetrics>,
    active: Option<String>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        let timestamp = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            run_id: format!("{}-{}", timestamp.format("%Y%m%d-%H%M%S"), &suffix[..8]),
            timestamp,
            started: Instant::now(),
            config: BTreeMap::new(),
            stages: BTreeMap::new(),
            active: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn set_config(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.config.insert(key.into(), value.into());
    }

    pub fn start_stage(&mut self, name: &str) {
        self.stages.insert(
            name.to_string(),
            StageMetrics {
                name: name.to_string(),
                start_time: Utc::now(),
                end_time: None,
                duration_ms: 0,
                counters: BTreeMap::new(),
                started: Some(Instant::now()),
            },
        );
        self.active = Some(name.to_string());
    }

    pub fn end_stage(&mut self, name: &str) {
        if let Some(stage) = self.stages.get_mut(name) {
            stage.end_time = Some(Utc::now());
            if let Some(started) = stage.started.take() {
                stage.duration_ms = started.elapsed().as_millis() as u64;
            }
        }
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
    }

    fn active_stage(&mut self) -> Option<&mut StageMetrics> {
        let name = self.active.as_ref()?;
        self.stages.get_mut(name)
    }

    pub fn increment_counter(&mut self, name: &str, delta: u64) {
        if let Some(stage) = self.active_stage() {
            *stage.counters.entry(name.to_string()).or_insert(0) += delta;
        }
    }

    pub fn set_counter(&mut self, name: &str, value: u64) {
        if let Some(stage) = self.active_stage() {
            stage.counters.insert(name.to_string(), value);
        }
    }

    pub fn stage(&self, name: &str) -> Option<&StageMetrics> {
        self.stages.get(name)
    }

    pub fn finalize(self, words_processed: u64, files_written: usize) -> RunMetrics {
        let elapsed = self.started.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            words_processed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        RunMetrics {
            run_id: self.run_id,
            timestamp: self.timestamp,
            config: self.config,
            stages: self.stages,
            totals: TotalMetrics {
                duration_ms: elapsed.as_millis() as u64,
                words_processed,
                files_written,
                throughput_words_per_sec: throughput,
            },
            environment: EnvironmentInfo::current(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn counters_follow_the_active_stage() {
        let mut m = MetricsCollector::new();
        m.increment_counter("ignored", 1);

        m.start_stage("ingest");
        m.increment_counter("words", 2);
        m.increment_counter("words", 3);
        m.set_counter("sources", 1);
        m.end_stage("ingest");
        m.increment_counter("words", 100);

        let ingest = m.stage("ingest").unwrap();
        assert_eq!(ingest.counters["words"], 5);
        assert_eq!(ingest.counters["sources"], 1);
        assert!(ingest.end_time.is_some());
    }

    #[test]
    fn run_ids_are_unique_within_a_second() {
        let a = MetricsCollector::new();
        let b = MetricsCollector::new();
        assert_ne!(a.run_id(), b.run_id());
        let (stamp, suffix) = a.run_id().rsplit_once('-').unwrap();
        assert_eq!(stamp.len(), "20060102-150405".len());
        assert_eq!(suffix.len(), 8);
        assert!(suffix.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    fn finished(words: u64, duration_ms: u64) -> RunMetrics {
        let mut run = MetricsCollector::new().finalize(words, 1);
        run.totals.duration_ms = duration_ms;
        run.totals.throughput_words_per_sec = words as f64 * 1000.0 / duration_ms as f64;
        run
    }

    #[test]
    fn report_shape() {
        let dir = TempDir::new().unwrap();
        let mut m = MetricsCollector::new();
        m.set_config("min_length", 3);
        m.start_stage("build");
        m.end_stage("build");
        let run = m.finalize(10, 2);
        let reporter = MetricsReporter::new(dir.path());
        reporter.write(&run).unwrap();

        let latest = dir.path().join("metrics/latest.json");
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(latest).unwrap()).unwrap();
        assert_eq!(v["config"]["min_length"], 3);
        assert_eq!(v["totals"]["words_processed"], 10);
        assert_eq!(v["totals"]["files_written"], 2);
        assert_eq!(v["stages"]["build"]["name"], "build");
        assert!(v["stages"]["build"].get("counters").is_none());
        assert_eq!(v["run_id"], run.run_id.as_str());
        assert!(reporter.run_path(&run.run_id).is_file());
    }

    #[test]
    fn history_keeps_every_run_and_skips_bad_lines() {
        let dir = TempDir::new().unwrap();
        let reporter = MetricsReporter::new(dir.path());
        assert!(reporter.last_run().unwrap().is_none());

        let first = finished(100, 1000);
        reporter.write(&first).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(reporter.dir().join(HISTORY_FILE))
            .unwrap()
            .write_all(b"{not json\n")
            .unwrap();
        let second = finished(200, 500);
        reporter.write(&second).unwrap();

        let history = reporter.read_history(0).unwrap();
        let ids: Vec<_> = history.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, [first.run_id.as_str(), second.run_id.as_str()]);
        assert_eq!(reporter.read_history(1).unwrap()[0].run_id, second.run_id);
        assert_eq!(reporter.last_run().unwrap().unwrap().totals.words_processed, 200);

        let latest: RunMetrics = serde_json::from_str(
            &std::fs::read_to_string(reporter.dir().join(LATEST_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(latest.run_id, second.run_id);
        assert!(reporter.run_path(&first.run_id).is_file());
    }

    #[test]
    fn comparison_against_previous_run() {
        let previous = finished(1000, 1000);
        let current = finished(1500, 500);
        let c = RunComparison::between(&current, &previous);
        assert_eq!(c.previous_run_id, previous.run_id);
        assert_eq!(c.speedup_factor, 2.0);
        assert_eq!(c.time_saved_ms, 500);
        assert_eq!(c.words_diff, 500);
        assert_eq!(c.to_string(), "2.00x faster than previous run (-500ms, +2000 words/sec)");

        let c = RunComparison::between(&previous, &current);
        assert_eq!(c.to_string(), "0.50x slower than previous run (+500ms, -2000 words/sec)");

        let mut instant = finished(10, 1);
        instant.totals.duration_ms = 0;
        assert_eq!(RunComparison::between(&instant, &previous).speedup_factor, 1.0);
    }
}
