// Copyright 2026 Martin Pool

//! Evaluate a variant: emit its source, compile it, run the positive and
//! negative test harnesses, and score it by the lines the harness logs.
//!
//! Results are memoised on a digest of the emitted source, not on the
//! history: distinct histories often collapse to the same text, and text is
//! what the compiler sees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use similar::TextDiff;
use tracing::{debug, info, trace, warn};

use crate::options::Options;
use crate::process::run_command;
use crate::variant::Variant;

/// The best adequate variant seen so far. Smaller diffs win; fitness breaks
/// ties upward.
#[derive(Clone, Debug)]
pub struct Best {
    pub diff_size: usize,
    pub fitness: f64,
    pub sources: Vec<(Option<String>, String)>,
    pub elapsed: Duration,
    pub evaluation: usize,
}

pub struct Evaluator {
    options: Options,
    workdir: Utf8PathBuf,
    /// Concatenated baseline print, the reference for diff sizes.
    baseline: String,
    /// Next artefact serial; also counts evaluations (cache hits included).
    serial: AtomicUsize,
    /// Actual compiler invocations, i.e. cache misses.
    compiles: AtomicUsize,
    /// Next harness port.
    port: AtomicUsize,
    cache: Mutex<HashMap<String, f64>>,
    best: Mutex<Option<Best>>,
    first_solution: Mutex<Option<(Duration, usize)>>,
    start: Instant,
}

impl Evaluator {
    pub fn new(
        options: &Options,
        workdir: &Utf8Path,
        baseline_sources: &[(Option<String>, String)],
        initial_port: usize,
    ) -> Evaluator {
        let baseline = baseline_sources
            .iter()
            .map(|(_, text)| text.as_str())
            .collect();
        Evaluator {
            options: options.clone(),
            workdir: workdir.to_owned(),
            baseline,
            serial: AtomicUsize::new(0),
            compiles: AtomicUsize::new(0),
            port: AtomicUsize::new(initial_port),
            cache: Mutex::new(HashMap::new()),
            best: Mutex::new(None),
            first_solution: Mutex::new(None),
            start: Instant::now(),
        }
    }

    /// Score one variant.
    ///
    /// Candidate failures (the compiler rejects the source, a harness cannot
    /// be run) become fitness 0.0 and are cached like any other result, so
    /// the search never retries a known-bad text. Failures to even express
    /// the variant, like an unsupported edit kind, propagate as errors.
    pub fn fitness(&self, variant: &Variant) -> Result<f64> {
        let sources = variant.emit_source()?;
        let serial = self.serial.fetch_add(1, Ordering::Relaxed) + 1;
        let src_paths = self
            .write_sources(serial, &sources)
            .context("write candidate source")?;
        let digest = digest_of(&sources);
        if let Some(cached) = self.cache.lock().unwrap().get(&digest) {
            trace!(serial, fitness = cached, "fitness cache hit");
            return Ok(*cached);
        }
        let fitness = match self.run_candidate(serial, &src_paths) {
            Ok(fitness) => fitness,
            Err(err) => {
                warn!(serial, "candidate failed: {err:#}");
                0.0
            }
        };
        let _ = std::fs::write(self.artefact(serial, "fitness"), format!("{fitness}\n"));
        debug!(serial, fitness, "evaluated {}", variant.describe());
        if fitness >= self.options.max_fitness {
            self.record_solution(serial, &sources, fitness);
        }
        self.cache.lock().unwrap().insert(digest, fitness);
        Ok(fitness)
    }

    fn write_sources(
        &self,
        serial: usize,
        sources: &[(Option<String>, String)],
    ) -> Result<Vec<Utf8PathBuf>> {
        let mut paths = Vec::new();
        for (name, text) in sources {
            let path = match name {
                Some(name) => self.workdir.join(format!("{serial:05}-{name}")),
                None => self.artefact(serial, "file.c"),
            };
            std::fs::write(&path, text).with_context(|| format!("write {path}"))?;
            paths.push(path);
        }
        Ok(paths)
    }

    fn run_candidate(&self, serial: usize, src_paths: &[Utf8PathBuf]) -> Result<f64> {
        let exe = self.artefact(serial, "prog");
        let good_log = self.artefact(serial, "good");
        let bad_log = self.artefact(serial, "bad");
        // Tolerate leftovers from an interrupted earlier run.
        for stale in [&exe, &good_log, &bad_log] {
            let _ = std::fs::remove_file(stale);
        }

        let mut compile = split_command(&self.options.gcc_command);
        compile.push("-o".to_owned());
        compile.push(exe.to_string());
        compile.extend(src_paths.iter().map(|p| p.to_string()));
        compile.extend(self.options.ldflags.iter().cloned());
        self.compiles.fetch_add(1, Ordering::Relaxed);
        if !run_command(&compile, &self.workdir)?.success() {
            debug!(serial, "compile failed");
            return Ok(0.0);
        }

        self.run_harness(&self.options.good_command, &exe, &good_log)?;
        self.run_harness(&self.options.bad_command, &exe, &bad_log)?;
        Ok(count_lines(&good_log) as f64 + self.options.bad_factor * count_lines(&bad_log) as f64)
    }

    fn run_harness(&self, command: &str, exe: &Utf8Path, log: &Utf8Path) -> Result<()> {
        let port = self.port.fetch_add(1, Ordering::Relaxed);
        let mut argv = split_command(command);
        argv.push(exe.to_string());
        argv.push(log.to_string());
        argv.push(port.to_string());
        let status = run_command(&argv, &self.workdir)?;
        if !status.success() {
            return Err(anyhow!("harness {command} failed with {status:?}"));
        }
        Ok(())
    }

    fn record_solution(&self, serial: usize, sources: &[(Option<String>, String)], fitness: f64) {
        let full: String = sources.iter().map(|(_, text)| text.as_str()).collect();
        let diff_size = TextDiff::from_lines(self.baseline.as_str(), full.as_str())
            .unified_diff()
            .to_string()
            .len();
        let _ = std::fs::write(self.artefact(serial, "size"), format!("{diff_size}\n"));
        {
            let mut first = self.first_solution.lock().unwrap();
            if first.is_none() {
                let elapsed = self.start.elapsed();
                info!(
                    serial,
                    fitness,
                    "first adequate variant after {:.3}s",
                    elapsed.as_secs_f64()
                );
                *first = Some((elapsed, serial));
            }
        }
        let mut best = self.best.lock().unwrap();
        let improves = match &*best {
            None => true,
            Some(incumbent) => diff_size <= incumbent.diff_size && fitness >= incumbent.fitness,
        };
        if improves {
            info!(serial, fitness, diff_size, "new best variant");
            *best = Some(Best {
                diff_size,
                fitness,
                sources: sources.to_vec(),
                elapsed: self.start.elapsed(),
                evaluation: serial,
            });
        }
    }

    fn artefact(&self, serial: usize, suffix: &str) -> Utf8PathBuf {
        self.workdir.join(format!("{serial:05}-{suffix}"))
    }

    pub fn best(&self) -> Option<Best> {
        self.best.lock().unwrap().clone()
    }

    pub fn first_solution(&self) -> Option<(Duration, usize)> {
        *self.first_solution.lock().unwrap()
    }

    /// Evaluations requested, including memoised ones.
    pub fn evaluations(&self) -> usize {
        self.serial.load(Ordering::Relaxed)
    }

    /// Compiler invocations actually made.
    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::Relaxed)
    }
}

fn digest_of(sources: &[(Option<String>, String)]) -> String {
    let mut hasher = Sha256::new();
    for (name, text) in sources {
        if let Some(name) = name {
            hasher.update(name.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(text.as_bytes());
    }
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(String::from).collect()
}

fn count_lines(log: &Utf8Path) -> usize {
    match std::fs::read_to_string(log) {
        Ok(text) => text.lines().count(),
        Err(err) => {
            debug!("no harness log {log}: {err}");
            0
        }
    }
}
