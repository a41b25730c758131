// Copyright 2026 Martin Pool

//! `cmend`: search for a patched C program that passes its failing tests.
//!
//! Given a serialised AST and a fault-localised execution path, run a
//! genetic search over statement-level edits, scoring each candidate by
//! compiling it and running the positive and negative test harnesses.

mod ast;
mod bank;
mod edit;
mod fitness;
mod index;
mod mutate;
mod options;
mod path;
mod process;
mod sample;
mod search;
#[cfg(test)]
mod test_util;
mod transform;
mod variant;

use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::bank::CodeBank;
use crate::fitness::Evaluator;
use crate::index::{check_recorded_count, StatementIndex};
use crate::options::{Args, Options};
use crate::path::WeightedPath;
use crate::variant::Variant;

fn main() -> Result<()> {
    let args = Args::parse();
    let options = Options::new(&args)?;
    let _guard = init_logging(&args.stem)?;
    let mut rng = match options.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    info!("cmend {} repairing {}", env!("CARGO_PKG_VERSION"), args.stem);

    let bank = CodeBank::load(&stem_file(&args.stem, "ast"))?;
    let index = Arc::new(StatementIndex::build(&bank)?);
    check_recorded_count(&stem_file(&args.stem, "ht"), &index)?;
    info!(
        statements = index.count(),
        files = bank.base().len(),
        "loaded code bank"
    );
    let path = Arc::new(WeightedPath::load(
        &stem_file(&args.stem, "path"),
        &stem_file(&args.stem, "goodpath"),
        options.good_path_factor,
        &index,
    )?);

    let original = Variant::original(bank, index, path);
    let baseline = original.emit_source()?;
    write_result(&args.stem, "baseline", &baseline)?;

    let initial_port = 800 + rng.usize(..800);
    let evaluator = Evaluator::new(&options, Utf8Path::new("."), &baseline, initial_port);
    let best = search::run(&mut rng, original, &evaluator, &options)?;

    match best {
        Some(best) => {
            write_result(&args.stem, "best", &best.sources)?;
            if let Some((elapsed, evaluation)) = evaluator.first_solution() {
                info!(
                    "first solution after {:.3}s at evaluation {evaluation}",
                    elapsed.as_secs_f64()
                );
            }
            info!(
                fitness = best.fitness,
                diff_size = best.diff_size,
                evaluation = best.evaluation,
                evaluations = evaluator.evaluations(),
                compiles = evaluator.compiles(),
                "best variant (found after {:.3}s) written to {}-best.c",
                best.elapsed.as_secs_f64(),
                args.stem
            );
        }
        None => {
            info!(
                evaluations = evaluator.evaluations(),
                compiles = evaluator.compiles(),
                "no adequate program found"
            );
        }
    }
    Ok(())
}

/// Info and above to stderr; everything from debug up tee'd to `STEM.debug`.
fn init_logging(stem: &Utf8Path) -> Result<WorkerGuard> {
    let debug_path = stem_file(stem, "debug");
    let file = File::create(&debug_path).with_context(|| format!("create {debug_path}"))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(LevelFilter::DEBUG),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(LevelFilter::INFO),
        )
        .init();
    Ok(guard)
}

fn stem_file(stem: &Utf8Path, ext: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{stem}.{ext}"))
}

/// Write `STEM-baseline.c` / `STEM-best.c`, or one file per bank entry for
/// a multi-file bank.
fn write_result(stem: &Utf8Path, label: &str, sources: &[(Option<String>, String)]) -> Result<()> {
    for (name, text) in sources {
        let out = match name {
            Some(name) => Utf8PathBuf::from(format!("{stem}-{label}-{name}")),
            None => Utf8PathBuf::from(format!("{stem}-{label}.c")),
        };
        std::fs::write(&out, text).with_context(|| format!("write {out}"))?;
    }
    Ok(())
}
