// Copyright 2026 Martin Pool

//! Command-line arguments and the in-process options derived from them.

use anyhow::{ensure, Result};
use camino::Utf8PathBuf;
use clap::Parser;

/// Search for a patched C program that passes its failing tests.
#[derive(Debug, Parser, PartialEq)]
#[command(author, version, about)]
pub struct Args {
    /// Random number generator seed; random if not given.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Compiler command.
    #[arg(long, default_value = "gcc")]
    pub gcc: String,

    /// Extra flags appended to every compile.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub ldflags: String,

    /// Positive test harness, run as `CMD exe log port`.
    #[arg(long, default_value = "./test-good.sh")]
    pub good: String,

    /// Negative test harness, run as `CMD exe log port`.
    #[arg(long, default_value = "./test-bad.sh")]
    pub bad: String,

    /// Number of generations to search.
    #[arg(long = "gen", default_value_t = 10)]
    pub generations: usize,

    /// Population size.
    #[arg(long = "pop", default_value_t = 40)]
    pub population: usize,

    /// Fitness at which a variant counts as a repair.
    #[arg(long = "max", default_value_t = 15.0)]
    pub max_fitness: f64,

    /// Per-path-step mutation chance.
    #[arg(long = "mut", default_value_t = 0.2)]
    pub mutation_chance: f64,

    /// Relative weight of append mutations.
    #[arg(long = "ins", default_value_t = 1.0)]
    pub ins_weight: f64,

    /// Relative weight of delete mutations.
    #[arg(long = "del", default_value_t = 1.0)]
    pub del_weight: f64,

    /// Relative weight of swap mutations.
    #[arg(long = "swap", default_value_t = 1.0)]
    pub swap_weight: f64,

    /// Weight of one negative-test log line relative to a positive one.
    #[arg(long = "bad_factor", default_value_t = 10.0)]
    pub bad_factor: f64,

    /// Mutation weight for statements also on the successful path.
    #[arg(long = "good_path_factor", default_value_t = 0.0)]
    pub good_path_factor: f64,

    /// Input stem: STEM.ast, STEM.path, and optionally STEM.ht and
    /// STEM.goodpath.
    pub stem: Utf8PathBuf,
}

/// Validated options threaded through the run.
#[derive(Clone, Debug)]
pub struct Options {
    pub seed: Option<u64>,
    pub gcc_command: String,
    pub ldflags: Vec<String>,
    pub good_command: String,
    pub bad_command: String,
    pub generations: usize,
    pub population: usize,
    pub max_fitness: f64,
    pub mutation_chance: f64,
    pub ins_weight: f64,
    pub del_weight: f64,
    pub swap_weight: f64,
    pub bad_factor: f64,
    pub good_path_factor: f64,
}

impl Options {
    pub fn new(args: &Args) -> Result<Options> {
        ensure!(args.population > 0, "population must be positive");
        ensure!(args.generations > 0, "generation count must be positive");
        ensure!(
            args.ins_weight + args.del_weight + args.swap_weight > 0.0,
            "at least one mutation weight must be positive"
        );
        Ok(Options {
            seed: args.seed,
            gcc_command: args.gcc.clone(),
            ldflags: args.ldflags.split_whitespace().map(String::from).collect(),
            good_command: args.good.clone(),
            bad_command: args.bad.clone(),
            generations: args.generations,
            population: args.population,
            max_fitness: args.max_fitness,
            mutation_chance: args.mutation_chance,
            ins_weight: args.ins_weight,
            del_weight: args.del_weight,
            swap_weight: args.swap_weight,
            bad_factor: args.bad_factor,
            good_path_factor: args.good_path_factor,
        })
    }
}

impl Default for Options {
    fn default() -> Options {
        Options {
            seed: None,
            gcc_command: "gcc".to_owned(),
            ldflags: Vec::new(),
            good_command: "./test-good.sh".to_owned(),
            bad_command: "./test-bad.sh".to_owned(),
            generations: 10,
            population: 40,
            max_fitness: 15.0,
            mutation_chance: 0.2,
            ins_weight: 1.0,
            del_weight: 1.0,
            swap_weight: 1.0,
            bad_factor: 10.0,
            good_path_factor: 0.0,
        }
    }
}
