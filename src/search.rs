// Copyright 2026 Martin Pool

//! The genetic search loop: seed a population from the original program,
//! then alternate fitness evaluation, selection, crossover and mutation for
//! a fixed number of generations.

use anyhow::{ensure, Result};
use itertools::Itertools;
use tracing::{debug, info};

use crate::fitness::{Best, Evaluator};
use crate::mutate::{crossover, mutate};
use crate::options::Options;
use crate::sample;
use crate::variant::Variant;

/// Run the whole search and return the best adequate variant, if any.
pub fn run(
    rng: &mut fastrand::Rng,
    original: Variant,
    evaluator: &Evaluator,
    options: &Options,
) -> Result<Option<Best>> {
    // Seed the population with eagerly mutated copies of the original.
    let mut population: Vec<Variant> = (0..options.population)
        .map(|_| mutate(rng, &original, 2.0 * options.mutation_chance, options))
        .collect();

    for generation in 1..=options.generations {
        info!(generation, members = population.len(), "evaluate generation");
        let mut scored: Vec<(Variant, f64)> = Vec::new();
        for variant in population.drain(..) {
            let fitness = evaluator.fitness(&variant)?;
            if fitness > 0.0 {
                scored.push((variant, fitness));
            }
        }
        ensure!(
            !scored.is_empty(),
            "generation {generation} has no variant with positive fitness"
        );
        while scored.len() < options.population {
            info!(
                generation,
                survivors = scored.len(),
                "doubling survivors to refill the population"
            );
            let survivors = scored.clone();
            scored.extend(survivors);
        }

        let mut breeders = sample::select(rng, &scored, options.population / 2)?;
        rng.shuffle(&mut breeders);
        debug!(generation, breeders = breeders.len(), "selected breeders");

        let mut bred = Vec::new();
        let mut pairs = breeders.into_iter().tuples();
        for (mom, dad) in pairs.by_ref() {
            let (c1, c2) = crossover(rng, &mom, &dad)?;
            bred.extend([mom, dad, c1, c2]);
        }
        bred.extend(pairs.into_buffer());

        population = bred
            .into_iter()
            .flat_map(|variant| {
                let mutant = mutate(rng, &variant, options.mutation_chance, options);
                [variant, mutant]
            })
            .collect();
    }

    Ok(evaluator.best())
}
