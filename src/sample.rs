// Copyright 2026 Martin Pool

//! Stochastic universal sampling: fitness-proportional selection with k
//! equally spaced pointers on the cumulative-fitness axis, so a single
//! random offset fixes the whole draw.

use anyhow::{ensure, Result};

use crate::variant::Variant;

/// Pick `k` indices into `fitnesses`, proportionally to fitness. The same
/// index may be picked more than once.
pub fn select_indices(rng: &mut fastrand::Rng, fitnesses: &[f64], k: usize) -> Result<Vec<usize>> {
    ensure!(k > 0, "cannot sample zero individuals");
    let total: f64 = fitnesses.iter().sum();
    ensure!(
        total > 0.0,
        "cannot sample from a population with no fitness"
    );
    let step = total / k as f64;
    let start = rng.f64() * step;
    let mut picks = Vec::with_capacity(k);
    let mut cumulative = 0.0;
    let mut i = 0;
    for j in 0..k {
        let pointer = start + j as f64 * step;
        while i + 1 < fitnesses.len() && cumulative + fitnesses[i] <= pointer {
            cumulative += fitnesses[i];
            i += 1;
        }
        picks.push(i);
    }
    Ok(picks)
}

/// Sample `k` breeders from a scored population.
pub fn select(
    rng: &mut fastrand::Rng,
    population: &[(Variant, f64)],
    k: usize,
) -> Result<Vec<Variant>> {
    let fitnesses: Vec<f64> = population.iter().map(|(_, f)| *f).collect();
    Ok(select_indices(rng, &fitnesses, k)?
        .into_iter()
        .map(|i| population[i].0.clone())
        .collect())
}
