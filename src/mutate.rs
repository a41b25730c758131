// Copyright 2026 Martin Pool

//! Genetic operators: path-weighted mutation and one-point crossover.
//!
//! Both produce children that share their parents' code bank; only the edit
//! histories grow.

use std::collections::HashSet;

use anyhow::{ensure, Result};
use tracing::trace;

use crate::ast::Sid;
use crate::options::Options;
use crate::variant::Variant;

/// Walk the parent's weighted path and, at each step, mutate with
/// probability `step weight * chance`. A step picks one of swap, delete or
/// append by the configured weights; the replacement statement for swap and
/// append is drawn uniformly from the whole program.
///
/// A sid taking part in one mutation is reserved for the rest of this call,
/// so a single child never piles two mutations onto the same statement.
pub fn mutate(rng: &mut fastrand::Rng, parent: &Variant, chance: f64, options: &Options) -> Variant {
    let mut child = parent.clone();
    let mut reserved: HashSet<Sid> = HashSet::new();
    let count = parent.index().count();
    for step in parent.path().steps() {
        if rng.f64() > step.weight * chance {
            continue;
        }
        let replace_with = 1 + rng.usize(..count);
        if reserved.contains(&step.sid) || reserved.contains(&replace_with) {
            continue;
        }
        reserved.insert(step.sid);
        reserved.insert(replace_with);
        match pick_weighted(
            rng,
            &[options.swap_weight, options.del_weight, options.ins_weight],
        ) {
            0 => child.swap(step.sid, replace_with),
            1 => child.delete(step.sid),
            _ => child.append(step.sid, replace_with),
        }
    }
    trace!(child = %child.describe(), "mutated");
    child
}

/// One-point crossover: pick a cut on the (shared-length) path and, for each
/// later position, exchange the parents' visible statements into the two
/// children with probability equal to the larger step weight.
pub fn crossover(
    rng: &mut fastrand::Rng,
    mom: &Variant,
    dad: &Variant,
) -> Result<(Variant, Variant)> {
    let mom_path = mom.path().steps();
    let dad_path = dad.path().steps();
    ensure!(
        mom_path.len() == dad_path.len(),
        "crossover needs equal path lengths, got {} and {}",
        mom_path.len(),
        dad_path.len()
    );
    let mut c1 = mom.clone();
    let mut c2 = dad.clone();
    let len = mom_path.len();
    if len < 2 {
        return Ok((c1, c2));
    }
    let cut = rng.usize(1..len);
    for i in cut..len {
        let p = mom_path[i].weight.max(dad_path[i].weight);
        if rng.f64() <= p {
            let sid = mom_path[i].sid;
            let from_mom = mom.get(sid)?;
            let from_dad = dad.get(sid)?;
            c1.put(sid, from_dad);
            c2.put(sid, from_mom);
        }
    }
    Ok((c1, c2))
}

fn pick_weighted(rng: &mut fastrand::Rng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    debug_assert!(total > 0.0);
    let mut r = rng.f64() * total;
    for (i, w) in weights.iter().enumerate() {
        if r < *w {
            return i;
        }
        r -= w;
    }
    weights.len() - 1
}
