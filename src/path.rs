// Copyright 2026 Martin Pool

//! The weighted execution path produced by fault localisation: the ordered
//! list of statements the failing run visited, each with a probability that
//! scales how eagerly mutation touches it.

use std::collections::HashSet;

use anyhow::{bail, ensure, Context, Result};
use camino::Utf8Path;
use tracing::debug;

use crate::ast::Sid;
use crate::index::StatementIndex;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStep {
    pub weight: f64,
    pub sid: Sid,
}

/// Ordered, deduplicated steps; duplicates in the input keep their first
/// occurrence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightedPath {
    steps: Vec<PathStep>,
}

impl WeightedPath {
    pub fn new(steps: Vec<PathStep>) -> WeightedPath {
        let mut seen = HashSet::new();
        let steps = steps
            .into_iter()
            .filter(|step| seen.insert(step.sid))
            .collect();
        WeightedPath { steps }
    }

    /// Read `path_file` (one sid per line), weighting each step 1.0, or
    /// `good_path_factor` for sids also listed in `goodpath_file`. Sids on
    /// the path must exist in the statement index.
    pub fn load(
        path_file: &Utf8Path,
        goodpath_file: &Utf8Path,
        good_path_factor: f64,
        index: &StatementIndex,
    ) -> Result<WeightedPath> {
        let on_good_path = if goodpath_file.exists() {
            read_sids(goodpath_file)?.into_iter().collect()
        } else {
            HashSet::new()
        };
        let mut steps = Vec::new();
        for sid in read_sids(path_file)? {
            if !index.contains(sid) {
                bail!("path statement {sid} is not in the statement index");
            }
            let weight = if on_good_path.contains(&sid) {
                good_path_factor
            } else {
                1.0
            };
            steps.push(PathStep { weight, sid });
        }
        let path = WeightedPath::new(steps);
        ensure!(!path.is_empty(), "path file {path_file} lists no statements");
        debug!(steps = path.len(), "loaded weighted path");
        Ok(path)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn read_sids(file: &Utf8Path) -> Result<Vec<Sid>> {
    let text = std::fs::read_to_string(file).with_context(|| format!("read path file {file}"))?;
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<Sid>()
                .with_context(|| format!("bad statement id {line:?} in {file}"))
        })
        .collect()
}
