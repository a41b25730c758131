// Copyright 2026 Martin Pool

//! The code bank: the immutable original ASTs, shared by every variant.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::TranslationUnit;

/// Map from source file name to its parsed AST. Frozen after construction:
/// variants record edits against it but never change it, so one bank is
/// safely shared across the whole population.
///
/// A `BTreeMap` keeps file iteration order stable, which keeps emitted
/// multi-file source (and so digests) deterministic.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CodeBank {
    files: BTreeMap<String, TranslationUnit>,
}

impl CodeBank {
    pub fn new(files: BTreeMap<String, TranslationUnit>) -> Result<Arc<CodeBank>> {
        ensure!(!files.is_empty(), "code bank is empty");
        Ok(Arc::new(CodeBank { files }))
    }

    /// Read a serialised code bank. If the instrumenter left the statements
    /// unnumbered, number them here, across files in name order.
    pub fn load(path: &Utf8Path) -> Result<Arc<CodeBank>> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read serialised AST {path}"))?;
        let mut parsed: CodeBank = serde_json::from_str(&text)
            .with_context(|| format!("parse serialised AST {path}"))?;
        if parsed.files.values().all(TranslationUnit::is_unnumbered) {
            let mut next = 1;
            for unit in parsed.files.values_mut() {
                next = unit.number_statements(next);
            }
            debug!(statements = next - 1, "numbered statements at load");
        }
        CodeBank::new(parsed.files).with_context(|| format!("code bank in {path}"))
    }

    /// The canonical "before" image for all variants.
    pub fn base(&self) -> &BTreeMap<String, TranslationUnit> {
        &self.files
    }

    pub fn is_multi_file(&self) -> bool {
        self.files.len() > 1
    }
}
