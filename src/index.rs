// Copyright 2026 Martin Pool

//! The statement index: a stable sid -> statement map over the original AST.
//!
//! Built once at startup by walking the code bank in traversal order, and
//! read-only afterwards. Mutation uses [StatementIndex::count] to draw random
//! replacement statements from the whole program, not just the fault path.

use std::collections::HashMap;

use anyhow::{anyhow, ensure, Context, Result};
use camino::Utf8Path;
use serde::Deserialize;

use crate::ast::{Sid, Stmt, StmtKind};
use crate::bank::CodeBank;

#[derive(Debug)]
pub struct StatementIndex {
    stmts: HashMap<Sid, (String, Stmt)>,
    count: usize,
}

impl StatementIndex {
    /// Record the sids the bank carries, requiring them to be unique. The
    /// loader numbers unnumbered banks before this runs.
    pub fn build(bank: &CodeBank) -> Result<StatementIndex> {
        let mut stmts = HashMap::new();
        for (name, unit) in bank.base() {
            let mut duplicate = None;
            unit.for_each_stmt(&mut |stmt| {
                if stmts
                    .insert(stmt.sid, (name.clone(), stmt.clone()))
                    .is_some()
                {
                    duplicate = Some(stmt.sid);
                }
            });
            if let Some(sid) = duplicate {
                return Err(anyhow!("statement id {sid} assigned twice in code bank"));
            }
        }
        let count = stmts.len();
        Ok(StatementIndex { stmts, count })
    }

    /// Look up the original statement for a sid. Edits referencing unknown
    /// sids are a configuration error, not a candidate error.
    pub fn get_stmt(&self, sid: Sid) -> Result<&(String, Stmt)> {
        self.stmts
            .get(&sid)
            .ok_or_else(|| anyhow!("statement id {sid} not in index"))
    }

    pub fn kind(&self, sid: Sid) -> Result<&StmtKind> {
        Ok(&self.get_stmt(sid)?.1.kind)
    }

    pub fn contains(&self, sid: Sid) -> bool {
        self.stmts.contains_key(&sid)
    }

    /// Total number of statements in the original AST.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Cross-check the statement count the instrumenter recorded alongside the
/// AST, when that file is present. The index itself is rebuilt from the AST
/// walk, which is deterministic.
pub fn check_recorded_count(ht_file: &Utf8Path, index: &StatementIndex) -> Result<()> {
    #[derive(Deserialize)]
    struct Recorded {
        count: usize,
    }
    if !ht_file.exists() {
        return Ok(());
    }
    let text = std::fs::read_to_string(ht_file)
        .with_context(|| format!("read statement table {ht_file}"))?;
    let recorded: Recorded = serde_json::from_str(&text)
        .with_context(|| format!("parse statement table {ht_file}"))?;
    ensure!(
        recorded.count == index.count(),
        "statement table {ht_file} records {} statements but the AST has {}",
        recorded.count,
        index.count()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::gcd_bank;

    #[test]
    fn index_covers_every_statement() {
        let (_bank, index) = gcd_bank();
        assert_eq!(index.count(), 3);
        for sid in 1..=3 {
            let (file, stmt) = index.get_stmt(sid).unwrap();
            assert_eq!(file, "gcd.c");
            assert_eq!(stmt.sid, sid);
        }
        assert!(index.get_stmt(99).is_err());
    }

    #[test]
    fn duplicate_sids_are_rejected() {
        use std::collections::BTreeMap;

        use crate::bank::CodeBank;
        use crate::test_util::gcd_unit;

        let mut a = gcd_unit();
        a.number_statements(1);
        let mut files = BTreeMap::new();
        files.insert("a.c".to_owned(), a.clone());
        files.insert("b.c".to_owned(), a);
        let bank = CodeBank::new(files).unwrap();
        assert!(StatementIndex::build(&bank).is_err());
    }

    #[test]
    fn recorded_count_mismatch_is_a_configuration_error() {
        let (_bank, index) = gcd_bank();
        let dir = tempfile::tempdir().unwrap();
        let ht_file = dir.path().join("look.ht");
        let ht_path = Utf8Path::from_path(&ht_file).unwrap();
        // Absent file: nothing to check.
        check_recorded_count(ht_path, &index).unwrap();
        std::fs::write(&ht_file, r#"{"count": 3}"#).unwrap();
        check_recorded_count(ht_path, &index).unwrap();
        std::fs::write(&ht_file, r#"{"count": 7}"#).unwrap();
        assert!(check_recorded_count(ht_path, &index).is_err());
    }
}
