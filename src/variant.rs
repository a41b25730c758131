// Copyright 2026 Martin Pool

//! A candidate repair: a handle on the shared code bank plus an owned,
//! ordered edit history. Variants never materialise a mutated AST; they
//! apply their history just-in-time while the original is pretty-printed.

use std::sync::Arc;

use anyhow::Result;

use crate::ast::{print_unit, Sid, StmtKind};
use crate::bank::CodeBank;
use crate::edit::{describe_history, Atom, Edit};
use crate::index::StatementIndex;
use crate::path::WeightedPath;
use crate::transform::Rewriter;

#[derive(Clone)]
pub struct Variant {
    bank: Arc<CodeBank>,
    index: Arc<StatementIndex>,
    path: Arc<WeightedPath>,
    history: Vec<Edit>,
}

impl Variant {
    /// The original program: an empty history over the bank.
    pub fn original(
        bank: Arc<CodeBank>,
        index: Arc<StatementIndex>,
        path: Arc<WeightedPath>,
    ) -> Variant {
        Variant {
            bank,
            index,
            path,
            history: Vec::new(),
        }
    }

    pub fn delete(&mut self, sid: Sid) {
        self.history.push(Edit::Delete(sid));
    }

    pub fn append(&mut self, target: Sid, source: Sid) {
        self.history.push(Edit::Append { target, source });
    }

    pub fn swap(&mut self, a: Sid, b: Sid) {
        self.history.push(Edit::Swap(a, b));
    }

    pub fn put(&mut self, sid: Sid, kind: StmtKind) {
        self.history.push(Edit::Put(sid, Atom::Stmt(kind)));
    }

    /// Record a sub-statement replacement. Other representations apply
    /// these; printing a variant that carries one is fatal.
    #[allow(dead_code)]
    pub fn replace_subatom(&mut self, sid: Sid, subatom: usize, atom: Atom) {
        self.history.push(Edit::ReplaceSubatom { sid, subatom, atom });
    }

    pub fn history(&self) -> &[Edit] {
        &self.history
    }

    /// Replace the history wholesale (crossover, deserialisation).
    #[allow(dead_code)]
    pub fn set_history(&mut self, history: Vec<Edit>) {
        self.history = history;
    }

    pub fn path(&self) -> &WeightedPath {
        &self.path
    }

    pub fn index(&self) -> &StatementIndex {
        &self.index
    }

    /// The post-edit statement kind visible at `sid`.
    pub fn get(&self, sid: Sid) -> Result<StmtKind> {
        let rewriter = Rewriter::plan(&self.history, &self.index)?;
        rewriter.kind_at(sid, &self.index)
    }

    /// Print every file in the bank with this variant's edits applied.
    ///
    /// File names are only reported for multi-file banks. Output depends
    /// only on (bank, history): equal histories print byte-identical source.
    pub fn emit_source(&self) -> Result<Vec<(Option<String>, String)>> {
        let mut rewriter = Rewriter::plan(&self.history, &self.index)?;
        let multi = self.bank.is_multi_file();
        let mut sources = Vec::new();
        for (name, unit) in self.bank.base() {
            let source = print_unit(unit, &mut rewriter)?;
            sources.push((multi.then(|| name.clone()), source));
        }
        Ok(sources)
    }

    /// Short description for logs: the history, or "original".
    pub fn describe(&self) -> String {
        if self.history.is_empty() {
            "original".to_owned()
        } else {
            describe_history(&self.history)
        }
    }
}

#[cfg(test)]
mod test {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::Expr;
    use crate::test_util::{gcd_source, gcd_variant};

    #[test]
    fn empty_history_emits_the_baseline() {
        let variant = gcd_variant();
        let sources = variant.emit_source().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0, None);
        assert_eq!(sources[0].1, gcd_source());
    }

    #[test]
    fn delete_replaces_one_statement_with_an_empty_block() {
        let mut variant = gcd_variant();
        variant.delete(2);
        assert_eq!(
            variant.emit_source().unwrap()[0].1,
            indoc! { r#"
                #include <stdio.h>
                int gcd(int a, int b)
                {
                    while (b != 0) {
                        {
                        }
                    }
                    return a;
                }
            "# }
        );
    }

    #[test]
    fn swap_exchanges_textual_positions() {
        let mut variant = gcd_variant();
        variant.swap(1, 3);
        assert_eq!(
            variant.emit_source().unwrap()[0].1,
            indoc! { r#"
                #include <stdio.h>
                int gcd(int a, int b)
                {
                    return a;
                    while (b != 0) {
                        tmp = a % b;
                        a = b;
                        b = tmp;
                    }
                }
            "# }
        );
    }

    #[test]
    fn double_swap_returns_to_the_baseline() {
        let mut variant = gcd_variant();
        variant.swap(1, 3);
        variant.swap(1, 3);
        assert_eq!(variant.emit_source().unwrap()[0].1, gcd_source());
    }

    #[test]
    fn append_inserts_exactly_one_copy() {
        let mut variant = gcd_variant();
        variant.append(2, 2);
        let source = variant.emit_source().unwrap()[0].1.clone();
        // The appended block textually re-contains the original statement,
        // but the copy is appended exactly once.
        assert_eq!(source.matches("tmp = a % b;").count(), 2);
        assert_eq!(gcd_source().matches("tmp = a % b;").count(), 1);
    }

    #[test]
    fn delete_then_append_leaves_an_empty_block_followed_by_the_copy() {
        let mut variant = gcd_variant();
        variant.delete(2);
        variant.append(2, 3);
        assert_eq!(
            variant.emit_source().unwrap()[0].1,
            indoc! { r#"
                #include <stdio.h>
                int gcd(int a, int b)
                {
                    while (b != 0) {
                        {
                            {
                            }
                            return a;
                        }
                    }
                    return a;
                }
            "# }
        );
    }

    #[test]
    fn put_replaces_the_kind_outright() {
        let mut variant = gcd_variant();
        let return_kind = variant.get(3).unwrap();
        variant.put(2, return_kind);
        let source = variant.emit_source().unwrap()[0].1.clone();
        assert_eq!(source.matches("return a;").count(), 2);
    }

    #[test]
    fn get_sees_the_post_edit_kind() {
        let mut variant = gcd_variant();
        assert_eq!(variant.get(2).unwrap(), *variant.index().kind(2).unwrap());
        variant.delete(2);
        assert_eq!(variant.get(2).unwrap(), StmtKind::empty_block());
    }

    #[test]
    fn identical_histories_print_identical_source() {
        let mut a = gcd_variant();
        let mut b = gcd_variant();
        for v in [&mut a, &mut b] {
            v.delete(2);
            v.swap(1, 3);
            v.append(3, 2);
        }
        assert_eq!(
            a.emit_source().unwrap()[0].1,
            b.emit_source().unwrap()[0].1
        );
    }

    #[test]
    fn permuting_edits_on_distinct_sids_does_not_change_output() {
        let mut a = gcd_variant();
        a.delete(2);
        a.append(3, 1);
        let mut b = gcd_variant();
        b.append(3, 1);
        b.delete(2);
        assert_eq!(
            a.emit_source().unwrap()[0].1,
            b.emit_source().unwrap()[0].1
        );
    }

    #[test]
    fn edits_never_touch_the_code_bank() {
        let variant = gcd_variant();
        let before = serde_json::to_string(variant.bank.as_ref()).unwrap();
        for _ in 0..3 {
            let mut child = variant.clone();
            child.delete(2);
            child.swap(1, 3);
            child.append(3, 2);
            child.emit_source().unwrap();
        }
        let after = serde_json::to_string(variant.bank.as_ref()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn printing_a_subatom_replacement_is_fatal() {
        let mut variant = gcd_variant();
        variant.replace_subatom(2, 0, Atom::Exp(Expr::new("a - b")));
        assert!(variant.emit_source().is_err());
    }

    #[test]
    fn set_history_replaces_the_whole_history() {
        let mut variant = gcd_variant();
        variant.delete(2);
        variant.set_history(vec![]);
        assert_eq!(variant.emit_source().unwrap()[0].1, gcd_source());
        assert_eq!(variant.describe(), "original");
    }
}
