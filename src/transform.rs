// Copyright 2026 Martin Pool

//! The patch transform: turn a variant's edit history into a per-statement
//! rewriter that the AST printer streams every statement through.
//!
//! The history is simulated once into a per-sid view of the post-edit
//! statement, so the common case in the printer (statement untouched) is a
//! single map probe. Each touched sid is rewritten at most once per print:
//! an `Append` wraps the original statement in a block that still contains
//! its sid, and without that guard the printer's re-visit of the block's
//! children would apply the same edit again.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use tracing::trace;

use crate::ast::{Block, Sid, Stmt, StmtKind, StmtRewriter};
use crate::edit::{Atom, Edit};
use crate::index::StatementIndex;

/// Post-edit replacement for one sid, tagged with the last edit that
/// produced it (diagnostics only; tags never reach the emitted source).
#[derive(Debug)]
struct Planned {
    stmt: Stmt,
    tag: &'static str,
}

/// A per-print rewriter planned from one history.
#[derive(Debug)]
pub struct Rewriter {
    planned: HashMap<Sid, Planned>,
    applied: HashSet<Sid>,
}

impl Rewriter {
    /// Simulate `history` in order against the original statements.
    ///
    /// Later edits targeting a sid observe the result of earlier ones:
    /// a swap exchanges the *current* kinds at its two sids, an append wraps
    /// the *current* statement at its target. Copies materialised from
    /// elsewhere are detached so the printer never re-targets them.
    pub fn plan(history: &[Edit], index: &StatementIndex) -> Result<Rewriter> {
        // Every targeted sid must exist in the index before anything fires.
        for edit in history {
            for sid in edit.targets() {
                index.get_stmt(sid)?;
            }
        }
        let mut view: HashMap<Sid, Planned> = HashMap::new();
        let current = |view: &HashMap<Sid, Planned>, sid: Sid| -> Result<Stmt> {
            match view.get(&sid) {
                Some(planned) => Ok(planned.stmt.clone()),
                None => Ok(index.get_stmt(sid)?.1.clone()),
            }
        };
        for edit in history {
            match edit {
                Edit::Delete(sid) => {
                    view.insert(
                        *sid,
                        Planned {
                            stmt: Stmt {
                                sid: *sid,
                                kind: StmtKind::empty_block(),
                            },
                            tag: "del",
                        },
                    );
                }
                Edit::Put(sid, Atom::Stmt(kind)) => {
                    view.insert(
                        *sid,
                        Planned {
                            stmt: Stmt {
                                sid: *sid,
                                kind: kind.detached(),
                            },
                            tag: "put",
                        },
                    );
                }
                Edit::Put(sid, Atom::Exp(_)) => {
                    bail!("cannot apply an expression atom to statement {sid}")
                }
                Edit::Swap(x, y) => {
                    let at_x = current(&view, *x)?;
                    let at_y = current(&view, *y)?;
                    view.insert(
                        *x,
                        Planned {
                            stmt: Stmt {
                                sid: *x,
                                kind: at_y.kind.detached(),
                            },
                            tag: "swap1",
                        },
                    );
                    view.insert(
                        *y,
                        Planned {
                            stmt: Stmt {
                                sid: *y,
                                kind: at_x.kind.detached(),
                            },
                            tag: "swap2",
                        },
                    );
                }
                Edit::Append { target, source } => {
                    let at_target = current(&view, *target)?;
                    let copy = Stmt {
                        sid: 0,
                        kind: index.kind(*source)?.detached(),
                    };
                    view.insert(
                        *target,
                        Planned {
                            stmt: Stmt {
                                sid: *target,
                                kind: StmtKind::Block(Block {
                                    stmts: vec![at_target, copy],
                                }),
                            },
                            tag: "app",
                        },
                    );
                }
                Edit::ReplaceSubatom { sid, .. } => {
                    bail!("sub-statement replacement is not supported here (statement {sid})")
                }
                Edit::Crossover(x, y) => {
                    bail!("crossover({x},{y}) is not an applicable edit")
                }
            }
        }
        Ok(Rewriter {
            planned: view,
            applied: HashSet::new(),
        })
    }

    /// The post-edit kind visible at `sid`, for callers that want one
    /// statement rather than a full print.
    pub fn kind_at(&self, sid: Sid, index: &StatementIndex) -> Result<StmtKind> {
        match self.planned.get(&sid) {
            Some(planned) => Ok(planned.stmt.kind.clone()),
            None => Ok(index.kind(sid)?.clone()),
        }
    }
}

impl StmtRewriter for Rewriter {
    fn rewrite(&mut self, stmt: &Stmt) -> Result<Stmt> {
        match self.planned.get(&stmt.sid) {
            Some(planned) if !self.applied.contains(&stmt.sid) => {
                self.applied.insert(stmt.sid);
                trace!(sid = stmt.sid, edit = planned.tag, "rewrite statement");
                Ok(planned.stmt.clone())
            }
            _ => Ok(stmt.clone()),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::Expr;
    use crate::test_util::gcd_bank;

    #[test]
    fn unknown_sid_is_fatal() {
        let (_bank, index) = gcd_bank();
        let err = Rewriter::plan(&[Edit::Delete(42)], &index).unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn expression_atom_is_fatal_and_names_the_sid() {
        let (_bank, index) = gcd_bank();
        let history = [Edit::Put(2, Atom::Exp(Expr::new("a + b")))];
        let err = Rewriter::plan(&history, &index).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot apply an expression atom to statement 2"
        );
    }

    #[test]
    fn reserved_edits_are_fatal() {
        let (_bank, index) = gcd_bank();
        assert!(Rewriter::plan(
            &[Edit::ReplaceSubatom {
                sid: 1,
                subatom: 0,
                atom: Atom::Exp(Expr::new("0"))
            }],
            &index
        )
        .is_err());
        assert!(Rewriter::plan(&[Edit::Crossover(1, 2)], &index).is_err());
    }

    #[test]
    fn later_edits_observe_earlier_ones() {
        let (_bank, index) = gcd_bank();
        // Delete 2, then swap 2 and 3: position 2 shows the return, position
        // 3 shows the empty block left by the delete.
        let history = [Edit::Delete(2), Edit::Swap(2, 3)];
        let rewriter = Rewriter::plan(&history, &index).unwrap();
        assert_eq!(
            rewriter.kind_at(2, &index).unwrap(),
            index.kind(3).unwrap().detached()
        );
        assert_eq!(
            rewriter.kind_at(3, &index).unwrap(),
            StmtKind::empty_block()
        );
    }

    #[test]
    fn untouched_sids_read_through_to_the_index() {
        let (_bank, index) = gcd_bank();
        let rewriter = Rewriter::plan(&[Edit::Delete(2)], &index).unwrap();
        assert_eq!(rewriter.kind_at(1, &index).unwrap(), *index.kind(1).unwrap());
    }
}
