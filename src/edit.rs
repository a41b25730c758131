// Copyright 2026 Martin Pool

//! Edit operations: the atomic statement-level changes a variant records
//! against the code bank. A variant is nothing but an ordered list of these.

use std::fmt;

use crate::ast::{Expr, Sid, StmtKind};

/// Operand of an edit. Only statement atoms are applied by the core
/// transform; expression atoms belong to finer-grained representations and
/// are rejected if a variant carrying one is ever printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Atom {
    Stmt(StmtKind),
    #[allow(dead_code)] // never produced by the core operators
    Exp(Expr),
}

/// One edit against the original AST.
///
/// Earlier edits in a history are applied first; later edits targeting the
/// same statement observe their result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    /// Replace the statement with an empty block.
    Delete(Sid),
    /// Replace `target` with a block holding it followed by a detached copy
    /// of `source`'s original kind.
    Append { target: Sid, source: Sid },
    /// Exchange the kinds visible at the two sids.
    Swap(Sid, Sid),
    /// Replace the statement's kind outright.
    Put(Sid, Atom),
    /// Reserved for sub-statement representations; fatal if printed.
    ReplaceSubatom {
        sid: Sid,
        subatom: usize,
        atom: Atom,
    },
    /// Reserved. Crossover is realised as history-level exchange, never as
    /// an edit.
    #[allow(dead_code)]
    Crossover(Sid, Sid),
}

impl Edit {
    /// The sids whose printed form this edit changes. Both sides of a swap
    /// are targets; the source of an append is not.
    pub fn targets(&self) -> impl Iterator<Item = Sid> + '_ {
        let (a, b) = match self {
            Edit::Delete(sid) | Edit::Put(sid, _) => (Some(*sid), None),
            Edit::Append { target, .. } => (Some(*target), None),
            Edit::Swap(x, y) => (Some(*x), Some(*y)),
            Edit::ReplaceSubatom { sid, .. } => (Some(*sid), None),
            Edit::Crossover(_, _) => (None, None),
        };
        a.into_iter().chain(b)
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Delete(sid) => write!(f, "d({sid})"),
            Edit::Append { target, source } => write!(f, "a({target},{source})"),
            Edit::Swap(x, y) => write!(f, "s({x},{y})"),
            Edit::Put(sid, _) => write!(f, "p({sid})"),
            Edit::ReplaceSubatom { sid, subatom, .. } => write!(f, "e({sid},{subatom})"),
            Edit::Crossover(x, y) => write!(f, "x({x},{y})"),
        }
    }
}

/// Render a history the way it is logged: `d(2) a(3,7) s(1,4)`.
pub fn describe_history(history: &[Edit]) -> String {
    history
        .iter()
        .map(Edit::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_forms() {
        let history = vec![
            Edit::Delete(2),
            Edit::Append {
                target: 3,
                source: 7,
            },
            Edit::Swap(1, 4),
        ];
        assert_eq!(describe_history(&history), "d(2) a(3,7) s(1,4)");
    }

    #[test]
    fn swap_targets_both_sides() {
        let targets: Vec<_> = Edit::Swap(1, 4).targets().collect();
        assert_eq!(targets, [1, 4]);
        let targets: Vec<_> = Edit::Append {
            target: 3,
            source: 7,
        }
        .targets()
        .collect();
        assert_eq!(targets, [3]);
    }
}
