// Copyright 2026 Martin Pool

//! Shared fixtures: a small gcd program, indexed and wrapped as a variant.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::ast::{print_unit, Block, Expr, Global, Identity, Instr, Stmt, StmtKind, TranslationUnit};
use crate::bank::CodeBank;
use crate::index::StatementIndex;
use crate::path::{PathStep, WeightedPath};
use crate::variant::Variant;

/// A gcd program with three statements: a while loop (sid 1) whose body is
/// one instruction list (sid 2), then a return (sid 3).
pub fn gcd_unit() -> TranslationUnit {
    TranslationUnit {
        globals: vec![
            Global::Raw("#include <stdio.h>".to_owned()),
            Global::Function {
                signature: "int gcd(int a, int b)".to_owned(),
                body: Block {
                    stmts: vec![
                        Stmt {
                            sid: 0,
                            kind: StmtKind::While {
                                cond: Expr::new("b != 0"),
                                body: Block {
                                    stmts: vec![Stmt {
                                        sid: 0,
                                        kind: StmtKind::Instr(vec![
                                            Instr::Set {
                                                lhs: Expr::new("tmp"),
                                                rhs: Expr::new("a % b"),
                                            },
                                            Instr::Set {
                                                lhs: Expr::new("a"),
                                                rhs: Expr::new("b"),
                                            },
                                            Instr::Set {
                                                lhs: Expr::new("b"),
                                                rhs: Expr::new("tmp"),
                                            },
                                        ]),
                                    }],
                                },
                            },
                        },
                        Stmt {
                            sid: 0,
                            kind: StmtKind::Return(Some(Expr::new("a"))),
                        },
                    ],
                },
            },
        ],
    }
}

pub fn gcd_bank() -> (Arc<CodeBank>, Arc<StatementIndex>) {
    let mut unit = gcd_unit();
    unit.number_statements(1);
    let mut files = BTreeMap::new();
    files.insert("gcd.c".to_owned(), unit);
    let bank = CodeBank::new(files).unwrap();
    let index = Arc::new(StatementIndex::build(&bank).unwrap());
    (bank, index)
}

/// The baseline print of the gcd program.
pub fn gcd_source() -> String {
    print_unit(&gcd_unit(), &mut Identity).unwrap()
}

/// An empty-history variant of the gcd program whose path covers all three
/// statements at weight 1.0.
pub fn gcd_variant() -> Variant {
    gcd_variant_with_path(&[1, 2, 3])
}

/// Like [gcd_variant], with the path restricted to the given sids.
pub fn gcd_variant_with_path(sids: &[crate::ast::Sid]) -> Variant {
    let (bank, index) = gcd_bank();
    let path = Arc::new(WeightedPath::new(
        sids.iter()
            .map(|&sid| PathStep { weight: 1.0, sid })
            .collect(),
    ));
    Variant::original(bank, index, path)
}

/// Write a shell script into `dir` and return a command string that runs it.
pub fn sh_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    format!("sh {}", path.display())
}
