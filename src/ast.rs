// Copyright 2026 Martin Pool

//! A compact C statement AST: the "before" image that repairs are expressed
//! against, a deterministic pretty-printer, and the rewrite hook the printer
//! offers so that a variant's edits can be applied while streaming.
//!
//! Expressions are carried as opaque source text: the repair engine moves
//! whole statements around and never looks inside an expression.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Statement identifier. Assigned 1..=count in traversal order over the
/// original AST; 0 marks a detached statement that is not in the index.
pub type Sid = usize;

/// An opaque C expression, e.g. `a % b`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Expr(String);

impl Expr {
    #[allow(dead_code)] // constructed in product code only through serde
    pub fn new<S: Into<String>>(text: S) -> Expr {
        Expr(text.into())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A straight-line instruction inside an instruction-list statement.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    /// `lhs = rhs;`
    Set { lhs: Expr, rhs: Expr },
    /// `func(args...);`
    Call { func: String, args: Vec<Expr> },
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Set { lhs, rhs } => write!(f, "{lhs} = {rhs};"),
            Instr::Call { func, args } => {
                write!(f, "{func}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(");")
            }
        }
    }
}

/// One C statement form.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// A run of straight-line instructions.
    Instr(Vec<Instr>),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_blk: Block,
        else_blk: Block,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Block(Block),
    Break,
    Continue,
}

impl StmtKind {
    /// The empty block, used as the replacement for a deleted statement.
    pub fn empty_block() -> StmtKind {
        StmtKind::Block(Block { stmts: Vec::new() })
    }

    /// Deep copy with every contained sid reset to the detached sentinel, so
    /// that a copy inserted elsewhere is never re-targeted by later edits.
    pub fn detached(&self) -> StmtKind {
        match self {
            StmtKind::Instr(instrs) => StmtKind::Instr(instrs.clone()),
            StmtKind::Return(expr) => StmtKind::Return(expr.clone()),
            StmtKind::If {
                cond,
                then_blk,
                else_blk,
            } => StmtKind::If {
                cond: cond.clone(),
                then_blk: then_blk.detached(),
                else_blk: else_blk.detached(),
            },
            StmtKind::While { cond, body } => StmtKind::While {
                cond: cond.clone(),
                body: body.detached(),
            },
            StmtKind::Block(block) => StmtKind::Block(block.detached()),
            StmtKind::Break => StmtKind::Break,
            StmtKind::Continue => StmtKind::Continue,
        }
    }
}

/// A statement: a numbered node carrying one [StmtKind].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(default)]
    pub sid: Sid,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn detached(&self) -> Stmt {
        Stmt {
            sid: 0,
            kind: self.kind.detached(),
        }
    }
}

/// A brace-delimited sequence of statements.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    fn detached(&self) -> Block {
        Block {
            stmts: self.stmts.iter().map(Stmt::detached).collect(),
        }
    }
}

/// A top-level item in a translation unit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Global {
    /// Verbatim text passed through unchanged: includes, declarations,
    /// prototypes.
    Raw(String),
    Function {
        /// The full signature up to the body, e.g. `int gcd(int a, int b)`.
        signature: String,
        body: Block,
    },
}

/// A parsed C source file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub globals: Vec<Global>,
}

impl TranslationUnit {
    /// Assign sids in traversal order, starting from `next`. Returns the
    /// next unassigned sid.
    pub fn number_statements(&mut self, mut next: Sid) -> Sid {
        for global in &mut self.globals {
            if let Global::Function { body, .. } = global {
                next = number_block(body, next);
            }
        }
        next
    }

    /// Visit every statement in the same traversal order used for numbering.
    pub fn for_each_stmt<F: FnMut(&Stmt)>(&self, f: &mut F) {
        for global in &self.globals {
            if let Global::Function { body, .. } = global {
                walk_block(body, f);
            }
        }
    }

    /// True if no statement in the unit carries a sid, i.e. the file has not
    /// been through a numbering pass.
    pub fn is_unnumbered(&self) -> bool {
        let mut unnumbered = true;
        self.for_each_stmt(&mut |stmt| {
            if stmt.sid != 0 {
                unnumbered = false;
            }
        });
        unnumbered
    }
}

fn number_block(block: &mut Block, mut next: Sid) -> Sid {
    for stmt in &mut block.stmts {
        stmt.sid = next;
        next += 1;
        match &mut stmt.kind {
            StmtKind::If {
                then_blk, else_blk, ..
            } => {
                next = number_block(then_blk, next);
                next = number_block(else_blk, next);
            }
            StmtKind::While { body, .. } => next = number_block(body, next),
            StmtKind::Block(inner) => next = number_block(inner, next),
            _ => {}
        }
    }
    next
}

fn walk_block<F: FnMut(&Stmt)>(block: &Block, f: &mut F) {
    for stmt in &block.stmts {
        f(stmt);
        match &stmt.kind {
            StmtKind::If {
                then_blk, else_blk, ..
            } => {
                walk_block(then_blk, f);
                walk_block(else_blk, f);
            }
            StmtKind::While { body, .. } => walk_block(body, f),
            StmtKind::Block(inner) => walk_block(inner, f),
            _ => {}
        }
    }
}

/// Hook invoked on every statement as the printer reaches it, before the
/// printer recurses into the statement's children. Children of the returned
/// statement are visited through the hook again.
pub trait StmtRewriter {
    fn rewrite(&mut self, stmt: &Stmt) -> Result<Stmt>;
}

/// Rewriter that leaves every statement alone; prints the baseline.
#[allow(dead_code)]
pub struct Identity;

impl StmtRewriter for Identity {
    fn rewrite(&mut self, stmt: &Stmt) -> Result<Stmt> {
        Ok(stmt.clone())
    }
}

const INDENT: &str = "    ";

/// Pretty-print a translation unit, streaming every statement through `xf`.
pub fn print_unit(unit: &TranslationUnit, xf: &mut dyn StmtRewriter) -> Result<String> {
    let mut out = String::new();
    for global in &unit.globals {
        match global {
            Global::Raw(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Global::Function { signature, body } => {
                out.push_str(signature);
                out.push_str("\n{\n");
                for stmt in &body.stmts {
                    print_stmt(stmt, xf, &mut out, 1)?;
                }
                out.push_str("}\n");
            }
        }
    }
    Ok(out)
}

fn print_stmt(
    stmt: &Stmt,
    xf: &mut dyn StmtRewriter,
    out: &mut String,
    depth: usize,
) -> Result<()> {
    let stmt = xf.rewrite(stmt)?;
    let pad = INDENT.repeat(depth);
    match &stmt.kind {
        StmtKind::Instr(instrs) => {
            for instr in instrs {
                out.push_str(&pad);
                out.push_str(&instr.to_string());
                out.push('\n');
            }
        }
        StmtKind::Return(None) => {
            out.push_str(&pad);
            out.push_str("return;\n");
        }
        StmtKind::Return(Some(expr)) => {
            out.push_str(&pad);
            out.push_str(&format!("return {expr};\n"));
        }
        StmtKind::If {
            cond,
            then_blk,
            else_blk,
        } => {
            out.push_str(&pad);
            out.push_str(&format!("if ({cond}) "));
            print_block(then_blk, xf, out, depth)?;
            if !else_blk.stmts.is_empty() {
                out.push_str(&pad);
                out.push_str("else ");
                print_block(else_blk, xf, out, depth)?;
            }
        }
        StmtKind::While { cond, body } => {
            out.push_str(&pad);
            out.push_str(&format!("while ({cond}) "));
            print_block(body, xf, out, depth)?;
        }
        StmtKind::Block(block) => {
            out.push_str(&pad);
            print_block(block, xf, out, depth)?;
        }
        StmtKind::Break => {
            out.push_str(&pad);
            out.push_str("break;\n");
        }
        StmtKind::Continue => {
            out.push_str(&pad);
            out.push_str("continue;\n");
        }
    }
    Ok(())
}

fn print_block(
    block: &Block,
    xf: &mut dyn StmtRewriter,
    out: &mut String,
    depth: usize,
) -> Result<()> {
    out.push_str("{\n");
    for stmt in &block.stmts {
        print_stmt(stmt, xf, out, depth + 1)?;
    }
    out.push_str(&INDENT.repeat(depth));
    out.push_str("}\n");
    Ok(())
}
