//! Already-bound procedural statement nodes, the body of an `always*` block
//! or an initial/final block.

use crate::expr::AstExpr;
use grh_common::Ident;
use grh_source::Span;
use serde::{Deserialize, Serialize};

/// A single `case`/`casex`/`casez` arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseArm {
    /// The arm's match values; empty means `default`.
    pub labels: Vec<AstExpr>,
    pub body: Box<AstStmt>,
}

/// A procedural statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AstStmt {
    /// A blocking (`=`) or non-blocking (`<=`) procedural assignment.
    Assign {
        target: AstExpr,
        value: AstExpr,
        blocking: bool,
        span: Span,
    },
    If {
        cond: AstExpr,
        then_branch: Box<AstStmt>,
        else_branch: Option<Box<AstStmt>>,
        span: Span,
    },
    Case {
        selector: AstExpr,
        arms: Vec<CaseArm>,
        span: Span,
    },
    /// A sequence of statements in one scope.
    Block(Vec<AstStmt>),
    For {
        init: Box<AstStmt>,
        cond: AstExpr,
        step: Box<AstStmt>,
        body: Box<AstStmt>,
        span: Span,
    },
    /// `foreach (arr[i])`, already expanded to a known iteration count.
    Foreach {
        array: Ident,
        index: Ident,
        count: u32,
        body: Box<AstStmt>,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    Display { args: Vec<AstExpr>, span: Span },
    Assert {
        cond: AstExpr,
        message: Option<String>,
        span: Span,
    },
    Finish(Span),
}
