//! Module-body items: declarations, continuous assigns, processes, instances.

use crate::expr::AstExpr;
use crate::stmt::AstStmt;
use crate::types::AstType;
use grh_common::Ident;
use grh_source::Span;
use serde::{Deserialize, Serialize};

/// The edge polarity a sequential event controls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgePolarity {
    Posedge,
    Negedge,
    /// No edge; the process is purely combinational/latch-sensitive.
    Level,
}

/// A single entry in an `always @(...)` sensitivity/event list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstEdge {
    pub polarity: EdgePolarity,
    pub signal: Ident,
}

/// The behavioral flavor of an `always` process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlwaysKind {
    Comb,
    Latch,
    /// Plain `always @(...)`, which may lower to combinational, sequential,
    /// or latch depending on the edges present (§4.5 of the procedural lowerer).
    Ff,
}

/// A port binding at an instantiation site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstConnection {
    pub port: Ident,
    pub value: AstExpr,
}

/// A resolved module parameter override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstParamValue {
    pub name: Ident,
    pub value: String,
}

/// One item inside a module body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AstItem {
    /// `assign target = value;`
    ContinuousAssign { target: AstExpr, value: AstExpr, span: Span },
    /// An `always`/`always_comb`/`always_latch`/`always_ff` process.
    Always {
        kind: AlwaysKind,
        edges: Vec<AstEdge>,
        body: AstStmt,
        span: Span,
    },
    /// A module or interface instantiation, already bound to its target module.
    Instance {
        module: Ident,
        name: Ident,
        params: Vec<AstParamValue>,
        connections: Vec<AstConnection>,
        span: Span,
    },
    /// A `generate for`/`genvar` region, already unrolled to `body` copies
    /// (one per iteration) by the front end.
    Generate {
        genvar: Ident,
        bound: u32,
        body: Vec<AstItem>,
        span: Span,
    },
    /// A DPI import function declaration.
    DpiImport {
        name: Ident,
        arg_names: Vec<Ident>,
        arg_directions: Vec<Direction>,
        arg_types: Vec<AstType>,
        return_type: Option<AstType>,
        span: Span,
    },
    NetDecl { name: Ident, ty: AstType, span: Span },
    RegDecl { name: Ident, ty: AstType, span: Span },
    MemDecl {
        name: Ident,
        element_ty: AstType,
        depth: u32,
        span: Span,
    },
}

/// A DPI argument's direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
    Inout,
}
