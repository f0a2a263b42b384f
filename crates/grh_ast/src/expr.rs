//! Already-bound expression nodes.
//!
//! Every identifier reference is already resolved to the [`Ident`] of its
//! declaring symbol; there is no further name binding left for the elaborator
//! to perform.

use grh_common::Ident;
use grh_source::Span;
use serde::{Deserialize, Serialize};

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `~`
    BitNot,
    /// `!`
    LogicNot,
    /// `&`
    ReduceAnd,
    /// `|`
    ReduceOr,
    /// `^`
    ReduceXor,
    /// `~&`
    ReduceNand,
    /// `~|`
    ReduceNor,
    /// `~^` / `^~`
    ReduceXnor,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Xnor,
    LogicAnd,
    LogicOr,
    Shl,
    LShr,
    AShr,
    Eq,
    Ne,
    CaseEq,
    CaseNe,
    WildcardEq,
    WildcardNe,
    Lt,
    Le,
    Gt,
    Ge,
}

/// An already-bound expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AstExpr {
    /// A reference to a previously declared signal, parameter, or genvar.
    Ref(Ident),
    /// A literal's exact source text, e.g. `8'hFF` or `3`.
    Const(String),
    Unary {
        op: UnaryOp,
        operand: Box<AstExpr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<AstExpr>,
        rhs: Box<AstExpr>,
        span: Span,
    },
    Ternary {
        cond: Box<AstExpr>,
        then_value: Box<AstExpr>,
        else_value: Box<AstExpr>,
        span: Span,
    },
    /// `{a, b, c}`
    Concat { parts: Vec<AstExpr>, span: Span },
    /// `{N{expr}}`
    Replicate {
        count: u32,
        value: Box<AstExpr>,
        span: Span,
    },
    /// `a[i]`, dynamic or constant.
    Index {
        base: Box<AstExpr>,
        index: Box<AstExpr>,
        span: Span,
    },
    /// `a[msb:lsb]`, both bounds constant.
    PartSelect {
        base: Box<AstExpr>,
        msb: i64,
        lsb: i64,
        span: Span,
    },
    /// `a[base +: width]` / `a[base -: width]`.
    IndexedPartSelect {
        base: Box<AstExpr>,
        start: Box<AstExpr>,
        width: u32,
        descending: bool,
        span: Span,
    },
    /// A dotted hierarchical path read, e.g. `top.sub.signal`.
    HierRef { path: Vec<Ident>, span: Span },
    /// A DPI import function called in expression position.
    DpiCall {
        target: Ident,
        args: Vec<AstExpr>,
        span: Span,
    },
}

impl AstExpr {
    /// The source span of this expression, if one was recorded.
    ///
    /// [`AstExpr::Ref`] and [`AstExpr::Const`] carry no span of their own.
    pub fn span(&self) -> Option<Span> {
        match self {
            AstExpr::Ref(_) | AstExpr::Const(_) => None,
            AstExpr::Unary { span, .. }
            | AstExpr::Binary { span, .. }
            | AstExpr::Ternary { span, .. }
            | AstExpr::Concat { span, .. }
            | AstExpr::Replicate { span, .. }
            | AstExpr::Index { span, .. }
            | AstExpr::PartSelect { span, .. }
            | AstExpr::IndexedPartSelect { span, .. }
            | AstExpr::HierRef { span, .. }
            | AstExpr::DpiCall { span, .. } => Some(*span),
        }
    }
}
