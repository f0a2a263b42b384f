//! The already-elaborated SystemVerilog AST interface the Elaborator consumes.
//!
//! This crate carries no lexer, parser, or name binder — those live in an
//! external SystemVerilog front end. It models exactly the surface the
//! Elaborator needs: symbols, resolved types, bound expressions, statements,
//! and module items with port connections and bit-stream widths.

#![warn(missing_docs)]

pub mod design;
pub mod expr;
pub mod item;
pub mod stmt;
pub mod types;

pub use design::{AstDesign, AstModule, AstParam, AstPort};
pub use expr::{AstExpr, BinaryOp, UnaryOp};
pub use item::{
    AlwaysKind, AstConnection, AstEdge, AstItem, AstParamValue, Direction, EdgePolarity,
};
pub use stmt::{AstStmt, CaseArm};
pub use types::AstType;
