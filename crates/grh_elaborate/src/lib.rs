//! AST-to-GRH elaboration: type flattening, signal memoization, RHS
//! conversion, procedural lowering, DPI lowering, and instance/parametric
//! specialization (§4).
//!
//! [`context::ElaborationContext`] is the mutable state threaded through a
//! full design elaboration; the other modules are independent, narrowly
//! scoped transformations that `ElaborationContext`'s owner composes.

#![warn(missing_docs)]

pub mod context;
pub mod dpi;
pub mod driver;
pub mod errors;
pub mod flatten;
pub mod hierarchy;
pub mod memo;
pub mod ops;
pub mod procedural;
pub mod rhs;

pub use context::ElaborationContext;
pub use driver::elaborate_design;
pub use flatten::{FlatField, FlatType};
pub use memo::{MemoEntry, MemoKind, SignalMemo, SliceRecord, WriteBackMemo, WriteKey};
pub use rhs::Scope;
