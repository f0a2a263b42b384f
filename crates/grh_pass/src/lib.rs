//! The pass pipeline: an ordered sequence of local, invariant-preserving
//! rewrites over an elaborated [`grh_ir::Netlist`] (§4.8).

#![warn(missing_docs)]

pub mod errors;
pub mod manager;
pub mod pass;
pub mod passes;

pub use manager::{PassManager, PassManagerResult};
pub use pass::{Pass, PassContext, PassResult};
pub use passes::{ConstInline, DeadCodeElim, MemInitCheck, RedundantElim, Stats, XmrResolve};
