//! The six representative passes named in §4.8.

mod const_inline;
mod dead_code_elim;
mod mem_init_check;
mod redundant_elim;
mod stats;
mod xmr_resolve;

pub use const_inline::ConstInline;
pub use dead_code_elim::DeadCodeElim;
pub use mem_init_check::MemInitCheck;
pub use redundant_elim::RedundantElim;
pub use stats::Stats;
pub use xmr_resolve::XmrResolve;
