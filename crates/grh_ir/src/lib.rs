//! GRH — the graph intermediate representation for the SystemVerilog
//! transformation toolchain.
//!
//! This crate defines the core IR types: a tombstoning [`Arena`], opaque
//! [`GraphId`]/[`SymbolId`]/[`ValueId`]/[`OperationId`] handles, the
//! [`Value`] and [`Operation`] node types with their closed
//! [`OperationKind`] taxonomy, the per-module [`Graph`] arena, and the
//! top-level [`Netlist`] container.

#![warn(missing_docs)]

pub mod arena;
pub mod attr;
pub mod graph;
pub mod ids;
pub mod netlist;
pub mod operation;
pub mod value;

pub use arena::{Arena, ArenaId};
pub use attr::{AttributeMap, AttributeValue};
pub use graph::{Graph, GraphError, InoutPort, Port};
pub use ids::{GraphId, OperationId, SymbolId, ValueId};
pub use netlist::{ModuleSymbol, Netlist};
pub use operation::{Operation, OperationKind};
pub use value::{PortRole, Value, ValueType};
