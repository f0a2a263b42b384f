//! Opaque ID types for GRH entities.
//!
//! [`ValueId`] and [`OperationId`] each carry the [`GraphId`] of the graph
//! that minted them, so passing an ID from one graph into another graph's
//! mutating API is a detectable error rather than silent corruption (§3
//! "Symbol and ID types"). [`SymbolId`] is a plain interned-string handle;
//! symbols are never compared across graphs because each graph owns its own
//! interner.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifies a single [`Graph`](crate::graph::Graph) instance, minted once
/// per graph at construction time. Used only to detect cross-graph ID
/// misuse; it has no meaning outside that check.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct GraphId(u32);

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

impl GraphId {
    /// Mints a fresh, process-wide unique `GraphId`.
    pub fn fresh() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// A sentinel id never returned by [`GraphId::fresh`], used for
    /// `invalid` IDs that must compare unequal to any real id.
    pub const INVALID: GraphId = GraphId(0);
}

/// Opaque handle identifying an interned string inside a single [`Graph`](crate::graph::Graph).
///
/// Two ids are equal iff their texts are equal *within the same graph's
/// interner*; `SymbolId`s are not portable across graphs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Creates a `SymbolId` from a raw interner index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw interner index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `SymbolId` wraps a `u32`, always a valid `usize` on 32- and
// 64-bit platforms; `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for SymbolId {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(SymbolId)
    }
}

macro_rules! define_scoped_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name {
            graph: GraphId,
            index: u32,
        }

        impl $name {
            /// A sentinel that compares unequal to any id minted by a real graph.
            pub const INVALID: $name = $name { graph: GraphId::INVALID, index: u32::MAX };

            /// Creates an id scoped to the given graph from a raw arena index.
            pub fn new(graph: GraphId, index: u32) -> Self {
                Self { graph, index }
            }

            /// Returns the [`GraphId`] of the graph that minted this id.
            pub fn graph(self) -> GraphId {
                self.graph
            }

            /// Returns the raw arena index, ignoring which graph minted it.
            pub fn index(self) -> u32 {
                self.index
            }

            /// Returns `true` if this id was minted by `graph`.
            pub fn belongs_to(self, graph: GraphId) -> bool {
                self.graph == graph
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                // Arena-internal use only: the owning Graph immediately
                // re-tags the id with its own GraphId before handing it out.
                Self { graph: GraphId::INVALID, index }
            }

            fn as_raw(self) -> u32 {
                self.index
            }
        }
    };
}

define_scoped_id!(
    /// Opaque index of a [`Value`](crate::value::Value) within its owning [`Graph`](crate::graph::Graph).
    ValueId
);

define_scoped_id!(
    /// Opaque index of an [`Operation`](crate::operation::Operation) within its owning [`Graph`](crate::graph::Graph).
    OperationId
);
