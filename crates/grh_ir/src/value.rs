//! [`Value`] — a named, typed edge in the graph (§3 "Value (edge)").

use crate::ids::{OperationId, SymbolId};
use grh_source::Span;
use serde::{Deserialize, Serialize};

/// The data type of a [`Value`]. Only `Logic` participates in
/// arithmetic/slice/mask operations; `Real` and `String` are opaque.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ValueType {
    /// A 4-state bit vector.
    Logic,
    /// An opaque real (floating point) scalar. Width is fixed at 1.
    Real,
    /// An opaque string scalar. Width is fixed at 1.
    Str,
}

/// The port role of a [`Value`]. Exactly one of these applies to any value;
/// `None` means the value is an ordinary internal wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortRole {
    /// Not a port.
    None,
    /// A module input.
    Input,
    /// A module output.
    Output,
    /// One leg of an inout port triple (§3 "Graph").
    Inout,
}

/// A named, typed bit-vector (or scalar) signal — an edge in the graph.
///
/// Invariant (§3): exactly one of `{is a module input/inout-in, has a
/// definingOp, is an unread placeholder}` holds for any `Value`; every
/// entry in `users` points to an operation whose operand at that index is
/// this value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Value {
    pub(crate) symbol: SymbolId,
    pub(crate) ty: ValueType,
    pub(crate) width: u32,
    pub(crate) is_signed: bool,
    pub(crate) port_role: PortRole,
    pub(crate) defining_op: Option<OperationId>,
    pub(crate) users: Vec<(OperationId, usize)>,
    /// Source location used for provenance-only comments at emission.
    pub src_loc: Option<Span>,
}

impl Value {
    /// Creates a new value with no users, no defining op, and no port role.
    pub(crate) fn new(symbol: SymbolId, ty: ValueType, width: u32, is_signed: bool) -> Self {
        assert!(width >= 1, "value width must be at least 1");
        Self {
            symbol,
            ty,
            width,
            is_signed,
            port_role: PortRole::None,
            defining_op: None,
            users: Vec::new(),
            src_loc: None,
        }
    }

    /// The value's interned symbol.
    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    /// The value's data type.
    pub fn ty(&self) -> ValueType {
        self.ty
    }

    /// The value's bit width (always 1 for `Real`/`Str`).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Whether the value carries two's-complement (signed) semantics.
    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    /// The value's port role.
    pub fn port_role(&self) -> PortRole {
        self.port_role
    }

    /// The operation that defines this value, if any.
    pub fn defining_op(&self) -> Option<OperationId> {
        self.defining_op
    }

    /// The multiset of `(operation, operand-index)` pairs consuming this value.
    pub fn users(&self) -> &[(OperationId, usize)] {
        &self.users
    }

    /// Whether this value currently has no users at all.
    pub fn is_unused(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_value_has_no_users_or_defining_op() {
        let v = Value::new(SymbolId::from_raw(0), ValueType::Logic, 8, false);
        assert_eq!(v.width(), 8);
        assert!(!v.is_signed());
        assert_eq!(v.port_role(), PortRole::None);
        assert!(v.defining_op().is_none());
        assert!(v.is_unused());
    }

    #[test]
    #[should_panic(expected = "width must be at least 1")]
    fn zero_width_panics() {
        Value::new(SymbolId::from_raw(0), ValueType::Logic, 0, false);
    }
}
