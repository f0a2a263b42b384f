//! Already-resolved type nodes handed to the elaborator.
//!
//! Unlike a front-end parser's `TypeSpec`, every [`AstType`] here is fully
//! bound: no typedef names, no unresolved parameter-dependent widths. The
//! type flattener consumes these directly.

use grh_common::Ident;
use serde::{Deserialize, Serialize};

/// A resolved SystemVerilog type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AstType {
    /// A 4-state bit vector of `width` bits.
    Logic {
        /// Bit width, at least 1.
        width: u32,
        /// Whether the type carries two's-complement semantics.
        signed: bool,
    },
    /// A double-precision real scalar.
    Real,
    /// A string scalar.
    Str,
    /// A packed array of `len` elements of `element`, e.g. `logic [1:0][7:0]`.
    PackedArray {
        /// The number of elements.
        len: u32,
        /// The element type.
        element: Box<AstType>,
    },
    /// An unpacked array of `len` elements of `element`.
    UnpackedArray {
        /// The number of elements.
        len: u32,
        /// The element type.
        element: Box<AstType>,
    },
    /// A packed or unpacked struct, members in declaration order.
    Struct {
        /// Whether the struct is `packed`.
        packed: bool,
        /// Member name/type pairs, in declaration order.
        members: Vec<(Ident, AstType)>,
    },
    /// A packed union; members share the same bit-range.
    Union {
        /// Whether the union is `packed`.
        packed: bool,
        /// Member name/type pairs, in declaration order.
        members: Vec<(Ident, AstType)>,
    },
}

impl AstType {
    /// A 1-bit unsigned logic scalar, the default type for an undeclared net.
    pub fn logic1() -> Self {
        AstType::Logic {
            width: 1,
            signed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logic1_is_one_bit_unsigned() {
        match AstType::logic1() {
            AstType::Logic { width, signed } => {
                assert_eq!(width, 1);
                assert!(!signed);
            }
            _ => panic!("expected Logic"),
        }
    }

    #[test]
    fn serde_roundtrip_struct_type() {
        let ty = AstType::Struct {
            packed: true,
            members: vec![(Ident::from_raw(1), AstType::logic1())],
        };
        let json = serde_json::to_string(&ty).unwrap();
        let back: AstType = serde_json::from_str(&json).unwrap();
        match back {
            AstType::Struct { packed, members } => {
                assert!(packed);
                assert_eq!(members.len(), 1);
            }
            _ => panic!("expected Struct"),
        }
    }
}
