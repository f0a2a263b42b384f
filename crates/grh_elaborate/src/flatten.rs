//! Type flattener (§4.2): reduces an [`AstType`] to a total width, signedness,
//! and an ordered list of leaf bit-ranges.

use grh_ast::AstType;
use grh_diagnostics::DiagnosticSink;
use grh_source::Span;

use crate::errors;

/// One leaf bit-range within a flattened type, MSB-first.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FlatField {
    /// A dotted/indexed path describing this leaf's origin, e.g. `"sig.parts_hi[3][0]"`.
    pub path: String,
    /// Most significant bit of this field within the flattened whole.
    pub msb: u32,
    /// Least significant bit of this field within the flattened whole.
    pub lsb: u32,
    /// Whether this field carries signed semantics.
    pub is_signed: bool,
}

/// The result of flattening an [`AstType`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FlatType {
    /// Total bit width, always at least 1.
    pub total_width: u32,
    /// Whether the overall type is signed.
    pub is_signed: bool,
    /// Leaf bit-ranges, MSB-first, covering every bit exactly once.
    pub fields: Vec<FlatField>,
}

/// Flattens `ty`, rooted at `origin` for path construction and diagnostics.
pub fn flatten_type(ty: &AstType, origin: &str, span: Span, sink: &DiagnosticSink) -> FlatType {
    let mut fields = Vec::new();
    let mut cursor = 0u32;
    flatten_into(ty, origin, span, sink, &mut cursor, &mut fields);
    let total_width = cursor.max(1);
    if cursor == 0 {
        sink.emit(errors::zero_width_placeholder(span));
        fields.push(FlatField {
            path: origin.to_string(),
            msb: 0,
            lsb: 0,
            is_signed: false,
        });
    }
    // fields were appended LSB-first as we recursed depth-first in
    // declaration order; reverse to produce the MSB-first contract.
    fields.reverse();
    relabel_ranges(&mut fields, total_width);
    let is_signed = top_level_signed(ty);
    FlatType {
        total_width,
        is_signed,
        fields,
    }
}

fn top_level_signed(ty: &AstType) -> bool {
    matches!(ty, AstType::Logic { signed: true, .. })
}

fn relabel_ranges(fields: &mut [FlatField], total_width: u32) {
    let mut msb = total_width.saturating_sub(1);
    for field in fields.iter_mut() {
        let width = field.msb - field.lsb + 1;
        field.msb = msb;
        field.lsb = msb + 1 - width;
        msb = field.lsb.wrapping_sub(1);
    }
}

fn flatten_into(
    ty: &AstType,
    path: &str,
    span: Span,
    sink: &DiagnosticSink,
    cursor: &mut u32,
    fields: &mut Vec<FlatField>,
) {
    match ty {
        AstType::Logic { width, signed } => {
            let w = *width;
            if w > 0 {
                fields.push(FlatField {
                    path: path.to_string(),
                    msb: w - 1,
                    lsb: 0,
                    is_signed: *signed,
                });
                *cursor += w;
            }
        }
        AstType::Real | AstType::Str => {
            fields.push(FlatField {
                path: path.to_string(),
                msb: 0,
                lsb: 0,
                is_signed: false,
            });
            *cursor += 1;
        }
        AstType::PackedArray { len, element } | AstType::UnpackedArray { len, element } => {
            for i in (0..*len).rev() {
                let elem_path = format!("{path}[{i}]");
                flatten_into(element, &elem_path, span, sink, cursor, fields);
            }
        }
        AstType::Struct { members, .. } | AstType::Union { members, .. } => {
            for (name, member_ty) in members.iter().rev() {
                let member_path = format!("{path}.{}", member_name(name));
                flatten_into(member_ty, &member_path, span, sink, cursor, fields);
            }
        }
    }
}

fn member_name(ident: &grh_common::Ident) -> String {
    format!("field{}", ident.as_raw())
}
