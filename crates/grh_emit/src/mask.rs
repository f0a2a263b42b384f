//! Literal bit extraction for write-port masks (§4.9 "Sequential blocks").

/// Parses a `constValue` literal (`8'hFF`, `4'b1010`, `3'd5`, or an unsized
/// decimal) into its bits, LSB first, padded/truncated to `width`.
pub fn parse_literal_bits(text: &str, width: u32) -> Option<Vec<bool>> {
    let (size_part, rest) = match text.split_once('\'') {
        Some((size, rest)) => (Some(size), rest),
        None => (None, text),
    };
    let _ = size_part;
    let rest = rest.trim_start_matches(['s', 'S']);
    let (radix, digits) = match rest.chars().next()? {
        'b' | 'B' => (2u32, &rest[1..]),
        'o' | 'O' => (8u32, &rest[1..]),
        'h' | 'H' => (16u32, &rest[1..]),
        'd' | 'D' => (10u32, &rest[1..]),
        _ => (10u32, rest),
    };
    let digits = digits.replace('_', "");
    let value = u128::from_str_radix(&digits, radix).ok()?;
    Some((0..width).map(|i| (value >> i) & 1 == 1).collect())
}

/// The mask shape an emitted write-port body branches on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MaskShape {
    /// Every bit is statically zero — the write is elided entirely.
    AllZero,
    /// Every bit is statically one — a single full-width assign suffices.
    AllOnes,
    /// A constant but mixed pattern — per-bit assigns for the set bits.
    ConstantMixed,
    /// Not a compile-time constant — the dynamic if/for fallback.
    Dynamic,
}

/// Classifies a mask's shape from its (possibly absent) literal bits.
pub fn classify_mask(bits: Option<&[bool]>) -> MaskShape {
    match bits {
        None => MaskShape::Dynamic,
        Some(bits) if bits.iter().all(|&b| !b) => MaskShape::AllZero,
        Some(bits) if bits.iter().all(|&b| b) => MaskShape::AllOnes,
        Some(_) => MaskShape::ConstantMixed,
    }
}
