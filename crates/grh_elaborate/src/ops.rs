//! Small GRH-construction helpers shared by the RHS converter, the
//! write-back memo finalizer, and procedural lowering.

use grh_ir::{AttributeValue, Graph, OperationKind, ValueId, ValueType};

/// Creates an anonymous `Logic` value of the given width/signedness, named
/// `__<prefix>_<n>` for the smallest `n` not already taken in this graph.
pub fn fresh_value(graph: &mut Graph, prefix: &str, width: u32, is_signed: bool) -> ValueId {
    let mut n = 0u32;
    loop {
        let symbol = graph.intern(&format!("__{prefix}_{n}"));
        match graph.create_value(symbol, width, is_signed, ValueType::Logic) {
            Ok(id) => return id,
            Err(_) => n += 1,
        }
    }
}

/// Emits a `Constant` operation producing a fresh value holding `text`
/// (verbatim literal text, e.g. `"8'h0"` or `"0"`), and returns that value.
pub fn emit_constant(graph: &mut Graph, width: u32, is_signed: bool, text: &str) -> ValueId {
    let result = fresh_value(graph, "const", width, is_signed);
    let op = graph
        .create_operation(OperationKind::Constant, None)
        .expect("anonymous operation never collides");
    graph
        .add_result(op, result)
        .expect("fresh value has no defining op yet");
    graph
        .operation_mut(op)
        .expect("operation was just created")
        .attributes_mut()
        .insert("constValue".to_string(), AttributeValue::Str(text.to_string()));
    result
}

/// Emits an all-zero constant of the given width, used to zero-fill gaps in
/// the write-back memo finalizer.
pub fn emit_zero(graph: &mut Graph, width: u32) -> ValueId {
    emit_constant(graph, width, false, &format!("{width}'d0"))
}

/// Emits a `Concat` combining `parts` MSB-first, or returns the lone part
/// unchanged if there is exactly one (per §4.3/§4.4's "unary concat collapses").
pub fn emit_concat(graph: &mut Graph, parts: Vec<ValueId>) -> ValueId {
    if parts.len() == 1 {
        return parts[0];
    }
    let total_width: u32 = parts
        .iter()
        .map(|v| graph.value(*v).expect("operand value must exist").width())
        .sum();
    let result = fresh_value(graph, "concat", total_width, false);
    let op = graph
        .create_operation(OperationKind::Concat, None)
        .expect("anonymous operation never collides");
    for p in parts {
        graph.add_operand(op, p).expect("operand is from this graph");
    }
    graph.add_result(op, result).expect("fresh value has no defining op yet");
    result
}

/// Emits a `SliceStatic` selecting `source[msb:lsb]`, used to carve the
/// preserved part of a prior value when splicing in a partial write.
pub fn emit_slice_static(graph: &mut Graph, source: ValueId, msb: u32, lsb: u32) -> ValueId {
    let width = msb - lsb + 1;
    let result = fresh_value(graph, "slice", width, false);
    let Ok(op) = graph.create_operation(OperationKind::SliceStatic, None) else {
        return result;
    };
    let _ = graph.add_operand(op, source);
    let _ = graph.add_result(op, result);
    if let Some(opm) = graph.operation_mut(op) {
        opm.attributes_mut().insert("msb".to_string(), AttributeValue::Int(msb as i64));
        opm.attributes_mut().insert("lsb".to_string(), AttributeValue::Int(lsb as i64));
    }
    result
}

/// Emits a one-bit `LogicAnd` of `a` and `b`.
pub fn emit_and(graph: &mut Graph, a: ValueId, b: ValueId) -> ValueId {
    let result = fresh_value(graph, "and", 1, false);
    let Ok(op) = graph.create_operation(OperationKind::LogicAnd, None) else {
        return result;
    };
    let _ = graph.add_operand(op, a);
    let _ = graph.add_operand(op, b);
    let _ = graph.add_result(op, result);
    result
}

/// Emits a one-bit `LogicNot` of `a`.
pub fn emit_not(graph: &mut Graph, a: ValueId) -> ValueId {
    let result = fresh_value(graph, "not", 1, false);
    let Ok(op) = graph.create_operation(OperationKind::LogicNot, None) else {
        return result;
    };
    let _ = graph.add_operand(op, a);
    let _ = graph.add_result(op, result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_constant_creates_value_with_attribute() {
        let mut g = Graph::new();
        let v = emit_constant(&mut g, 8, false, "8'hFF");
        assert_eq!(g.value(v).unwrap().width(), 8);
    }

    #[test]
    fn emit_concat_single_part_collapses() {
        let mut g = Graph::new();
        let v = emit_zero(&mut g, 4);
        let c = emit_concat(&mut g, vec![v]);
        assert_eq!(c, v);
    }

    #[test]
    fn emit_concat_sums_widths() {
        let mut g = Graph::new();
        let a = emit_zero(&mut g, 4);
        let b = emit_zero(&mut g, 4);
        let c = emit_concat(&mut g, vec![a, b]);
        assert_eq!(g.value(c).unwrap().width(), 8);
    }
}
