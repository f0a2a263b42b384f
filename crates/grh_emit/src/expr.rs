//! Expression rendering for combinational operations (§4.9 "Expression rendering").

use grh_ir::{Graph, Operation, OperationKind, ValueId};

use crate::tokens::{is_reduction, is_unary, operator_token};

/// The name a [`ValueId`] is referred to by in emitted text.
pub fn value_name(graph: &Graph, value: ValueId) -> String {
    graph
        .value(value)
        .map(|v| graph.resolve_symbol(v.symbol()).to_string())
        .unwrap_or_else(|| "<?>".to_string())
}

/// Renders `value` widened or truncated to `target_width`, per the `{{n{bit}},
/// operand}` concat template (sign-extended if `value` is signed, zero-extended
/// otherwise) or `operand[w-1:0]`/`operand[0]` truncation.
pub fn extend_or_truncate(graph: &Graph, value: ValueId, target_width: u32) -> String {
    let Some(v) = graph.value(value) else {
        return "<?>".to_string();
    };
    let name = value_name(graph, value);
    let width = v.width();
    if width == target_width {
        return name;
    }
    if width < target_width {
        let diff = target_width - width;
        let fill_bit = if v.is_signed() {
            format!("{name}[{}]", width - 1)
        } else {
            "1'b0".to_string()
        };
        let mut out = String::new();
        out.push_str("{{");
        out.push_str(&diff.to_string());
        out.push('{');
        out.push_str(&fill_bit);
        out.push_str("}}, ");
        out.push_str(&name);
        out.push('}');
        out
    } else if target_width == 1 {
        format!("{name}[0]")
    } else {
        format!("{name}[{}:0]", target_width - 1)
    }
}

/// Renders the right-hand side of the single `assign` statement that
/// realizes a pure combinational operation, or `None` for kinds that are
/// not rendered via this uniform per-op assign (state declarations, ports,
/// effect nodes, hierarchy, DPI, XMR).
pub fn render_rhs(graph: &Graph, op: &Operation, result_width: u32) -> Option<String> {
    let operands = op.operands();
    match op.kind() {
        OperationKind::Constant => op.attributes().get("constValue")?.as_str().map(str::to_string),
        OperationKind::Assign => {
            let v = *operands.first()?;
            Some(extend_or_truncate(graph, v, result_width))
        }
        OperationKind::Concat => {
            let parts: Vec<String> = operands.iter().map(|&v| value_name(graph, v)).collect();
            Some(format!("{{{}}}", parts.join(", ")))
        }
        OperationKind::Replicate => {
            let count = op.attributes().get("count")?.as_int()?;
            let v = *operands.first()?;
            Some(format!("{{{}{{{}}}}}", count, value_name(graph, v)))
        }
        OperationKind::SliceStatic => {
            let msb = op.attributes().get("msb")?.as_int()?;
            let lsb = op.attributes().get("lsb")?.as_int()?;
            let v = *operands.first()?;
            let name = value_name(graph, v);
            if msb == lsb {
                Some(format!("{name}[{msb}]"))
            } else {
                Some(format!("{name}[{msb}:{lsb}]"))
            }
        }
        OperationKind::SliceDynamic => {
            let base = *operands.first()?;
            let index = *operands.get(1)?;
            let width = op.attributes().get("width")?.as_int()?;
            let base_name = value_name(graph, base);
            let index_name = value_name(graph, index);
            if width == 1 {
                Some(format!("{base_name}[{index_name}]"))
            } else {
                Some(format!("{base_name}[{index_name} +: {width}]"))
            }
        }
        OperationKind::SliceArray => {
            let base = *operands.first()?;
            let index = *operands.get(1)?;
            Some(format!("{}[{}]", value_name(graph, base), value_name(graph, index)))
        }
        OperationKind::Mux => {
            let cond = *operands.first()?;
            let then_v = *operands.get(1)?;
            let else_v = *operands.get(2)?;
            Some(format!(
                "{} ? {} : {}",
                value_name(graph, cond),
                extend_or_truncate(graph, then_v, result_width),
                extend_or_truncate(graph, else_v, result_width)
            ))
        }
        kind if is_unary(kind) => {
            let v = *operands.first()?;
            let token = operator_token(kind)?;
            let rendered = value_name(graph, v);
            if is_reduction(kind) {
                Some(format!("({token}{rendered})"))
            } else {
                Some(format!("{token}{rendered}"))
            }
        }
        kind => {
            let token = operator_token(kind)?;
            let lhs = *operands.first()?;
            let rhs = *operands.get(1)?;
            Some(format!(
                "{} {} {}",
                extend_or_truncate(graph, lhs, result_width),
                token,
                extend_or_truncate(graph, rhs, result_width)
            ))
        }
    }
}
