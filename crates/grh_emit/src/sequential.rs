//! Sequential (`always @(...)`) and latch (`always_latch`) block rendering
//! for state write ports (§4.9 "Sequential blocks", "Latches", "Memory ports").

use grh_ir::{Graph, Operation, OperationId, OperationKind, ValueId};

use crate::expr::{extend_or_truncate, value_name};
use crate::mask::{classify_mask, parse_literal_bits, MaskShape};

/// The constant-one sentinel an `updateCond`/mask operand may resolve to.
fn literal_bits_of(graph: &Graph, value: ValueId, width: u32) -> Option<Vec<bool>> {
    let op = graph.value(value)?.defining_op()?;
    let op = graph.operation(op)?;
    if op.kind() != OperationKind::Constant {
        return None;
    }
    let text = op.attributes().get("constValue")?.as_str()?;
    parse_literal_bits(text, width)
}

/// Whether `value` is a one-bit constant-one, i.e. an always-taken `updateCond`.
fn is_constant_one(graph: &Graph, value: ValueId) -> bool {
    literal_bits_of(graph, value, 1)
        .map(|bits| bits.first().copied().unwrap_or(false))
        .unwrap_or(false)
}

/// Builds the `edge signal or edge signal ...` sensitivity text from the
/// `eventEdge` attribute and the trailing event operands of a write port.
fn sensitivity_key(graph: &Graph, op: &Operation, event_start: usize) -> String {
    let edges = op
        .attributes()
        .get("eventEdge")
        .and_then(|a| a.as_vec_str())
        .unwrap_or(&[]);
    let events = &op.operands()[event_start.min(op.operands().len())..];
    edges
        .iter()
        .zip(events.iter())
        .map(|(edge, &v)| format!("{edge} {}", value_name(graph, v)))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// A group of write ports sharing an identical sensitivity list, in
/// first-occurrence order.
pub struct SeqGroup {
    /// The rendered sensitivity text, e.g. `"posedge clk or negedge rst_n"`.
    pub sensitivity: String,
    /// The write port operations firing on this sensitivity, in insertion order.
    pub ops: Vec<OperationId>,
}

/// Groups every `RegisterWritePort`/`MemoryWritePort` in `graph` by shared
/// sensitivity, preserving first-occurrence order of both groups and
/// members (§5 "Operations within a graph iterate in insertion order").
pub fn plan_sequential_groups(graph: &Graph) -> Vec<SeqGroup> {
    let mut groups: Vec<SeqGroup> = Vec::new();
    for (id, op) in graph.operations_in_order() {
        let event_start = match op.kind() {
            OperationKind::RegisterWritePort => 3,
            OperationKind::MemoryWritePort => 4,
            _ => continue,
        };
        let key = sensitivity_key(graph, op, event_start);
        match groups.iter_mut().find(|g| g.sensitivity == key) {
            Some(g) => g.ops.push(id),
            None => groups.push(SeqGroup { sensitivity: key, ops: vec![id] }),
        }
    }
    groups
}

/// Renders the body lines for one write port's mask branch, given the full
/// target/next text, per-bit target/next accessors, and the assign operator
/// (`<=` for clocked/latch writes, `=` for combinational degeneration).
fn mask_branch_lines(
    target_full: &str,
    next_full: &str,
    width: u32,
    mask_bits: Option<&[bool]>,
    assign_op: &str,
) -> Vec<String> {
    match classify_mask(mask_bits) {
        MaskShape::AllZero => Vec::new(),
        MaskShape::AllOnes => vec![format!("{target_full} {assign_op} {next_full};")],
        MaskShape::ConstantMixed => {
            let bits = mask_bits.unwrap();
            bits.iter()
                .enumerate()
                .filter(|(_, &set)| set)
                .map(|(i, _)| format!("{target_full}[{i}] {assign_op} {next_full}[{i}];"))
                .collect()
        }
        MaskShape::Dynamic => {
            let mask_name = "mask";
            vec![
                format!("if ({mask_name} == {{{width}{{1'b1}}}}) {target_full} {assign_op} {next_full};"),
                "else begin".to_string(),
                "  integer i;".to_string(),
                format!("  for (i=0;i<{width};i=i+1) if ({mask_name}[i]) {target_full}[i] {assign_op} {next_full}[i];"),
                "end".to_string(),
            ]
        }
    }
}

/// Renders a single `RegisterWritePort`'s body lines (operands: `updateCond,
/// nextValue, mask, event*`; `regSymbol` names the target register directly).
pub fn render_register_write(graph: &Graph, op: &Operation) -> Vec<String> {
    let operands = op.operands();
    let update_cond = operands[0];
    let next_value = operands[1];
    let mask = operands[2];
    let reg_name = op
        .attributes()
        .get("regSymbol")
        .and_then(|a| a.as_str())
        .unwrap_or("<?>")
        .to_string();
    let width = graph.value(next_value).map(|v| v.width()).unwrap_or(1);
    let next_full = extend_or_truncate(graph, next_value, width);
    let mask_bits = literal_bits_of(graph, mask, width);
    let body = mask_branch_lines(&reg_name, &next_full, width, mask_bits.as_deref(), "<=");
    wrap_in_update_cond(graph, update_cond, body)
}

/// Renders a single `MemoryWritePort`'s body lines (operands: `updateCond,
/// addr, data, mask, event*`; `memSymbol` names the target memory directly).
pub fn render_memory_write(graph: &Graph, op: &Operation) -> Vec<String> {
    let operands = op.operands();
    let update_cond = operands[0];
    let addr = operands[1];
    let data = operands[2];
    let mask = operands[3];
    let mem_name = op
        .attributes()
        .get("memSymbol")
        .and_then(|a| a.as_str())
        .unwrap_or("<?>")
        .to_string();
    let target_full = format!("{mem_name}[{}]", value_name(graph, addr));
    let width = graph.value(data).map(|v| v.width()).unwrap_or(1);
    let next_full = extend_or_truncate(graph, data, width);
    let mask_bits = literal_bits_of(graph, mask, width);
    let body = mask_branch_lines(&target_full, &next_full, width, mask_bits.as_deref(), "<=");
    wrap_in_update_cond(graph, update_cond, body)
}

/// Renders a single `LatchWritePort`'s body (operands: `updateCond,
/// nextValue, mask`, no events), using blocking assignment.
///
/// Returns `(degenerates_to_comb, lines)`: when the write is unconditional
/// and the mask is all-ones, the latch degenerates to a combinational
/// `always_comb` per §4.9 "Latches".
pub fn render_latch_write(graph: &Graph, op: &Operation) -> (bool, Vec<String>) {
    let operands = op.operands();
    let update_cond = operands[0];
    let next_value = operands[1];
    let mask = operands[2];
    let reg_name = op
        .attributes()
        .get("regSymbol")
        .and_then(|a| a.as_str())
        .unwrap_or("<?>")
        .to_string();
    let width = graph.value(next_value).map(|v| v.width()).unwrap_or(1);
    let next_full = extend_or_truncate(graph, next_value, width);
    let mask_bits = literal_bits_of(graph, mask, width);
    let degenerate = is_constant_one(graph, update_cond)
        && classify_mask(mask_bits.as_deref()) == MaskShape::AllOnes;
    let body = mask_branch_lines(&reg_name, &next_full, width, mask_bits.as_deref(), "=");
    (degenerate, wrap_in_update_cond(graph, update_cond, body))
}

fn wrap_in_update_cond(graph: &Graph, update_cond: ValueId, body: Vec<String>) -> Vec<String> {
    if body.is_empty() {
        return body;
    }
    if is_constant_one(graph, update_cond) {
        return body;
    }
    let cond_name = value_name(graph, update_cond);
    let mut out = vec![format!("if ({cond_name}) begin")];
    out.extend(body.into_iter().map(|l| format!("  {l}")));
    out.push("end".to_string());
    out
}
