//! Folds `kAssign(kAssign(x))` chains, collapses width-preserving
//! `kSliceStatic[0:w-1]`, and deduplicates identical `kConstant`s (§4.8).

use std::collections::HashMap;

use grh_ir::{Graph, OperationKind, ValueId};

use crate::pass::{Pass, PassContext, PassResult};

/// The redundant-elim pass.
pub struct RedundantElim;

/// Rewires every current user of `from` to instead consume `to`. Leaves
/// `from` with no users; dead-code-elim sweeps its now-orphaned producer.
fn replace_all_uses(graph: &mut Graph, from: ValueId, to: ValueId) -> bool {
    let users: Vec<_> = graph.value(from).map(|v| v.users().to_vec()).unwrap_or_default();
    if users.is_empty() || from == to {
        return false;
    }
    for (op, index) in users {
        let _ = graph.replace_operand(op, index, to);
    }
    true
}

impl Pass for RedundantElim {
    fn id(&self) -> &str {
        "redundant-elim"
    }

    fn name(&self) -> &str {
        "Redundant Node Elimination"
    }

    fn description(&self) -> &str {
        "folds assign chains, identity slices, and duplicate constants"
    }

    fn run(&self, ctx: &mut PassContext) -> PassResult {
        let mut changed = false;
        for (_, graph) in ctx.netlist.iter_mut() {
            changed |= fold_assign_chains(graph);
            changed |= collapse_identity_slices(graph);
            changed |= dedup_constants(graph);
        }
        PassResult { changed, failed: false }
    }
}

/// `kAssign(kAssign(x)) -> kAssign(x)`: rewires the outer assign to read
/// straight from `x`, bypassing the middle value entirely.
fn fold_assign_chains(graph: &mut Graph) -> bool {
    let mut changed = false;
    loop {
        let chain = graph
            .operations_in_order()
            .filter(|(_, op)| op.kind() == OperationKind::Assign)
            .find_map(|(id, op)| {
                let operand = *op.operands().first()?;
                let producer = graph.value(operand)?.defining_op()?;
                let producer_op = graph.operation(producer)?;
                if producer_op.kind() == OperationKind::Assign {
                    let inner_operand = *producer_op.operands().first()?;
                    Some((id, operand, inner_operand))
                } else {
                    None
                }
            });
        let Some((outer_assign, _middle_value, inner_operand)) = chain else {
            break;
        };
        if graph.replace_operand(outer_assign, 0, inner_operand).is_ok() {
            changed = true;
        } else {
            break;
        }
    }
    changed
}

/// `kSliceStatic[0:w-1]` of a `w`-bit operand is the identity; every
/// consumer can read the operand directly.
fn collapse_identity_slices(graph: &mut Graph) -> bool {
    let mut changed = false;
    let candidates: Vec<_> = graph
        .operations_in_order()
        .filter(|(_, op)| op.kind() == OperationKind::SliceStatic)
        .filter_map(|(id, op)| {
            let msb = op.attributes().get("msb")?.as_int()?;
            let lsb = op.attributes().get("lsb")?.as_int()?;
            let operand = *op.operands().first()?;
            let operand_width = graph.value(operand)?.width() as i64;
            if lsb == 0 && msb == operand_width - 1 {
                let result = *op.results().first()?;
                Some((id, result, operand))
            } else {
                None
            }
        })
        .collect();
    for (_, result, operand) in candidates {
        if replace_all_uses(graph, result, operand) {
            changed = true;
        }
    }
    changed
}

/// Identical `(width, signedness, constValue)` constants collapse onto the
/// first one seen; duplicates' users are rewired and the duplicate producer
/// is left for dead-code-elim.
fn dedup_constants(graph: &mut Graph) -> bool {
    let mut changed = false;
    let mut seen: HashMap<(u32, bool, String), ValueId> = HashMap::new();
    let constants: Vec<_> = graph
        .operations_in_order()
        .filter(|(_, op)| op.kind() == OperationKind::Constant)
        .filter_map(|(_, op)| {
            let result = *op.results().first()?;
            let text = op.attributes().get("constValue")?.as_str()?.to_string();
            Some((result, text))
        })
        .collect();
    for (result, text) in constants {
        let Some(value) = graph.value(result) else { continue };
        let key = (value.width(), value.is_signed(), text);
        if let Some(&canonical) = seen.get(&key) {
            if canonical != result && replace_all_uses(graph, result, canonical) {
                changed = true;
            }
        } else {
            seen.insert(key, result);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use grh_diagnostics::DiagnosticSink;
    use grh_ir::{ModuleSymbol, Netlist, ValueType};

    #[test]
    fn assign_chain_collapses_to_single_hop() {
        let mut g = Graph::new();
        let x_sym = g.intern("x");
        let mid_sym = g.intern("mid");
        let out_sym = g.intern("out");
        let x = g.create_value(x_sym, 8, false, ValueType::Logic).unwrap();
        let mid = g.create_value(mid_sym, 8, false, ValueType::Logic).unwrap();
        let out = g.create_value(out_sym, 8, false, ValueType::Logic).unwrap();

        let inner = g.create_operation(OperationKind::Assign, None).unwrap();
        g.add_operand(inner, x).unwrap();
        g.add_result(inner, mid).unwrap();

        let outer = g.create_operation(OperationKind::Assign, None).unwrap();
        g.add_operand(outer, mid).unwrap();
        g.add_result(outer, out).unwrap();

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = RedundantElim.run(&mut ctx);
        assert!(result.changed);
        let graph = netlist.get(&ModuleSymbol::new("top")).unwrap();
        let outer_op = graph.operation(outer).unwrap();
        assert_eq!(outer_op.operands()[0], x);
    }

    #[test]
    fn running_twice_is_idempotent() {
        let mut g = Graph::new();
        let a_sym = g.intern("a$const");
        let b_sym = g.intern("b$const");
        let a = g.create_value(a_sym, 8, false, ValueType::Logic).unwrap();
        let b = g.create_value(b_sym, 8, false, ValueType::Logic).unwrap();
        let op_a = g.create_operation(OperationKind::Constant, None).unwrap();
        g.operation_mut(op_a)
            .unwrap()
            .attributes_mut()
            .insert("constValue".to_string(), "8'h01".into());
        g.add_result(op_a, a).unwrap();
        let op_b = g.create_operation(OperationKind::Constant, None).unwrap();
        g.operation_mut(op_b)
            .unwrap()
            .attributes_mut()
            .insert("constValue".to_string(), "8'h01".into());
        g.add_result(op_b, b).unwrap();
        let consumer_sym = g.intern("sum");
        let sum = g.create_value(consumer_sym, 8, false, ValueType::Logic).unwrap();
        let add = g.create_operation(OperationKind::Add, None).unwrap();
        g.add_operand(add, a).unwrap();
        g.add_operand(add, b).unwrap();
        g.add_result(add, sum).unwrap();

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let first = {
            let mut ctx = PassContext {
                netlist: &mut netlist,
                sink: &sink,
            };
            RedundantElim.run(&mut ctx)
        };
        assert!(first.changed);
        let second = {
            let mut ctx = PassContext {
                netlist: &mut netlist,
                sink: &sink,
            };
            RedundantElim.run(&mut ctx)
        };
        assert!(!second.changed);
    }
}
