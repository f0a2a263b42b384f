//! Replaces an output port bound to `kAssign(kConstant)` with the constant
//! directly, when the constant has no other users (§4.8).

use grh_ir::{OperationKind, PortRole};

use crate::pass::{Pass, PassContext, PassResult};

/// The const-inline pass.
pub struct ConstInline;

impl Pass for ConstInline {
    fn id(&self) -> &str {
        "const-inline"
    }

    fn name(&self) -> &str {
        "Constant Inlining"
    }

    fn description(&self) -> &str {
        "binds output ports directly to constants through single-use kAssign"
    }

    fn run(&self, ctx: &mut PassContext) -> PassResult {
        let mut changed = false;
        for (_, graph) in ctx.netlist.iter_mut() {
            let candidates: Vec<_> = graph
                .operations_in_order()
                .filter(|(_, op)| op.kind() == OperationKind::Assign)
                .filter_map(|(id, op)| {
                    let operand = *op.operands().first()?;
                    let result = *op.results().first()?;
                    Some((id, operand, result))
                })
                .filter(|(_, operand, result)| {
                    let operand_is_const = graph
                        .value(*operand)
                        .and_then(|v| v.defining_op())
                        .and_then(|op_id| graph.operation(op_id))
                        .map(|op| op.kind() == OperationKind::Constant)
                        .unwrap_or(false);
                    let result_is_output_with_no_other_users = graph
                        .value(*result)
                        .map(|v| v.port_role() == PortRole::Output)
                        .unwrap_or(false);
                    operand_is_const && result_is_output_with_no_other_users
                })
                .collect();

            for (assign_op, constant_value, output_value) in candidates {
                let single_use = graph
                    .value(constant_value)
                    .map(|v| v.users().len() == 1)
                    .unwrap_or(false);
                let constant_is_port = graph
                    .value(constant_value)
                    .map(|v| v.port_role() != PortRole::None)
                    .unwrap_or(true);

                if single_use && !constant_is_port {
                    let const_op = graph.value(constant_value).and_then(|v| v.defining_op());
                    if let Some(const_op) = const_op {
                        if graph.replace_result(const_op, 0, output_value).is_ok() {
                            graph.erase_op(assign_op);
                            changed = true;
                        }
                    }
                } else {
                    let const_op = graph.value(constant_value).and_then(|v| v.defining_op());
                    if let Some(const_op) = const_op {
                        if let Some(text) = graph
                            .operation(const_op)
                            .and_then(|op| op.attributes().get("constValue"))
                            .and_then(|v| v.as_str())
                            .map(str::to_string)
                        {
                            let new_const = graph.create_operation(OperationKind::Constant, None);
                            if let Ok(new_const) = new_const {
                                graph
                                    .operation_mut(new_const)
                                    .expect("just created")
                                    .attributes_mut()
                                    .insert("constValue".to_string(), text.into());
                                if graph.replace_result(new_const, 0, output_value).is_ok() {
                                    graph.erase_op(assign_op);
                                    changed = true;
                                }
                            }
                        }
                    }
                }
            }
        }
        PassResult { changed, failed: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grh_diagnostics::DiagnosticSink;
    use grh_ir::{Graph, ModuleSymbol, Netlist, ValueType};

    fn build_simple_const_assign() -> (Graph, grh_ir::ValueId, grh_ir::OperationId) {
        let mut g = Graph::new();
        let const_sym = g.intern("$const0");
        let out_sym = g.intern("out");
        let const_val = g.create_value(const_sym, 8, false, ValueType::Logic).unwrap();
        let out_val = g.create_value(out_sym, 8, false, ValueType::Logic).unwrap();
        g.add_output_port(out_sym, out_val).unwrap();

        let const_op = g.create_operation(OperationKind::Constant, None).unwrap();
        g.operation_mut(const_op)
            .unwrap()
            .attributes_mut()
            .insert("constValue".to_string(), "8'hFF".into());
        g.add_result(const_op, const_val).unwrap();

        let assign_op = g.create_operation(OperationKind::Assign, None).unwrap();
        g.add_operand(assign_op, const_val).unwrap();
        g.add_result(assign_op, out_val).unwrap();
        (g, out_val, assign_op)
    }

    #[test]
    fn single_use_constant_steals_result_slot() {
        let (g, out_val, assign_op) = build_simple_const_assign();
        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = ConstInline.run(&mut ctx);
        assert!(result.changed);
        let graph = netlist.get(&ModuleSymbol::new("top")).unwrap();
        assert!(graph.operation(assign_op).is_none());
        assert!(graph.value(out_val).unwrap().defining_op().is_some());
    }

    #[test]
    fn non_output_assign_is_untouched() {
        let mut g = Graph::new();
        let const_sym = g.intern("$const0");
        let wire_sym = g.intern("w");
        let const_val = g.create_value(const_sym, 8, false, ValueType::Logic).unwrap();
        let wire_val = g.create_value(wire_sym, 8, false, ValueType::Logic).unwrap();
        let const_op = g.create_operation(OperationKind::Constant, None).unwrap();
        g.operation_mut(const_op)
            .unwrap()
            .attributes_mut()
            .insert("constValue".to_string(), "8'h00".into());
        g.add_result(const_op, const_val).unwrap();
        let assign_op = g.create_operation(OperationKind::Assign, None).unwrap();
        g.add_operand(assign_op, const_val).unwrap();
        g.add_result(assign_op, wire_val).unwrap();

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = ConstInline.run(&mut ctx);
        assert!(!result.changed);
    }
}
