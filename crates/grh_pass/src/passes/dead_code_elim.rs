//! Removes operations whose results are entirely unused, transitively,
//! excluding effectful ops and state declarations (§4.8).

use grh_ir::OperationKind;

use crate::pass::{Pass, PassContext, PassResult};

/// Whether an operation of this kind must never be removed even with no
/// result consumers (it has a side effect, or declares persistent state, or
/// is one half of a state read/write port pair).
fn is_effectful(kind: OperationKind) -> bool {
    matches!(
        kind,
        OperationKind::Display
            | OperationKind::Assert
            | OperationKind::SystemTask
            | OperationKind::SystemFunction
            | OperationKind::DpicImport
            | OperationKind::DpicCall
            | OperationKind::RegisterWritePort
            | OperationKind::RegisterReadPort
            | OperationKind::LatchWritePort
            | OperationKind::LatchReadPort
            | OperationKind::MemoryWritePort
            | OperationKind::MemoryReadPort
            | OperationKind::Memory
            | OperationKind::Register
            | OperationKind::Latch
            | OperationKind::Instance
            | OperationKind::Blackbox
    )
}

/// The dead-code-elim pass.
pub struct DeadCodeElim;

impl Pass for DeadCodeElim {
    fn id(&self) -> &str {
        "dead-code-elim"
    }

    fn name(&self) -> &str {
        "Dead Code Elimination"
    }

    fn description(&self) -> &str {
        "removes operations whose results have no users and no side effects"
    }

    fn run(&self, ctx: &mut PassContext) -> PassResult {
        let mut changed = false;
        for (_, graph) in ctx.netlist.iter_mut() {
            loop {
                let dead: Vec<_> = graph
                    .operations_in_order()
                    .filter(|(_, op)| {
                        !is_effectful(op.kind())
                            && op.results().iter().all(|r| {
                                graph
                                    .value(*r)
                                    .map(|v| v.is_unused() && v.port_role() == grh_ir::PortRole::None)
                                    .unwrap_or(true)
                            })
                    })
                    .map(|(id, _)| id)
                    .collect();
                if dead.is_empty() {
                    break;
                }
                for id in dead {
                    if graph.erase_op(id) {
                        changed = true;
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

    #[test]
    fn removes_unused_add_but_keeps_output_port() {
        let mut g = Graph::new();
        let a_sym = g.intern("a");
        let b_sym = g.intern("b");
        let out_sym = g.intern("out");
        let a = g.create_value(a_sym, 8, false, ValueType::Logic).unwrap();
        let b = g.create_value(b_sym, 8, false, ValueType::Logic).unwrap();
        let unused = g.create_value(out_sym, 8, false, ValueType::Logic).unwrap();
        let op = g.create_operation(OperationKind::Add, None).unwrap();
        g.add_operand(op, a).unwrap();
        g.add_operand(op, b).unwrap();
        g.add_result(op, unused).unwrap();

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = DeadCodeElim.run(&mut ctx);
        assert!(result.changed);
        let graph = netlist.get(&ModuleSymbol::new("top")).unwrap();
        assert!(graph.operation(op).is_none());
    }

    #[test]
    fn keeps_effectful_ops_even_if_unused() {
        let mut g = Graph::new();
        let a_sym = g.intern("a");
        let a = g.create_value(a_sym, 1, false, ValueType::Logic).unwrap();
        let op = g.create_operation(OperationKind::Assert, None).unwrap();
        g.add_operand(op, a).unwrap();

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = DeadCodeElim.run(&mut ctx);
        assert!(!result.changed);
        let graph = netlist.get(&ModuleSymbol::new("top")).unwrap();
        assert!(graph.operation(op).is_some());
    }
}
