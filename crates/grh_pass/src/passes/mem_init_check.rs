//! Validates `kMemory.init*` attribute vectors (§4.8).

use grh_ir::OperationKind;
use grh_source::Span;

use crate::errors;
use crate::pass::{Pass, PassContext, PassResult};

const VALID_INIT_KINDS: &[&str] = &["literal", "random", "readmemh", "readmemb"];

/// The mem-init-check pass.
pub struct MemInitCheck;

impl Pass for MemInitCheck {
    fn id(&self) -> &str {
        "mem-init-check"
    }

    fn name(&self) -> &str {
        "Memory Initializer Check"
    }

    fn description(&self) -> &str {
        "validates memory init* attribute vectors for shape and range"
    }

    fn run(&self, ctx: &mut PassContext) -> PassResult {
        let mut failed = false;
        for (sym, graph) in ctx.netlist.iter_in_emission_order() {
            for (_, op) in graph.operations_in_order() {
                if op.kind() != OperationKind::Memory {
                    continue;
                }
                let row = op.attributes().get("row").and_then(|v| v.as_int());
                let Some(row) = row else {
                    continue;
                };

                if let Some(kind) = op.attributes().get("initKind").and_then(|v| v.as_str()) {
                    if !VALID_INIT_KINDS.contains(&kind) {
                        ctx.sink.emit(errors::bad_memory_init(
                            sym.as_str(),
                            &format!("unknown initKind `{kind}`"),
                            Span::DUMMY,
                        ));
                        failed = true;
                    }
                }

                let addresses = op.attributes().get("initAddress").and_then(|v| v.as_vec_int());
                let values = op.attributes().get("initValue").and_then(|v| v.as_vec_int());
                if let (Some(addresses), Some(values)) = (addresses, values) {
                    if addresses.len() != values.len() {
                        ctx.sink.emit(errors::bad_memory_init(
                            sym.as_str(),
                            "initAddress and initValue have different lengths",
                            Span::DUMMY,
                        ));
                        failed = true;
                    }
                }
                if let Some(addresses) = addresses {
                    if addresses.iter().any(|&a| a < 0 || a >= row) {
                        ctx.sink.emit(errors::bad_memory_init(
                            sym.as_str(),
                            "initAddress entry out of range for the declared row count",
                            Span::DUMMY,
                        ));
                        failed = true;
                    }
                }
            }
        }
        PassResult {
            changed: false,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grh_diagnostics::DiagnosticSink;
    use grh_ir::{AttributeValue, Graph, ModuleSymbol, Netlist};

    fn memory_op(graph: &mut Graph) -> grh_ir::OperationId {
        graph.create_operation(OperationKind::Memory, None).unwrap()
    }

    #[test]
    fn valid_memory_passes() {
        let mut g = Graph::new();
        let op = memory_op(&mut g);
        let attrs = g.operation_mut(op).unwrap().attributes_mut();
        attrs.insert("width".to_string(), AttributeValue::Int(8));
        attrs.insert("row".to_string(), AttributeValue::Int(32));
        attrs.insert("initKind".to_string(), AttributeValue::Str("literal".to_string()));
        attrs.insert("initAddress".to_string(), AttributeValue::VecInt(vec![0, 1]));
        attrs.insert("initValue".to_string(), AttributeValue::VecInt(vec![5, 6]));

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = MemInitCheck.run(&mut ctx);
        assert!(!result.failed);
        assert!(!sink.has_errors());
    }

    #[test]
    fn out_of_range_address_fails() {
        let mut g = Graph::new();
        let op = memory_op(&mut g);
        let attrs = g.operation_mut(op).unwrap().attributes_mut();
        attrs.insert("row".to_string(), AttributeValue::Int(4));
        attrs.insert("initAddress".to_string(), AttributeValue::VecInt(vec![10]));
        attrs.insert("initValue".to_string(), AttributeValue::VecInt(vec![1]));

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = MemInitCheck.run(&mut ctx);
        assert!(result.failed);
        assert!(sink.has_errors());
    }

    #[test]
    fn unknown_init_kind_fails() {
        let mut g = Graph::new();
        let op = memory_op(&mut g);
        let attrs = g.operation_mut(op).unwrap().attributes_mut();
        attrs.insert("row".to_string(), AttributeValue::Int(4));
        attrs.insert("initKind".to_string(), AttributeValue::Str("bogus".to_string()));

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = MemInitCheck.run(&mut ctx);
        assert!(result.failed);
    }
}
