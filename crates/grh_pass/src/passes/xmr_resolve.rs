//! Replaces every `kXMRRead`/`kXMRWrite` with a concrete edge, adding
//! cross-module ports as required (§4.8). Unresolved references remain
//! in place and are reported as errors, which the pass manager's
//! `stopOnError` / has-errors check then treats as fatal (§4.8, §8).

use grh_diagnostics::DiagnosticSink;
use grh_ir::{ModuleSymbol, Netlist, OperationId, OperationKind, ValueType};
use grh_source::Span;

use crate::errors;
use crate::pass::{Pass, PassContext, PassResult};

/// The xmr-resolve pass.
pub struct XmrResolve;

impl Pass for XmrResolve {
    fn id(&self) -> &str {
        "xmr-resolve"
    }

    fn name(&self) -> &str {
        "Hierarchical Reference Resolution"
    }

    fn description(&self) -> &str {
        "replaces XMRRead/XMRWrite placeholders with concrete cross-module edges"
    }

    fn run(&self, ctx: &mut PassContext) -> PassResult {
        let mut changed = false;

        let mut pending: Vec<(ModuleSymbol, OperationId, OperationKind, String)> = Vec::new();
        for (sym, graph) in ctx.netlist.iter_in_emission_order() {
            for (id, op) in graph.operations_in_order() {
                if op.kind().is_transient_xmr() {
                    if let Some(path) = op.attributes().get("path").and_then(|v| v.as_str()) {
                        pending.push((sym.clone(), id, op.kind(), path.to_string()));
                    }
                }
            }
        }

        for (owner, xmr_op, kind, path) in pending {
            let resolved = match kind {
                OperationKind::XMRRead => resolve_read(ctx.netlist, &owner, xmr_op, &path),
                OperationKind::XMRWrite => resolve_write(ctx.netlist, &owner, xmr_op, &path),
                _ => unreachable!("only transient XMR kinds are collected above"),
            };
            match resolved {
                true => changed = true,
                false => ctx.sink.emit(errors::unresolved_xmr(owner.as_str(), Span::DUMMY)),
            }
        }

        PassResult { changed, failed: false }
    }
}

/// Walks `path`'s leading segments as a chain of instance names inside
/// `owner`, returning the final graph symbol to resolve the last segment
/// against. Only single-hop (`instance.signal`) paths are resolved; deeper
/// chains and same-graph (no-dot) references are handled by the callers.
fn descend_one_hop(netlist: &Netlist, owner: &ModuleSymbol, instance_name: &str) -> Option<ModuleSymbol> {
    let graph = netlist.get(owner)?;
    graph
        .operations_in_order()
        .filter(|(_, op)| op.kind() == OperationKind::Instance)
        .find_map(|(_, op)| {
            let this_name = op.attributes().get("instanceName")?.as_str()?;
            if this_name == instance_name {
                op.attributes().get("moduleName")?.as_str().map(ModuleSymbol::new)
            } else {
                None
            }
        })
}

fn resolve_read(netlist: &mut Netlist, owner: &ModuleSymbol, xmr_op: OperationId, path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();

    if segments.len() == 1 {
        return resolve_same_graph_read(netlist, owner, xmr_op, segments[0]);
    }
    if segments.len() != 2 {
        return false;
    }
    let (instance_name, signal_name) = (segments[0], segments[1]);
    let Some(target) = descend_one_hop(netlist, owner, instance_name) else {
        return false;
    };

    let Some(target_value) = find_or_promote_output(netlist, &target, signal_name) else {
        return false;
    };
    let (width, is_signed) = {
        let Some(g) = netlist.get(&target) else { return false };
        let Some(v) = g.value(target_value) else { return false };
        (v.width(), v.is_signed())
    };

    let Some(owner_graph) = netlist.get_mut(owner) else { return false };
    let Some(instance_op) = owner_graph
        .operations_in_order()
        .find(|(_, op)| {
            op.kind() == OperationKind::Instance
                && op.attributes().get("instanceName").and_then(|v| v.as_str()) == Some(instance_name)
        })
        .map(|(id, _)| id)
    else {
        return false;
    };

    let bridge_sym = grh_pass_fresh_symbol(owner_graph, "xmr_bridge");
    let Ok(bridge_value) = owner_graph.create_value(bridge_sym, width, is_signed, ValueType::Logic) else {
        return false;
    };
    if owner_graph.add_result(instance_op, bridge_value).is_err() {
        return false;
    }
    append_str_attr(owner_graph, instance_op, "outputPortName", signal_name);

    let xmr_result = owner_graph.operation(xmr_op).and_then(|op| op.results().first().copied());
    if let Some(xmr_result) = xmr_result {
        rewire_users(owner_graph, xmr_result, bridge_value);
    }
    owner_graph.erase_op(xmr_op);
    true
}

fn resolve_same_graph_read(
    netlist: &mut Netlist,
    owner: &ModuleSymbol,
    xmr_op: OperationId,
    signal_name: &str,
) -> bool {
    let Some(graph) = netlist.get_mut(owner) else { return false };
    let sym = graph.intern(signal_name);
    let Some(target_value) = graph.find_value_by_symbol(sym) else {
        return false;
    };
    let xmr_result = graph.operation(xmr_op).and_then(|op| op.results().first().copied());
    if let Some(xmr_result) = xmr_result {
        rewire_users(graph, xmr_result, target_value);
    }
    graph.erase_op(xmr_op);
    true
}

fn resolve_write(netlist: &mut Netlist, owner: &ModuleSymbol, xmr_op: OperationId, path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.len() != 2 {
        return false;
    }
    let (instance_name, signal_name) = (segments[0], segments[1]);
    let Some(target) = descend_one_hop(netlist, owner, instance_name) else {
        return false;
    };

    let driver = {
        let Some(owner_graph) = netlist.get(owner) else { return false };
        let Some(op) = owner_graph.operation(xmr_op) else { return false };
        op.operands().first().copied()
    };
    let Some(driver) = driver else { return false };

    let (width, is_signed) = {
        let Some(owner_graph) = netlist.get(owner) else { return false };
        let Some(v) = owner_graph.value(driver) else { return false };
        (v.width(), v.is_signed())
    };

    let Some(target_graph) = netlist.get_mut(&target) else { return false };
    let target_sym = target_graph.intern(signal_name);
    let bridge_value = match target_graph.find_value_by_symbol(target_sym) {
        Some(existing) => existing,
        None => match target_graph.create_value(target_sym, width, is_signed, ValueType::Logic) {
            Ok(v) => v,
            Err(_) => return false,
        },
    };
    if target_graph.input_ports().iter().all(|p| p.value != bridge_value) {
        let _ = target_graph.add_input_port(target_sym, bridge_value);
    }

    let Some(owner_graph) = netlist.get_mut(owner) else { return false };
    let Some(instance_op) = owner_graph
        .operations_in_order()
        .find(|(_, op)| {
            op.kind() == OperationKind::Instance
                && op.attributes().get("instanceName").and_then(|v| v.as_str()) == Some(instance_name)
        })
        .map(|(id, _)| id)
    else {
        return false;
    };
    if owner_graph.add_operand(instance_op, driver).is_err() {
        return false;
    }
    append_str_attr(owner_graph, instance_op, "inputPortName", signal_name);
    owner_graph.erase_op(xmr_op);
    true
}

fn find_or_promote_output(
    netlist: &mut Netlist,
    target: &ModuleSymbol,
    signal_name: &str,
) -> Option<grh_ir::ValueId> {
    let graph = netlist.get_mut(target)?;
    let sym = graph.intern(signal_name);
    let value = graph.find_value_by_symbol(sym)?;
    if graph.output_ports().iter().all(|p| p.value != value) {
        let _ = graph.add_output_port(sym, value);
    }
    Some(value)
}

fn rewire_users(graph: &mut grh_ir::Graph, from: grh_ir::ValueId, to: grh_ir::ValueId) {
    if from == to {
        return;
    }
    let users: Vec<_> = graph.value(from).map(|v| v.users().to_vec()).unwrap_or_default();
    for (op, index) in users {
        let _ = graph.replace_operand(op, index, to);
    }
}

fn grh_pass_fresh_symbol(graph: &mut grh_ir::Graph, prefix: &str) -> grh_ir::SymbolId {
    let mut n = 0u32;
    loop {
        let candidate = format!("{prefix}{n}");
        let sym = graph.intern(&candidate);
        if graph.find_value_by_symbol(sym).is_none() && graph.find_operation_by_symbol(sym).is_none() {
            return sym;
        }
        n += 1;
    }
}

fn append_str_attr(graph: &mut grh_ir::Graph, op: OperationId, key: &str, value: &str) {
    let Some(operation) = graph.operation_mut(op) else { return };
    let attrs = operation.attributes_mut();
    let mut list = attrs.get(key).and_then(|v| v.as_vec_str()).map(|s| s.to_vec()).unwrap_or_default();
    list.push(value.to_string());
    attrs.insert(key.to_string(), list.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use grh_ir::{Graph, OperationKind};

    #[test]
    fn same_graph_reference_resolves_directly() {
        let mut g = Graph::new();
        let sig_sym = g.intern("sig");
        let sig = g.create_value(sig_sym, 4, false, ValueType::Logic).unwrap();
        let xmr_op = g.create_operation(OperationKind::XMRRead, None).unwrap();
        let xmr_result_sym = g.intern("xmr0");
        let xmr_result = g.create_value(xmr_result_sym, 1, false, ValueType::Logic).unwrap();
        g.add_result(xmr_op, xmr_result).unwrap();
        g.operation_mut(xmr_op)
            .unwrap()
            .attributes_mut()
            .insert("path".to_string(), "sig".into());
        let consumer_sym = g.intern("consumer");
        let consumer_out = g.create_value(consumer_sym, 1, false, ValueType::Logic).unwrap();
        let consumer = g.create_operation(OperationKind::Not, None).unwrap();
        g.add_operand(consumer, xmr_result).unwrap();
        g.add_result(consumer, consumer_out).unwrap();

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = XmrResolve.run(&mut ctx);
        assert!(result.changed);
        assert!(!sink.has_errors());
        let graph = netlist.get(&ModuleSymbol::new("top")).unwrap();
        assert!(graph.operation(xmr_op).is_none());
        assert_eq!(graph.operation(consumer).unwrap().operands()[0], sig);
    }

    #[test]
    fn unresolvable_path_is_reported_as_error() {
        let mut g = Graph::new();
        let xmr_op = g.create_operation(OperationKind::XMRRead, None).unwrap();
        let result_sym = g.intern("xmr0");
        let result_val = g.create_value(result_sym, 1, false, ValueType::Logic).unwrap();
        g.add_result(xmr_op, result_val).unwrap();
        g.operation_mut(xmr_op)
            .unwrap()
            .attributes_mut()
            .insert("path".to_string(), "missing".into());

        let mut netlist = Netlist::new();
        netlist.insert(ModuleSymbol::new("top"), g);
        let sink = DiagnosticSink::new();
        let mut ctx = PassContext {
            netlist: &mut netlist,
            sink: &sink,
        };
        let result = XmrResolve.run(&mut ctx);
        assert!(!result.changed);
        assert!(sink.has_errors());
    }
}
