//! The attribute-schema JSON debug artifact (§6 "Attribute schema").

use grh_ir::{AttributeValue, Graph, Netlist};
use serde_json::{json, Value as Json};

fn attr_to_json(attr: &AttributeValue) -> Json {
    match attr {
        AttributeValue::Bool(b) => json!({"bool": b}),
        AttributeValue::Int(i) => json!({"i64": i}),
        AttributeValue::Str(s) => json!({"str": s}),
        AttributeValue::VecBool(v) => json!({"vec": v}),
        AttributeValue::VecInt(v) => json!({"vec": v}),
        AttributeValue::VecStr(v) => json!({"vec": v}),
    }
}

fn value_symbol_name(graph: &Graph, value: grh_ir::ValueId) -> String {
    graph
        .value(value)
        .map(|v| graph.resolve_symbol(v.symbol()).to_string())
        .unwrap_or_else(|| "<?>".to_string())
}

fn graph_to_json(graph: &Graph, symbol: &str, is_top: bool, aliases: &[String]) -> Json {
    let ins: Vec<String> = graph
        .input_ports()
        .iter()
        .map(|p| graph.resolve_symbol(p.name).to_string())
        .collect();
    let outs: Vec<String> = graph
        .output_ports()
        .iter()
        .map(|p| graph.resolve_symbol(p.name).to_string())
        .collect();
    let inouts: Vec<String> = graph
        .inout_ports()
        .iter()
        .map(|p| graph.resolve_symbol(p.name).to_string())
        .collect();

    let values: Vec<Json> = graph
        .values_in_order()
        .map(|(_, v)| {
            json!({
                "symbol": graph.resolve_symbol(v.symbol()),
                "width": v.width(),
                "isSigned": v.is_signed(),
            })
        })
        .collect();

    let operations: Vec<Json> = graph
        .operations_in_order()
        .map(|(_, op)| {
            let operands: Vec<String> = op.operands().iter().map(|&v| value_symbol_name(graph, v)).collect();
            let results: Vec<String> = op.results().iter().map(|&v| value_symbol_name(graph, v)).collect();
            let attributes: serde_json::Map<String, Json> = op
                .attributes()
                .iter()
                .map(|(k, v)| (k.clone(), attr_to_json(v)))
                .collect();
            json!({
                "kind": format!("{:?}", op.kind()),
                "symbol": op.symbol().map(|s| graph.resolve_symbol(s).to_string()),
                "operands": operands,
                "results": results,
                "attributes": attributes,
            })
        })
        .collect();

    json!({
        "symbol": symbol,
        "isTop": is_top,
        "aliases": aliases,
        "ports": {"in": ins, "out": outs, "inout": inouts},
        "values": values,
        "operations": operations,
    })
}

/// Renders the whole netlist's attribute schema as a pretty-printed JSON string.
pub fn render_json(netlist: &Netlist) -> String {
    let graphs: Vec<Json> = netlist
        .iter_in_emission_order()
        .map(|(symbol, graph)| {
            let is_top = netlist.top_graphs().contains(symbol);
            let aliases: Vec<String> = netlist
                .alias_for(symbol)
                .map(|a| vec![a.to_string()])
                .unwrap_or_default();
            graph_to_json(graph, symbol.as_str(), is_top, &aliases)
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "graphs": graphs })).unwrap_or_default()
}
